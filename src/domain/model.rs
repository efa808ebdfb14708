use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Upstream resource kinds served through the read-through cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    FilmList,
    Character,
    Species,
}

impl ResourceKind {
    /// Deterministic cache key for a resource; the film list is a singleton.
    pub fn cache_key(&self, locator: &str) -> String {
        match self {
            ResourceKind::FilmList => "films_data".to_string(),
            ResourceKind::Character => format!("character_data:{}", locator),
            ResourceKind::Species => format!("species_data:{}", locator),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::FilmList => write!(f, "films"),
            ResourceKind::Character => write!(f, "character"),
            ResourceKind::Species => write!(f, "species"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Film {
    #[serde(rename = "characters")]
    pub character_refs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilmCollection {
    #[serde(rename = "results")]
    pub films: Vec<Film>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "height", deserialize_with = "deserialize_height")]
    pub height_cm: i64,
    #[serde(rename = "films")]
    pub film_refs: Vec<String>,
    #[serde(rename = "species")]
    pub species_refs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    pub name: String,
}

/// One row of the ranked output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSummary {
    pub name: String,
    pub species: String,
    pub height: i64,
    pub appearances: usize,
}

/// Accepts `172` as well as `"172"`; anything else fails the shape check.
fn deserialize_height<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Height {
        Number(i64),
        Text(String),
    }

    match Height::deserialize(deserializer)? {
        Height::Number(n) => Ok(n),
        Height::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("height is not an integer: {:?}", s))),
    }
}
