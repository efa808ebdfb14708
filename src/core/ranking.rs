use crate::domain::model::FilmCollection;
use crate::utils::error::{RankError, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appearance {
    pub character_ref: String,
    pub count: usize,
}

/// Tallies every character reference across all films, in first-seen order.
///
/// A reference repeated within one film is counted once per occurrence.
pub fn count_appearances(films: &FilmCollection) -> Vec<Appearance> {
    let mut tally: Vec<Appearance> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for film in &films.films {
        for character_ref in &film.character_refs {
            match index.get(character_ref.as_str()) {
                Some(&i) => tally[i].count += 1,
                None => {
                    index.insert(character_ref.as_str(), tally.len());
                    tally.push(Appearance {
                        character_ref: character_ref.clone(),
                        count: 1,
                    });
                }
            }
        }
    }

    tally
}

/// Picks exactly `n` references by descending count; ties keep first-seen order.
pub fn select_top(mut tally: Vec<Appearance>, n: usize) -> Result<Vec<Appearance>> {
    if tally.len() < n {
        return Err(RankError::InsufficientData {
            expected: n,
            found: tally.len(),
        });
    }

    // sort_by is stable, so equal counts stay in insertion order
    tally.sort_by(|a, b| b.count.cmp(&a.count));
    tally.truncate(n);
    Ok(tally)
}
