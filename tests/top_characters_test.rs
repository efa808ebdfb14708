use httpmock::prelude::*;
use httpmock::Mock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use swapi_rank::app::build_pipeline;
use swapi_rank::core::pipeline::FINAL_RESULT_KEY;
use swapi_rank::domain::model::ResourceKind;
use swapi_rank::utils::validation::Validate;
use swapi_rank::{AggregationPipeline, CharacterSummary, MemoryCacheStore, RankError, TomlConfig};
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

struct Person {
    id: u32,
    name: &'static str,
    height: &'static str,
    species: &'static [&'static str],
    films: &'static [u32],
}

// Ids follow the upstream numbering; films list characters in id order.
const PEOPLE: &[Person] = &[
    Person { id: 1, name: "Luke Skywalker", height: "172", species: &["human"], films: &[1, 2, 3, 6] },
    Person { id: 2, name: "C-3PO", height: "167", species: &["droid"], films: &[1, 2, 3, 4, 5, 6] },
    Person { id: 3, name: "R2-D2", height: "96", species: &["droid"], films: &[1, 2, 3, 4, 5, 6] },
    Person { id: 4, name: "Darth Vader", height: "202", species: &[], films: &[1, 2, 3, 6] },
    Person { id: 5, name: "Leia Organa", height: "150", species: &["human"], films: &[1, 2, 3, 6] },
    Person { id: 10, name: "Obi-Wan Kenobi", height: "182", species: &["human"], films: &[1, 2, 3, 4, 5, 6] },
    Person { id: 13, name: "Chewbacca", height: "228", species: &["wookie"], films: &[1, 2, 3, 6] },
    Person { id: 14, name: "Han Solo", height: "180", species: &["human"], films: &[1, 2, 3] },
    Person { id: 16, name: "Jabba Desilijic Tiure", height: "175", species: &["hutt"], films: &[1, 4] },
    Person { id: 20, name: "Yoda", height: "66", species: &["yoda"], films: &[2, 3, 4, 5, 6] },
    Person { id: 21, name: "Palpatine", height: "170", species: &["human"], films: &[2, 3, 4, 5, 6] },
    Person { id: 35, name: "Padmé Amidala", height: "185", species: &["human"], films: &[4, 5, 6] },
];

const SPECIES: &[(&str, &str)] = &[
    ("human", "Human"),
    ("droid", "Droid"),
    ("wookie", "Wookie"),
    ("yoda", "Yoda's species"),
    ("hutt", "Hutt"),
];

struct FixtureOptions {
    failing_person: Option<u32>,
    failing_species: Option<&'static str>,
    malformed_species: Option<&'static str>,
    upload_status: u16,
    staggered: bool,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            failing_person: None,
            failing_species: None,
            malformed_species: None,
            upload_status: 200,
            staggered: false,
        }
    }
}

struct Fixture<'a> {
    films: Mock<'a>,
    people: HashMap<u32, Mock<'a>>,
    species: HashMap<&'static str, Mock<'a>>,
    upload: Mock<'a>,
}

impl Fixture<'_> {
    fn upstream_hits(&self) -> usize {
        self.films.hits()
            + self.people.values().map(|m| m.hits()).sum::<usize>()
            + self.species.values().map(|m| m.hits()).sum::<usize>()
    }
}

fn mount(server: &MockServer, options: FixtureOptions) -> Fixture<'_> {
    let films: Vec<serde_json::Value> = (1..=6u32)
        .map(|film| {
            let characters: Vec<String> = PEOPLE
                .iter()
                .filter(|p| p.films.contains(&film))
                .map(|p| server.url(format!("/people/{}/", p.id)))
                .collect();
            serde_json::json!({
                "title": format!("Episode {}", film),
                "characters": characters,
            })
        })
        .collect();

    let films_mock = server.mock(|when, then| {
        when.method(GET).path("/films");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({ "count": 6, "results": films }));
    });

    let mut people = HashMap::new();
    for person in PEOPLE {
        let species: Vec<String> = person
            .species
            .iter()
            .map(|s| server.url(format!("/species/{}/", s)))
            .collect();
        let film_urls: Vec<String> = person
            .films
            .iter()
            .map(|f| server.url(format!("/films/{}/", f)))
            .collect();
        let failing = options.failing_person == Some(person.id);
        let delay = if options.staggered {
            // later-ranked characters answer first
            Duration::from_millis(u64::from(40 - person.id.min(40)))
        } else {
            Duration::ZERO
        };

        let mock = server.mock(|when, then| {
            when.method(GET).path(format!("/people/{}/", person.id));
            if failing {
                then.status(500);
            } else {
                then.status(200)
                    .delay(delay)
                    .json_body(serde_json::json!({
                        "name": person.name,
                        "height": person.height,
                        "films": film_urls,
                        "species": species,
                    }));
            }
        });
        people.insert(person.id, mock);
    }

    let mut species = HashMap::new();
    for (slug, name) in SPECIES {
        let mock = server.mock(|when, then| {
            when.method(GET).path(format!("/species/{}/", slug));
            if options.failing_species == Some(*slug) {
                then.status(503);
            } else if options.malformed_species == Some(*slug) {
                then.status(200)
                    .json_body(serde_json::json!({ "classification": "mammal" }));
            } else {
                then.status(200)
                    .json_body(serde_json::json!({ "name": name }));
            }
        });
        species.insert(*slug, mock);
    }

    let upload = server.mock(|when, then| {
        when.method(POST)
            .path("/post")
            .body_contains("name,species,height,appearances");
        then.status(options.upload_status);
    });

    Fixture {
        films: films_mock,
        people,
        species,
        upload,
    }
}

fn pipeline_for(
    server: &MockServer,
    output: &TempDir,
    store: &MemoryCacheStore,
    workers: usize,
) -> AggregationPipeline {
    let toml_content = format!(
        r#"
[upstream]
base_url = "{}"
timeout_seconds = 5

[cache]
ttl_seconds = 60
on_failure = "fail"

[pipeline]
top_n = 10
max_concurrent_workers = {}

[export]
output_path = "{}"
endpoint = "{}"
"#,
        server.base_url(),
        workers,
        output.path().to_str().unwrap().replace('\\', "/"),
        server.url("/post")
    );

    let config = TomlConfig::from_toml_str(&toml_content).unwrap();
    config.validate().unwrap();
    build_pipeline(&config, Arc::new(store.clone())).unwrap()
}

#[tokio::test]
async fn test_top_ten_without_cache() {
    let server = MockServer::start();
    let fixture = mount(&server, FixtureOptions::default());
    let output = TempDir::new().unwrap();
    let store = MemoryCacheStore::new();
    let pipeline = pipeline_for(&server, &output, &store, 5);

    let top = assert_ok!(pipeline.compute_top_characters(false).await);

    assert_eq!(top.len(), 10);
    assert_eq!(
        top[0],
        CharacterSummary {
            name: "Chewbacca".to_string(),
            species: "Wookie".to_string(),
            height: 228,
            appearances: 4,
        }
    );
    assert_eq!(
        top[9],
        CharacterSummary {
            name: "Yoda".to_string(),
            species: "Yoda's species".to_string(),
            height: 66,
            appearances: 5,
        }
    );
    assert!(top.windows(2).all(|w| w[0].height >= w[1].height));

    // Han and Padmé tie on three films; Han is seen first
    let names: Vec<&str> = top.iter().map(|s| s.name.as_str()).collect();
    assert!(names.contains(&"Han Solo"));
    assert!(!names.contains(&"Padmé Amidala"));
    assert_eq!(
        names,
        vec![
            "Chewbacca",
            "Darth Vader",
            "Obi-Wan Kenobi",
            "Han Solo",
            "Luke Skywalker",
            "Palpatine",
            "C-3PO",
            "Leia Organa",
            "R2-D2",
            "Yoda",
        ]
    );
    assert_eq!(top[1].species, "");

    // one species fetch per (character, reference) pair without the cache
    fixture.films.assert_hits(1);
    fixture.species["human"].assert_hits(5);
    fixture.species["droid"].assert_hits(2);
    fixture.species["hutt"].assert_hits(0);
    fixture.people[&35].assert_hits(0);
    fixture.upload.assert_hits(1);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_csv_export_format() {
    let server = MockServer::start();
    let _fixture = mount(&server, FixtureOptions::default());
    let output = TempDir::new().unwrap();
    let pipeline = pipeline_for(&server, &output, &MemoryCacheStore::new(), 5);

    let top = pipeline.compute_top_characters(false).await.unwrap();

    let csv_path = output.path().join("top_characters.csv");
    assert!(csv_path.exists());

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["name", "species", "height", "appearances"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 10);
    for (row, summary) in rows.iter().zip(&top) {
        assert_eq!(row.len(), 4);
        assert_eq!(&row[0], summary.name);
        assert_eq!(&row[1], summary.species);
        assert_eq!(row[2].parse::<i64>().unwrap(), summary.height);
        assert_eq!(row[3].parse::<usize>().unwrap(), summary.appearances);
    }
}

#[tokio::test]
async fn test_cached_run_is_identical_and_skips_upstream() {
    let server = MockServer::start();
    let fixture = mount(&server, FixtureOptions::default());
    let output = TempDir::new().unwrap();
    let store = MemoryCacheStore::new();
    let pipeline = pipeline_for(&server, &output, &store, 5);

    let first = assert_ok!(pipeline.compute_top_characters(true).await);
    let hits_after_first = fixture.upstream_hits();
    assert!(store.contains_key(FINAL_RESULT_KEY));
    assert!(store.contains_key("films_data"));

    let second = assert_ok!(pipeline.compute_top_characters(true).await);

    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
    assert_eq!(fixture.upstream_hits(), hits_after_first);
    fixture.films.assert_hits(1);
    // export runs on every call
    fixture.upload.assert_hits(2);
}

#[tokio::test]
async fn test_ranking_independent_of_completion_order() {
    let server = MockServer::start();
    let _fixture = mount(
        &server,
        FixtureOptions {
            staggered: true,
            ..FixtureOptions::default()
        },
    );
    let output = TempDir::new().unwrap();

    let serial = pipeline_for(&server, &output, &MemoryCacheStore::new(), 1)
        .rank(false)
        .await
        .unwrap();
    let parallel = pipeline_for(&server, &output, &MemoryCacheStore::new(), 10)
        .rank(false)
        .await
        .unwrap();

    assert_eq!(serial, parallel);
}

#[tokio::test]
async fn test_character_failure_aborts_without_caching() {
    let server = MockServer::start();
    let fixture = mount(
        &server,
        FixtureOptions {
            failing_person: Some(20),
            ..FixtureOptions::default()
        },
    );
    let output = TempDir::new().unwrap();
    let store = MemoryCacheStore::new();
    let pipeline = pipeline_for(&server, &output, &store, 5);

    let err = assert_err!(pipeline.compute_top_characters(true).await);

    assert!(matches!(
        err,
        RankError::UpstreamUnavailable {
            kind: ResourceKind::Character,
            ..
        }
    ));
    assert_eq!(err.status_code(), 503);
    assert!(!store.contains_key(FINAL_RESULT_KEY));
    fixture.upload.assert_hits(0);
    // species stage never starts
    assert_eq!(
        fixture.species.values().map(|m| m.hits()).sum::<usize>(),
        0
    );
}

#[tokio::test]
async fn test_species_failure_aborts_run() {
    let server = MockServer::start();
    let fixture = mount(
        &server,
        FixtureOptions {
            failing_species: Some("wookie"),
            ..FixtureOptions::default()
        },
    );
    let output = TempDir::new().unwrap();
    let store = MemoryCacheStore::new();
    let pipeline = pipeline_for(&server, &output, &store, 5);

    let err = pipeline.compute_top_characters(true).await.unwrap_err();

    assert!(matches!(
        err,
        RankError::UpstreamUnavailable {
            kind: ResourceKind::Species,
            ..
        }
    ));
    assert!(!store.contains_key(FINAL_RESULT_KEY));
    fixture.upload.assert_hits(0);
}

#[tokio::test]
async fn test_malformed_species_is_shape_error() {
    let server = MockServer::start();
    let _fixture = mount(
        &server,
        FixtureOptions {
            malformed_species: Some("droid"),
            ..FixtureOptions::default()
        },
    );
    let output = TempDir::new().unwrap();
    let store = MemoryCacheStore::new();
    let pipeline = pipeline_for(&server, &output, &store, 5);

    let err = pipeline.rank(true).await.unwrap_err();

    assert!(matches!(
        err,
        RankError::UpstreamShapeInvalid {
            kind: ResourceKind::Species,
            ..
        }
    ));
    assert_eq!(err.status_code(), 503);
    assert!(!store.contains_key(FINAL_RESULT_KEY));
}

#[tokio::test]
async fn test_export_failure_leaves_result_cached() {
    let server = MockServer::start();
    let fixture = mount(
        &server,
        FixtureOptions {
            upload_status: 500,
            ..FixtureOptions::default()
        },
    );
    let output = TempDir::new().unwrap();
    let store = MemoryCacheStore::new();
    let pipeline = pipeline_for(&server, &output, &store, 5);

    let err = pipeline.compute_top_characters(true).await.unwrap_err();

    assert!(matches!(err, RankError::ExportFailure { .. }));
    assert_eq!(err.status_code(), 503);
    assert!(store.contains_key(FINAL_RESULT_KEY));
    fixture.upload.assert_hits(1);

    // the cached result is served without touching the upstream again
    let hits = fixture.upstream_hits();
    let cached = pipeline.rank(true).await.unwrap();
    assert_eq!(cached.len(), 10);
    assert_eq!(fixture.upstream_hits(), hits);
}
