use crate::core::cache::ReadThroughCache;
use crate::core::fetcher::ResourceFetcher;
use crate::core::ranking::{count_appearances, select_top, Appearance};
use crate::domain::model::{Character, CharacterSummary, FilmCollection, ResourceKind, Species};
use crate::domain::ports::{ConfigProvider, ExportSink};
use crate::utils::error::{RankError, Result};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

/// Cache key of the ranked, height-sorted result.
pub const FINAL_RESULT_KEY: &str = "top_characters_cache";

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_MAX_CONCURRENT_WORKERS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub top_n: usize,
    pub max_concurrent_workers: usize,
}

impl PipelineSettings {
    pub fn from_config(config: &dyn ConfigProvider) -> Self {
        Self {
            top_n: config.top_n(),
            max_concurrent_workers: config.max_concurrent_workers(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            max_concurrent_workers: DEFAULT_MAX_CONCURRENT_WORKERS,
        }
    }
}

/// Fetches the film list, ranks characters by appearances, joins character and
/// species data and sorts the result by height.
///
/// Each fan-out stage runs its fetches as spawned tasks, at most
/// `max_concurrent_workers` at a time. The first failure aborts the run;
/// siblings still in flight are detached and their results ignored.
pub struct AggregationPipeline {
    fetcher: Arc<ResourceFetcher>,
    cache: ReadThroughCache,
    sink: Arc<dyn ExportSink>,
    settings: PipelineSettings,
}

impl AggregationPipeline {
    pub fn new(
        fetcher: Arc<ResourceFetcher>,
        cache: ReadThroughCache,
        sink: Arc<dyn ExportSink>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            fetcher,
            cache,
            sink,
            settings,
        }
    }

    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }

    /// Ranks the top characters and hands them to the export sink.
    ///
    /// An export failure is reported as `ExportFailure`; the final result it
    /// follows stays cached.
    pub async fn compute_top_characters(&self, use_cache: bool) -> Result<Vec<CharacterSummary>> {
        let summaries = self.rank(use_cache).await?;

        let receipt = self.sink.export(&summaries).await?;
        tracing::info!(
            "📁 Exported {} rows to {} at {} (forwarded: {})",
            receipt.rows,
            receipt.path,
            receipt.exported_at.to_rfc3339(),
            receipt.forwarded
        );

        Ok(summaries)
    }

    /// Everything `compute_top_characters` does except the export.
    pub async fn rank(&self, use_cache: bool) -> Result<Vec<CharacterSummary>> {
        if use_cache {
            if let Some(bytes) = self.cache.read(FINAL_RESULT_KEY).await? {
                tracing::info!("Serving top characters from cache");
                return Ok(serde_json::from_slice(&bytes)?);
            }
        }
        tracing::info!("No cached result, fetching data from API");

        let films_data = self.fetcher.fetch_films(use_cache).await?;
        let films = FilmCollection::deserialize(&films_data)
            .map_err(|e| RankError::shape(ResourceKind::FilmList, e.to_string()))?;

        let tally = count_appearances(&films);
        tracing::debug!(
            "Counted {} distinct characters across {} films",
            tally.len(),
            films.films.len()
        );
        let top = select_top(tally, self.settings.top_n)?;

        let characters = self.fetch_characters(&top, use_cache).await?;
        let species_names = self.fetch_species(&characters, use_cache).await?;

        let mut summaries = join_summaries(&top, characters, species_names)?;
        // stable: equal heights keep the order of the join
        summaries.sort_by(|a, b| b.height.cmp(&a.height));

        if use_cache {
            self.cache
                .write(FINAL_RESULT_KEY, &serde_json::to_vec(&summaries)?)
                .await?;
            tracing::info!("Cache set with TTL: {:?}", self.cache.ttl());
        }

        Ok(summaries)
    }

    async fn fetch_characters(
        &self,
        top: &[Appearance],
        use_cache: bool,
    ) -> Result<Vec<Character>> {
        let jobs = top
            .iter()
            .map(|a| (a.character_ref.clone(), a.character_ref.clone()))
            .collect();
        let mut fetched = self.fan_out(ResourceKind::Character, jobs, use_cache).await?;

        top.iter()
            .map(|a| {
                let data = fetched.remove(&a.character_ref).ok_or_else(|| {
                    RankError::upstream(ResourceKind::Character, format!("no data for {}", a.character_ref))
                })?;
                Character::deserialize(&data).map_err(|e| {
                    RankError::shape(ResourceKind::Character, format!("{}: {}", a.character_ref, e))
                })
            })
            .collect()
    }

    /// One fetch per (character, species reference) pair; repeated species
    /// across characters are only deduplicated through the cache.
    async fn fetch_species(
        &self,
        characters: &[Character],
        use_cache: bool,
    ) -> Result<HashMap<(usize, usize), String>> {
        let jobs: Vec<((usize, usize), String)> = characters
            .iter()
            .enumerate()
            .flat_map(|(ci, character)| {
                character
                    .species_refs
                    .iter()
                    .enumerate()
                    .map(move |(si, species_ref)| ((ci, si), species_ref.clone()))
            })
            .collect();

        let fetched = self.fan_out(ResourceKind::Species, jobs, use_cache).await?;

        fetched
            .into_iter()
            .map(|(slot, data)| {
                let species = Species::deserialize(&data)
                    .map_err(|e| RankError::shape(ResourceKind::Species, e.to_string()))?;
                Ok((slot, species.name))
            })
            .collect()
    }

    async fn fan_out<K>(
        &self,
        kind: ResourceKind,
        jobs: Vec<(K, String)>,
        use_cache: bool,
    ) -> Result<HashMap<K, Value>>
    where
        K: Eq + Hash + Send + 'static,
    {
        let total = jobs.len();
        let mut results = HashMap::with_capacity(total);

        let mut handles = stream::iter(jobs.into_iter().map(|(key, locator)| {
            let fetcher = Arc::clone(&self.fetcher);
            tokio::spawn(async move {
                let data = fetcher.fetch(kind, &locator, use_cache).await;
                (key, locator, data)
            })
        }))
        .buffer_unordered(self.settings.max_concurrent_workers.max(1));

        while let Some(joined) = handles.next().await {
            let (key, locator, data) = joined.map_err(|e| RankError::TaskFailed {
                message: e.to_string(),
            })?;

            match data {
                Ok(value) => {
                    results.insert(key, value);
                }
                Err(e) => {
                    tracing::error!("Fetching {} {} raised an error: {}", kind, locator, e);
                    return Err(e);
                }
            }
        }

        tracing::debug!("Fetched {} {} resources", total, kind);
        Ok(results)
    }
}

/// Builds one summary per character in ranking order.
fn join_summaries(
    top: &[Appearance],
    characters: Vec<Character>,
    mut species_names: HashMap<(usize, usize), String>,
) -> Result<Vec<CharacterSummary>> {
    characters
        .into_iter()
        .zip(top)
        .enumerate()
        .map(|(ci, (character, appearance))| {
            let names = (0..character.species_refs.len())
                .map(|si| {
                    species_names.remove(&(ci, si)).ok_or_else(|| {
                        RankError::upstream(
                            ResourceKind::Species,
                            format!("no data for {}", character.species_refs[si]),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let appearances = character.film_refs.iter().collect::<HashSet<_>>().len();
            if appearances != appearance.count {
                tracing::debug!(
                    "{} lists {} films but appears in {}",
                    appearance.character_ref,
                    appearances,
                    appearance.count
                );
            }

            Ok(CharacterSummary {
                name: character.name,
                species: names.join(" & "),
                height: character.height_cm,
                appearances,
            })
        })
        .collect()
}
