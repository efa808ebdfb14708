pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use adapters::{CsvExportSink, MemoryCacheStore};
pub use core::pipeline::AggregationPipeline;
pub use domain::model::CharacterSummary;
pub use utils::error::{RankError, Result};
