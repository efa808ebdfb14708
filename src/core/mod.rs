pub mod cache;
pub mod fetcher;
pub mod health;
pub mod pipeline;
pub mod ranking;

pub use crate::domain::model::{CharacterSummary, ResourceKind};
pub use crate::domain::ports::{CacheFailurePolicy, CacheStore, ConfigProvider, ExportSink, Storage};
pub use crate::utils::error::Result;
