// Adapters layer: concrete implementations of the domain ports (cache stores, export sink).

pub mod csv_export;
pub mod memory_cache;
#[cfg(feature = "redis")]
pub mod redis_cache;

pub use csv_export::CsvExportSink;
pub use memory_cache::MemoryCacheStore;
#[cfg(feature = "redis")]
pub use redis_cache::RedisCacheStore;
