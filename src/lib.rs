//! media-cache - Fetch-once cache and materializer for remote media artwork
//!
//! This library stores remote resources (posters, thumbs, actor portraits,
//! sample images) in a content-addressed local cache and copies them into an
//! output layout next to a JSON sidecar describing the media record.
//!
//! ```no_run
//! use media_cache::{Cache, CacheConfig, Content, HttpFetcher, OutputOptions, materialize};
//! use std::time::Duration;
//!
//! let fetcher = HttpFetcher::new(Duration::from_secs(30), None)?;
//! let cache = Cache::open(&CacheConfig::with_root("tmp"), fetcher)?;
//!
//! let record = Content {
//!     id: "ABC-123".to_string(),
//!     poster: "https://example.com/p.jpg".to_string(),
//!     ..Content::default()
//! };
//! let produced = materialize(&cache, &record, &OutputOptions::new("out"))?;
//! println!("wrote {} file(s)", produced.written.len());
//! # Ok::<(), media_cache::Error>(())
//! ```

mod cache;
mod config;
mod content;
mod fetch;
mod file_operations;
mod info;
mod key;
mod materialize;
mod options;
mod temp;

#[cfg(test)]
mod testing;

// Re-export error types
pub use cache::CacheError;
pub use config::ConfigError;
pub use fetch::FetchError;
pub use info::InfoError;
pub use materialize::{CopyError, FieldError, MaterializeError};

pub use cache::{Cache, PrefetchFailure, PrefetchReport};
pub use config::{CacheConfig, Config, FALLBACK_CACHE_PATH};
pub use content::{Content, Genre, Sample, Star};
pub use fetch::{DEFAULT_USER_AGENT, FetchResponse, Fetcher, HttpFetcher};
pub use file_operations::{ext, sanitize_filename, trim_query};
pub use info::write_info;
pub use key::{KEY_LEN, hash};
pub use materialize::{
    CopyOutcome, Field, Materialized, copy_one, item_root, materialize, materialize_by_id,
    prefetch_record,
};
pub use options::{ID_PLACEHOLDER, OutputOptions};

use thiserror::Error;

/// Top-level error type for media-cache operations
#[derive(Debug, Error)]
pub enum Error {
    /// Error loading configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error fetching a remote resource
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error during cache operations
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Error writing a sidecar
    #[error("Info error: {0}")]
    Info(#[from] InfoError),

    /// One or more artifacts failed to materialize
    #[error("Materialization error: {0}")]
    Materialize(#[from] MaterializeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record file could not be parsed
    #[error("Invalid record: {0}")]
    Record(#[from] serde_json::Error),
}
