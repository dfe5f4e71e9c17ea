//! Artifact materialization
//!
//! This module copies cached resources referenced by a [`Content`] record
//! into an output directory. Two layouts are supported:
//!
//! - [`materialize`] writes flat image buckets (`image/poster.jpg`,
//!   `image/sample@0.jpg`, ...) plus an optional metadata sidecar.
//! - [`materialize_by_id`] writes a per-item tree rooted at
//!   `<output>/<ID>/.<from>/`.
//!
//! Both share [`copy_one`], which never rewrites a destination that already
//! has content unless forced. Every field is attempted independently; the
//! failures are collected and returned together.

mod by_id;
mod flat;

pub use by_id::{item_root, materialize_by_id};
pub use flat::materialize;

use crate::cache::{Cache, CacheError, PrefetchReport};
use crate::content::Content;
use crate::info::InfoError;
use crate::temp;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while materializing a single artifact
#[derive(Debug, Error)]
pub enum CopyError {
    /// Fetching or reading the cached resource failed
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Writing the sidecar failed
    #[error(transparent)]
    Info(#[from] InfoError),

    /// Failed to create the destination directory
    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to inspect the destination
    #[error("Failed to inspect {path}: {source}")]
    StatFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write the destination
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The destination exists but is not a regular file
    #[error("Destination is not a file: {path}")]
    NotAFile { path: PathBuf },
}

impl CopyError {
    /// Whether the remote resource could not be fetched
    pub fn is_fetch(&self) -> bool {
        matches!(self, CopyError::Cache(CacheError::Fetch(_)))
    }
}

/// What [`copy_one`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The destination was (re)written
    Written,
    /// The destination already had content and was left alone
    Kept,
    /// The source URL was empty; nothing to do
    NoSource,
}

/// The record field an artifact came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Info,
    Poster,
    Thumb,
    /// Actor portrait, by actor name
    Actor(String),
    /// Full-size sample image, by index
    Sample(usize),
    /// Sample preview image, by index
    SampleThumb(usize),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Info => write!(f, "info"),
            Field::Poster => write!(f, "poster"),
            Field::Thumb => write!(f, "thumb"),
            Field::Actor(name) => write!(f, "actor {}", name),
            Field::Sample(index) => write!(f, "sample {}", index),
            Field::SampleThumb(index) => write!(f, "sample thumb {}", index),
        }
    }
}

/// A failed artifact
#[derive(Debug, Error)]
#[error("{field}: {error}")]
pub struct FieldError {
    pub field: Field,
    #[source]
    pub error: CopyError,
}

/// Files produced by a materialization run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Materialized {
    /// Destinations written during this run
    pub written: Vec<PathBuf>,
    /// Destinations that already had content
    pub kept: Vec<PathBuf>,
    /// Sample image destinations present after the run, in sample order
    pub sample_files: Vec<PathBuf>,
}

/// One or more artifacts failed to materialize
///
/// The artifacts that did succeed are still on disk and listed in `outcome`.
#[derive(Debug, Error)]
#[error("{} artifact(s) of {id} failed to materialize: {}", .failures.len(), summarize(.failures))]
pub struct MaterializeError {
    /// Record ID
    pub id: String,
    /// Failures in processing order
    pub failures: Vec<FieldError>,
    /// What was produced despite the failures
    pub outcome: Materialized,
}

impl MaterializeError {
    /// The earliest failure in processing order
    pub fn first(&self) -> Option<&FieldError> {
        self.failures.first()
    }

    /// Whether any failure was a fetch failure
    pub fn has_fetch_failure(&self) -> bool {
        self.failures.iter().any(|f| f.error.is_fetch())
    }
}

fn summarize(failures: &[FieldError]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Copies one cached resource to `destination`
///
/// An empty `source` is skipped silently. Without `force`, a destination that
/// already has content is kept and the cache is not consulted. Otherwise the
/// bytes come from [`Cache::force_get`] (forced) or [`Cache::read_bytes`] and
/// fully replace the destination.
pub fn copy_one(
    cache: &Cache,
    source: &str,
    destination: &Path,
    force: bool,
) -> Result<CopyOutcome, CopyError> {
    if source.is_empty() {
        return Ok(CopyOutcome::NoSource);
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| CopyError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    match fs::metadata(destination) {
        Ok(metadata) if !metadata.is_file() => {
            return Err(CopyError::NotAFile {
                path: destination.to_path_buf(),
            });
        }
        Ok(metadata) if !force && metadata.len() > 0 => {
            debug!(source, path = %destination.display(), "destination exists, keeping it");
            return Ok(CopyOutcome::Kept);
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(CopyError::StatFailed {
                path: destination.to_path_buf(),
                source: e,
            });
        }
    }

    let bytes = if force {
        cache.force_get(source)?
    } else {
        cache.read_bytes(source)?
    };

    temp::write_atomic(destination, &bytes).map_err(|e| CopyError::WriteFailed {
        path: destination.to_path_buf(),
        source: e,
    })?;

    info!(source, path = %destination.display(), size = bytes.len(), "copied");
    Ok(CopyOutcome::Written)
}

/// Warms the cache with every image a record references
///
/// Covers the poster, thumb, actor portraits and, when `with_samples` is
/// set, every sample image and preview.
pub fn prefetch_record(
    cache: &Cache,
    record: &Content,
    with_samples: bool,
    workers: usize,
) -> PrefetchReport {
    cache.prefetch(record.image_urls(with_samples), workers)
}

/// Accumulates per-field outcomes for one run
#[derive(Default)]
struct Collector {
    outcome: Materialized,
    failures: Vec<FieldError>,
}

impl Collector {
    /// Records an outcome; returns whether the destination holds content
    fn record(
        &mut self,
        field: Field,
        destination: PathBuf,
        result: Result<CopyOutcome, CopyError>,
    ) -> bool {
        match result {
            Ok(CopyOutcome::Written) => {
                self.outcome.written.push(destination);
                true
            }
            Ok(CopyOutcome::Kept) => {
                self.outcome.kept.push(destination);
                true
            }
            Ok(CopyOutcome::NoSource) => false,
            Err(error) => {
                warn!(field = %field, path = %destination.display(), error = %error, "materialization failed");
                self.failures.push(FieldError { field, error });
                false
            }
        }
    }

    fn finish(self, id: &str) -> Result<Materialized, MaterializeError> {
        if self.failures.is_empty() {
            Ok(self.outcome)
        } else {
            Err(MaterializeError {
                id: id.to_string(),
                failures: self.failures,
                outcome: self.outcome,
            })
        }
    }
}
