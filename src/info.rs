//! Metadata sidecar writer

use crate::content::Content;
use crate::temp;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while writing a sidecar
#[derive(Debug, Error)]
pub enum InfoError {
    /// Failed to create the sidecar directory
    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to inspect an existing sidecar
    #[error("Failed to inspect {path}: {source}")]
    StatFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize the record
    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to write the sidecar
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Writes `record` as indented JSON to `dir/file_name`
///
/// An existing non-empty file is left untouched, so hand-edited sidecars
/// survive repeated runs.
///
/// # Returns
///
/// `true` if the file was written, `false` if an existing one was kept
pub fn write_info(record: &Content, dir: &Path, file_name: &str) -> Result<bool, InfoError> {
    let path = dir.join(file_name);

    fs::create_dir_all(dir).map_err(|e| InfoError::DirectoryCreationFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    match fs::metadata(&path) {
        Ok(metadata) if metadata.len() > 0 => {
            debug!(path = %path.display(), "sidecar exists, keeping it");
            return Ok(false);
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(InfoError::StatFailed { path, source: e }),
    }

    let content = to_pretty_json(record)?;
    temp::write_atomic(&path, &content)
        .map_err(|e| InfoError::WriteFailed { path: path.clone(), source: e })?;

    info!(path = %path.display(), id = %record.id, "sidecar written");
    Ok(true)
}

/// Serializes with a single-space indent
fn to_pretty_json(record: &Content) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    record.serialize(&mut serializer)?;
    Ok(buffer)
}
