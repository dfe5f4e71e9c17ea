//! Staged file writes
//!
//! Files are first written next to their destination under a unique name and
//! then renamed into place, so a reader never observes a partially written
//! file. The staging file is removed automatically if it is never published.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Suffix of staging file names
const STAGING_SUFFIX: &str = ".part";

/// Guard for a staging file that is deleted on drop unless persisted
#[derive(Debug)]
pub(crate) struct StagedFile {
    /// Path of the staging file, `None` once persisted
    path: Option<PathBuf>,
}

impl StagedFile {
    /// Atomically moves the staging file over `destination`
    ///
    /// Any existing file at `destination` is replaced.
    pub(crate) fn persist(mut self, destination: &Path) -> io::Result<()> {
        if let Some(path) = self.path.take() {
            if let Err(e) = fs::rename(&path, destination) {
                // Give the guard its path back so drop cleans up
                self.path = Some(path);
                return Err(e);
            }
        }
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            // Silently ignore errors during cleanup
            let _ = fs::remove_file(path);
        }
    }
}

/// Creates a staging file next to `destination` holding `contents`
///
/// The staging file lives in the same directory as the destination so the
/// final rename never crosses a filesystem boundary. Its name is hidden and
/// made unique with a ULID.
pub(crate) fn stage(destination: &Path, contents: &[u8]) -> io::Result<StagedFile> {
    let dir = destination.parent().unwrap_or_else(|| Path::new("."));
    let name = destination
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("staged");

    let path = dir.join(format!(".{}.{}{}", name, ulid::Ulid::new(), STAGING_SUFFIX));
    let staged = StagedFile {
        path: Some(path.clone()),
    };

    let mut file = File::create(&path)?;
    file.write_all(contents)?;
    file.sync_all()?;

    Ok(staged)
}

/// Whether a file name looks like one produced by [`stage`]
fn is_staging_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(STAGING_SUFFIX) && name.len() > STAGING_SUFFIX.len() + 1
}

/// Removes staging files left in `dir` by an interrupted process
///
/// Only regular files with a staging name are touched. Returns how many were
/// removed.
pub(crate) fn sweep_staged(dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_staging = entry.file_name().to_str().is_some_and(is_staging_name);
        if is_staging && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Writes `contents` to `destination` through a staging file
pub(crate) fn write_atomic(destination: &Path, contents: &[u8]) -> io::Result<()> {
    stage(destination, contents)?.persist(destination)
}
