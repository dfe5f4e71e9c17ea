//! Output layout options
//!
//! [`OutputOptions`] is read-only input to materialization. Destination names
//! and directories are derived into fresh values on every call, so the same
//! options can be reused across records without drifting.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Info name placeholder meaning "use the record ID"
pub const ID_PLACEHOLDER: &str = "@";

/// Which artifacts to materialize and where to put them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct OutputOptions {
    /// Free-form label for this output profile
    pub name: String,
    /// Suppress all materialization
    pub skip: bool,
    /// Re-fetch and overwrite even when destinations already have content
    pub force: bool,
    /// Base directory for everything written
    pub output_path: PathBuf,
    /// Write the metadata sidecar
    pub copy_info: bool,
    /// Sidecar directory below `output_path`
    pub info_path: PathBuf,
    /// Sidecar file stem; empty or `@` uses the record ID
    pub info_name: String,
    /// Sidecar extension, including the dot
    pub info_ext: String,
    /// Copy the poster image
    pub copy_poster: bool,
    /// Poster directory below `output_path`; empty uses `image_path`
    pub poster_path: PathBuf,
    /// Poster file stem
    pub poster_name: String,
    /// Copy the thumb image
    pub copy_thumb: bool,
    /// Thumb directory below `output_path`; empty uses `image_path`
    pub thumb_path: PathBuf,
    /// Thumb file stem
    pub thumb_name: String,
    /// Copy sample images
    pub copy_sample: bool,
    /// Sample directory below `output_path`; empty uses `image_path`
    pub sample_path: PathBuf,
    /// Sample file stem, suffixed with `@<index>`
    pub sample_name: String,
    /// Default image directory below `output_path`
    pub image_path: PathBuf,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            skip: false,
            force: false,
            output_path: PathBuf::new(),
            copy_info: false,
            info_path: PathBuf::new(),
            info_name: String::new(),
            info_ext: ".nfo".to_string(),
            copy_poster: true,
            poster_path: PathBuf::new(),
            poster_name: "poster".to_string(),
            copy_thumb: true,
            thumb_path: PathBuf::new(),
            thumb_name: "thumb".to_string(),
            copy_sample: false,
            sample_path: PathBuf::new(),
            sample_name: "sample".to_string(),
            image_path: PathBuf::from("image"),
        }
    }
}

impl OutputOptions {
    /// Creates default options writing below `output_path`
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            ..Self::default()
        }
    }

    /// Directory for an artifact: its own path, or `image_path` when empty
    fn image_dir(&self, specific: &Path) -> PathBuf {
        if specific.as_os_str().is_empty() {
            self.output_path.join(&self.image_path)
        } else {
            self.output_path.join(specific)
        }
    }

    /// Directory the sidecar is written to
    pub fn info_dir(&self) -> PathBuf {
        self.output_path.join(&self.info_path)
    }

    /// Sidecar file name for a record ID
    pub fn info_file_name(&self, id: &str) -> String {
        let stem = if self.info_name.is_empty() || self.info_name == ID_PLACEHOLDER {
            id
        } else {
            self.info_name.as_str()
        };
        format!("{}{}", stem, self.info_ext)
    }

    /// Poster destination for a file extension (including the dot)
    pub fn poster_dest(&self, ext: &str) -> PathBuf {
        self.image_dir(&self.poster_path)
            .join(format!("{}{}", self.poster_name, ext))
    }

    /// Thumb destination for a file extension (including the dot)
    pub fn thumb_dest(&self, ext: &str) -> PathBuf {
        self.image_dir(&self.thumb_path)
            .join(format!("{}{}", self.thumb_name, ext))
    }

    /// Sample destination for a position and file extension
    pub fn sample_dest(&self, index: usize, ext: &str) -> PathBuf {
        self.image_dir(&self.sample_path)
            .join(format!("{}@{}{}", self.sample_name, index, ext))
    }
}
