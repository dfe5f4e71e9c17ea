//! Configuration
//!
//! Cache behavior and output layout are carried in explicit structs that are
//! threaded through constructors. Both can be loaded from a JSON file; any
//! field missing from the file keeps its default.

use crate::options::OutputOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Cache root used when no platform cache directory can be determined
pub const FALLBACK_CACHE_PATH: &str = "tmp";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the configuration file
    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Settings for the content-addressed cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory; `None` selects the platform cache directory
    pub root: Option<PathBuf>,
    /// When false, bytes are fetched straight from the network and never stored
    pub enabled: bool,
    /// Request timeout in seconds for the default HTTP fetcher
    pub timeout_secs: u64,
    /// User agent for the default HTTP fetcher
    pub user_agent: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            enabled: true,
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

impl CacheConfig {
    /// Creates a config rooted at the given directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Resolves the cache root directory
    ///
    /// Returns the configured root, or the platform-specific cache directory:
    /// - Linux: ~/.cache/media-cache/blobs/
    /// - macOS: ~/Library/Caches/media-cache/blobs/
    /// - Windows: %LOCALAPPDATA%\media-cache\cache\blobs\
    ///
    /// falling back to `./tmp` when neither is available.
    pub fn resolve_root(&self) -> PathBuf {
        if let Some(root) = &self.root {
            return root.clone();
        }

        directories::ProjectDirs::from("", "", "media-cache")
            .map(|dirs| dirs.cache_dir().join("blobs"))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_PATH))
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Complete configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache settings
    pub cache: CacheConfig,
    /// Output layout
    pub output: OutputOptions,
}

impl Config {
    /// Loads configuration from a JSON file
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let config = Config::load(Path::new("media-cache.json"))?;
    /// ```
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.root.is_none());
    }

    #[test]
    fn test_resolve_root_prefers_configured() {
        let config = CacheConfig::with_root("/var/cache/media");
        assert_eq!(config.resolve_root(), PathBuf::from("/var/cache/media"));
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "cache": { "enabled": false }, "output": { "OutputPath": "/srv/media", "CopySample": true } }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert!(!config.cache.enabled);
        assert_eq!(config.cache.timeout_secs, 30);
        assert_eq!(config.output.output_path, PathBuf::from("/srv/media"));
        assert!(config.output.copy_sample);
        assert!(config.output.copy_poster);
        assert_eq!(config.output.image_path, PathBuf::from("image"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFailed { .. }));
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }
}
