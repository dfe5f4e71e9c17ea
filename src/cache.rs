//! Content-addressed blob cache
//!
//! Remote resources are fetched once and stored in a flat directory, one file
//! per URL, named by the URL's key (see [`crate::key`]). A non-empty file at
//! that path is the only record that a fetch succeeded; there is no index,
//! no expiry and no eviction.
//!
//! Entries are published by writing a staging file and renaming it into
//! place, so an entry is either absent or complete. Concurrent requests for
//! the same key within one process are serialized, so a missing entry is
//! fetched once no matter how many threads ask for it.

use crate::config::CacheConfig;
use crate::fetch::{FetchError, Fetcher};
use crate::key::hash;
use crate::temp;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to create or resolve a directory
    #[error("Failed to create cache directory at {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Fetching the remote resource failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Failed to read a cache entry
    #[error("Failed to read cache file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a cache entry or a copy of one
    #[error("Failed to write file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The URL has no cache entry yet
    #[error("No cache entry for {url}")]
    NotCached { url: String },

    /// The entry path exists but is not a regular file
    #[error("Cache entry {path} is not a file")]
    NotAFile { path: PathBuf },

    /// The operation needs the on-disk cache, which is switched off
    #[error("Cache is disabled")]
    Disabled,
}

/// A URL that could not be prefetched
#[derive(Debug)]
pub struct PrefetchFailure {
    pub url: String,
    pub error: CacheError,
}

/// Outcome of [`Cache::prefetch`]
#[derive(Debug, Default)]
pub struct PrefetchReport {
    /// URLs that were already cached
    pub cached: usize,
    /// URLs fetched during this call
    pub fetched: usize,
    /// URLs that failed
    pub failed: Vec<PrefetchFailure>,
}

impl PrefetchReport {
    /// Whether every URL ended up in the cache
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fetch-once cache of remote resources keyed by URL
pub struct Cache {
    /// Absolute cache root
    root: PathBuf,
    /// When false nothing is read from or written to `root`
    enabled: bool,
    fetcher: Box<dyn Fetcher>,
    /// Per-key locks for fetches in progress
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Cache {
    /// Opens a cache, creating its root directory if needed
    ///
    /// # Arguments
    ///
    /// * `config` - Cache settings; the root is resolved via [`CacheConfig::resolve_root`]
    /// * `fetcher` - Transport used on cache misses
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let fetcher = HttpFetcher::new(Duration::from_secs(30), None)?;
    /// let cache = Cache::open(&CacheConfig::with_root("tmp"), fetcher)?;
    /// ```
    pub fn open(config: &CacheConfig, fetcher: impl Fetcher + 'static) -> Result<Self, CacheError> {
        let root = config.resolve_root();

        fs::create_dir_all(&root).map_err(|e| CacheError::DirectoryCreationFailed {
            path: root.clone(),
            source: e,
        })?;
        let root = fs::canonicalize(&root).map_err(|e| CacheError::DirectoryCreationFailed {
            path: root.clone(),
            source: e,
        })?;

        match temp::sweep_staged(&root) {
            Ok(0) => {}
            Ok(removed) => info!(root = %root.display(), removed, "removed stale staging files"),
            Err(e) => warn!(root = %root.display(), error = %e, "could not sweep staging files"),
        }

        debug!(root = %root.display(), enabled = config.enabled, "cache opened");

        Ok(Self {
            root,
            enabled: config.enabled,
            fetcher: Box::new(fetcher),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether entries are stored on disk
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Cache key (entry file name) of a URL
    pub fn key(&self, url: &str) -> String {
        hash(url)
    }

    /// Path of the entry for a URL, whether or not it exists
    pub fn entry_path(&self, url: &str) -> PathBuf {
        self.root.join(self.key(url))
    }

    /// Whether a non-empty entry exists for a URL
    pub fn is_cached(&self, url: &str) -> bool {
        self.enabled && has_content(&self.entry_path(url))
    }

    /// Ensures the URL is cached, fetching it on a miss
    ///
    /// A hit returns immediately without network access. On a miss a single
    /// GET is issued; any status other than 200 or a transport failure is
    /// returned as [`CacheError::Fetch`] and nothing is written.
    ///
    /// # Returns
    ///
    /// The path of the cache entry
    pub fn get(&self, url: &str) -> Result<PathBuf, CacheError> {
        self.ensure(url).map(|(path, _)| path)
    }

    /// Returns the bytes for a URL, fetching and caching them on a miss
    ///
    /// With the cache disabled the bytes are fetched directly and not stored.
    pub fn read_bytes(&self, url: &str) -> Result<Vec<u8>, CacheError> {
        if !self.enabled {
            return self.fetch(url);
        }

        let path = self.get(url)?;
        fs::read(&path).map_err(|e| CacheError::ReadFailed { path, source: e })
    }

    /// Fetches a URL unconditionally, replacing any cached entry
    ///
    /// Used to pick up a remote resource that changed behind the same URL.
    pub fn force_get(&self, url: &str) -> Result<Vec<u8>, CacheError> {
        if !self.enabled {
            return self.fetch(url);
        }

        let key = self.key(url);
        let path = self.root.join(&key);
        self.with_key_lock(&key, || {
            let bytes = self.fetch(url)?;
            self.store(&path, &bytes)?;
            info!(url, key = %key, size = bytes.len(), "cache entry replaced");
            Ok(bytes)
        })
    }

    /// Opens the entry for a URL for reading, fetching it on a miss
    ///
    /// The returned handle is owned by the caller and closed on drop.
    pub fn reader(&self, url: &str) -> Result<File, CacheError> {
        let path = self.get(url)?;
        File::open(&path).map_err(|e| CacheError::ReadFailed { path, source: e })
    }

    /// Copies an existing entry to `destination` without network access
    ///
    /// Parent directories of `destination` are created. Returns the number of
    /// bytes written.
    pub fn copy_to(&self, url: &str, destination: &Path) -> Result<u64, CacheError> {
        if !self.enabled {
            return Err(CacheError::Disabled);
        }

        let entry = self.entry_path(url);
        let metadata = match fs::metadata(&entry) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::NotCached {
                    url: url.to_string(),
                });
            }
            Err(e) => return Err(CacheError::ReadFailed { path: entry, source: e }),
        };
        if metadata.is_dir() {
            return Err(CacheError::NotAFile { path: entry });
        }
        if metadata.len() == 0 {
            return Err(CacheError::NotCached {
                url: url.to_string(),
            });
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| CacheError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let bytes = fs::read(&entry).map_err(|e| CacheError::ReadFailed {
            path: entry.clone(),
            source: e,
        })?;
        self.store(destination, &bytes)?;

        Ok(bytes.len() as u64)
    }

    /// Warms the cache for a set of URLs using up to `workers` threads
    ///
    /// Empty and duplicate URLs are dropped before scheduling. Failures are
    /// logged and collected; they never stop the remaining URLs.
    pub fn prefetch<'a, I>(&self, urls: I, workers: usize) -> PrefetchReport
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut report = PrefetchReport::default();
        if !self.enabled {
            return report;
        }

        let mut seen = HashSet::new();
        let queue: Vec<&str> = urls
            .into_iter()
            .filter(|url| !url.is_empty() && seen.insert(*url))
            .collect();
        if queue.is_empty() {
            return report;
        }

        let next = AtomicUsize::new(0);
        let worker_count = workers.clamp(1, queue.len());
        let (queue, next) = (&queue, &next);

        let outcomes: Vec<(&str, Result<bool, CacheError>)> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..worker_count)
                .map(|_| {
                    scope.spawn(move || {
                        let mut outcomes = Vec::new();
                        loop {
                            let index = next.fetch_add(1, Ordering::Relaxed);
                            let Some(url) = queue.get(index) else {
                                break;
                            };
                            outcomes.push((*url, self.ensure(url).map(|(_, fetched)| fetched)));
                        }
                        outcomes
                    })
                })
                .collect();

            handles
                .into_iter()
                .filter_map(|handle| match handle.join() {
                    Ok(outcomes) => Some(outcomes),
                    Err(_) => {
                        warn!("prefetch worker panicked");
                        None
                    }
                })
                .flatten()
                .collect()
        });

        for (url, outcome) in outcomes {
            match outcome {
                Ok(true) => report.fetched += 1,
                Ok(false) => report.cached += 1,
                Err(error) => {
                    warn!(url, error = %error, "prefetch failed");
                    report.failed.push(PrefetchFailure {
                        url: url.to_string(),
                        error,
                    });
                }
            }
        }

        report
    }

    /// Ensures an entry exists; the flag tells whether it was fetched now
    fn ensure(&self, url: &str) -> Result<(PathBuf, bool), CacheError> {
        if !self.enabled {
            return Err(CacheError::Disabled);
        }

        let key = self.key(url);
        let path = self.root.join(&key);
        if has_content(&path) {
            debug!(url, key = %key, "cache hit");
            return Ok((path, false));
        }

        let fetched = self.with_key_lock(&key, || {
            // Another thread may have filled the entry while we waited
            if has_content(&path) {
                debug!(url, key = %key, "cache filled concurrently");
                return Ok(false);
            }
            let bytes = self.fetch(url)?;
            self.store(&path, &bytes)?;
            info!(url, key = %key, size = bytes.len(), "cache entry stored");
            Ok(true)
        })?;

        Ok((path, fetched))
    }

    /// Performs a single GET and reads the full body
    fn fetch(&self, url: &str) -> Result<Vec<u8>, CacheError> {
        debug!(url, "fetching");
        let mut response = self.fetcher.get(url)?;

        if response.status != 200 {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status,
            }
            .into());
        }

        let mut bytes = Vec::new();
        response
            .body
            .read_to_end(&mut bytes)
            .map_err(|e| FetchError::Body {
                url: url.to_string(),
                source: e,
            })?;

        Ok(bytes)
    }

    /// Publishes bytes at `path` through a staging file
    fn store(&self, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
        temp::write_atomic(path, bytes).map_err(|e| CacheError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Runs `f` while holding the lock for `key`
    fn with_key_lock<T>(
        &self,
        key: &str,
        f: impl FnOnce() -> Result<T, CacheError>,
    ) -> Result<T, CacheError> {
        let lock = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(in_flight.entry(key.to_string()).or_default())
        };

        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map and this call still hold the lock
        if Arc::strong_count(&lock) == 2 {
            in_flight.remove(key);
        }
        // Release our handle before the map so the next waiter sees an exact count
        drop(lock);
        drop(in_flight);

        result
    }
}

/// Whether `path` is a regular file with at least one byte
fn has_content(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}
