//! Test doubles shared by the unit tests

use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::fetch::{FetchError, FetchResponse, Fetcher};
use std::collections::HashMap;
use std::io::{self, Read};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A canned reply for one URL
#[derive(Clone)]
struct Reply {
    status: u16,
    body: Vec<u8>,
    /// Fail the body read after `body` has been handed out
    reset: bool,
}

/// Body that yields its bytes and then fails like a dropped connection
struct ResetBody {
    data: io::Cursor<Vec<u8>>,
}

impl Read for ResetBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(io::Error::other("reset")),
            n => Ok(n),
        }
    }
}

/// In-memory stand-in for a remote server that counts requests per URL
#[derive(Default)]
pub(crate) struct StubFetcher {
    responses: Mutex<HashMap<String, Reply>>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a delay to every request, widening race windows
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Serves `body` with `status` for `url`
    pub(crate) fn serve(self, url: &str, status: u16, body: &[u8]) -> Self {
        self.set(url, status, body);
        self
    }

    /// Serves a 200 whose body breaks off after `prefix`
    pub(crate) fn serve_reset(self, url: &str, prefix: &[u8]) -> Self {
        self.insert(url, 200, prefix, true);
        self
    }

    /// Replaces what is served for `url`
    pub(crate) fn set(&self, url: &str, status: u16, body: &[u8]) {
        self.insert(url, status, body, false);
    }

    fn insert(&self, url: &str, status: u16, body: &[u8], reset: bool) {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            Reply {
                status,
                body: body.to_vec(),
                reset,
            },
        );
    }

    /// Number of requests issued for `url`
    pub(crate) fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    /// Number of requests issued in total
    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

impl Fetcher for StubFetcher {
    fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let reply = self.responses.lock().unwrap().get(url).cloned();
        match reply {
            Some(Reply {
                status,
                body,
                reset: true,
            }) => Ok(FetchResponse {
                status,
                body: Box::new(ResetBody {
                    data: io::Cursor::new(body),
                }),
            }),
            Some(Reply { status, body, .. }) => Ok(FetchResponse::from_bytes(status, body)),
            None => Err(FetchError::Transport {
                url: url.to_string(),
                source: "connection refused".into(),
            }),
        }
    }
}

/// Opens a cache in `root` backed by a shared stub
pub(crate) fn stub_cache(root: &Path, stub: &Arc<StubFetcher>) -> Cache {
    Cache::open(&CacheConfig::with_root(root), Arc::clone(stub)).unwrap()
}
