//! HTTP fetch capability
//!
//! The cache never talks to the network directly. It is handed a [`Fetcher`]
//! at construction time, which keeps transport configuration (timeouts, user
//! agents, proxies) out of the cache and lets tests substitute a stub.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching a remote resource
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the connection failed
    #[error("Failed to fetch {url}: {source}")]
    Transport {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The server answered with something other than 200 OK
    #[error("HTTP {status} while fetching {url}")]
    Status { url: String, status: u16 },

    /// The response body could not be read to the end
    #[error("Failed to read response body from {url}: {source}")]
    Body { url: String, source: std::io::Error },

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// A response as seen by the cache: a status code and a body stream
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Box<dyn Read + Send>,
}

impl FetchResponse {
    /// Creates a response from a status code and an in-memory body
    pub fn from_bytes(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: Box::new(std::io::Cursor::new(body.into())),
        }
    }
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Trait for anything that can perform a single HTTP GET
///
/// Implementations must not retry; a failed attempt is reported as-is and
/// the caller decides what to do with it.
pub trait Fetcher: Send + Sync {
    /// Performs a GET request for the given URL
    ///
    /// A non-200 status is not an error at this level; it is returned in the
    /// response and interpreted by the cache.
    fn get(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        (**self).get(url)
    }
}

/// Default user agent sent by [`HttpFetcher`]
pub const DEFAULT_USER_AGENT: &str = concat!("media-cache/", env!("CARGO_PKG_VERSION"));

/// [`Fetcher`] backed by a blocking reqwest client
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the given request timeout and user agent
    pub fn new(timeout: Duration, user_agent: Option<&str>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .build()?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        Ok(FetchResponse {
            status: response.status().as_u16(),
            body: Box::new(response),
        })
    }
}
