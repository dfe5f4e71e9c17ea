//! Content-address keys for cached resources
//!
//! Every cached resource is stored under a key derived from the exact URL
//! string it was fetched from. Two byte-identical URLs share one entry; two
//! different URLs never do, even if the server returns identical bytes.

/// Length of a key in hex characters
pub const KEY_LEN: usize = 64;

/// Computes the cache key for a URL
///
/// The key is the lower-case hex encoding of the BLAKE3 digest of the URL's
/// UTF-8 bytes. It is stable across calls and across processes.
///
/// # Examples
///
/// ```
/// let key = media_cache::hash("http://example.com/poster.jpg");
/// assert_eq!(key.len(), media_cache::KEY_LEN);
/// ```
pub fn hash(url: &str) -> String {
    blake3::hash(url.as_bytes()).to_hex().to_string()
}
