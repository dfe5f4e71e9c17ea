//! File naming helpers
//!
//! Destination names are derived from remote URLs and from record fields
//! that were never meant to be path components. These helpers turn both into
//! something safe to join onto an output directory.

/// Sanitizes a string for use in filenames by replacing problematic characters
///
/// Replaces characters that are invalid or problematic in filenames across platforms:
/// - Path separators: / \
/// - Reserved characters: : * ? " < > |
/// - Control characters
/// - Trim leading/trailing whitespace and dots
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();

    // Trim whitespace and dots from start/end
    sanitized.trim_matches(|c: char| c.is_whitespace() || c == '.').to_string()
}

/// Strips the query string from a URL
pub fn trim_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Returns the file extension of a URL's last path segment, including the dot
///
/// The extension runs from the last dot of the segment, so a dot-file such
/// as `.jpg` is all extension. The query string is ignored. URLs without a
/// dot in their last segment yield an empty string.
///
/// # Examples
///
/// ```
/// use media_cache::ext;
///
/// assert_eq!(ext("http://x/a.jpg?w=100"), ".jpg");
/// assert_eq!(ext("http://x/a"), "");
/// ```
pub fn ext(url: &str) -> String {
    let segment = trim_query(url).rsplit('/').next().unwrap_or_default();

    segment
        .rfind('.')
        .map(|i| segment[i..].to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Normal Name"), "Normal Name");
        assert_eq!(sanitize_filename("ABC-123: Part 1"), "ABC-123- Part 1");
        assert_eq!(sanitize_filename("../../etc/passwd"), "-..-etc-passwd");
        assert_eq!(sanitize_filename("  Spaces  "), "Spaces");
        assert_eq!(sanitize_filename("...dots..."), "dots");
    }

    #[test]
    fn test_trim_query() {
        assert_eq!(trim_query("http://x/a.jpg?w=100&h=2"), "http://x/a.jpg");
        assert_eq!(trim_query("http://x/a.jpg"), "http://x/a.jpg");
        assert_eq!(trim_query(""), "");
    }

    #[test]
    fn test_ext() {
        assert_eq!(ext("http://x/a.jpg?w=100"), ".jpg");
        assert_eq!(ext("http://x/a"), "");
        assert_eq!(ext("http://x/path.d/a"), "");
        assert_eq!(ext("http://x/a.tar.gz"), ".gz");
        assert_eq!(ext("http://x/dir/"), "");
        assert_eq!(ext(""), "");
    }

    #[test]
    fn test_ext_of_dot_segments() {
        assert_eq!(ext("http://x/.jpg"), ".jpg");
        assert_eq!(ext("http://x/a.jpg."), ".");
        assert_eq!(ext("http://x/.hidden.png?v=2"), ".png");
    }
}
