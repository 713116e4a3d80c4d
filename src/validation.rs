use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Longest URL accepted for shortening, in characters.
pub const MAX_URL_LENGTH: usize = 2048;

static URL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^https?://",
        r"(?:",
        // dotted domain name
        r"(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,6}\.?",
        r"|localhost",
        r"|(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)",
        r")",
        r"(?::\d{1,5})?",
        // path and query: no whitespace or control characters
        r"(?:/?|[/?][^\s\p{Cc}]+)$",
    ))
    .expect("URL shape pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidUrl {
    #[error("URL is required")]
    Empty,
    #[error("URL too long ({0} > {max} characters)", max = MAX_URL_LENGTH)]
    TooLong(usize),
    #[error("Invalid URL format")]
    Malformed,
}

/// Checks that `url` looks like `http(s)://host[:port][/path][?query]`.
///
/// The host must be a dotted domain name, `localhost` or an IPv4 address.
/// Callers are expected to have trimmed the input already.
pub fn validate_url(url: &str) -> Result<(), InvalidUrl> {
    if url.is_empty() {
        return Err(InvalidUrl::Empty);
    }
    let len = url.chars().count();
    if len > MAX_URL_LENGTH {
        return Err(InvalidUrl::TooLong(len));
    }
    if !URL_SHAPE.is_match(url) {
        return Err(InvalidUrl::Malformed);
    }
    Ok(())
}

/// Blocklist of domains that may not be shortened.
#[derive(Debug, Clone, Default)]
pub struct UrlPolicy {
    blocked_domains: Vec<String>,
}

impl UrlPolicy {
    pub fn new<I, S>(blocked_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let blocked_domains = blocked_domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self { blocked_domains }
    }

    /// Returns false when the URL mentions any blocked domain (case-insensitive).
    pub fn is_allowed(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        !self.blocked_domains.iter().any(|d| url.contains(d.as_str()))
    }
}
