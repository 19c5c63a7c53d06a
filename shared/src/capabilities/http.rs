//! Requests go out through `crux_http`. `crux_http` panics on a URL it cannot
//! parse, so every URL handed to it passes through [`ValidatedUrl`] first.

use thiserror::Error;
use url::Url;

pub use crux_http::{Http, HttpError, RequestBuilder, Response};

pub const MAX_URL_LENGTH: usize = 2048;

/// What every HTTP response event carries. Bodies stay raw bytes and are
/// decoded by `api::decode`.
pub type HttpResult = crux_http::Result<Response<Vec<u8>>>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid URL '{url}': {reason}")]
pub struct InvalidUrl {
    pub url: String,
    pub reason: String,
}

/// An absolute `http(s)` URL with a host and no embedded credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl(Url);

impl ValidatedUrl {
    pub fn new(url: &str) -> Result<Self, InvalidUrl> {
        let invalid = |reason: String| InvalidUrl {
            url: truncate(url),
            reason,
        };

        if url.trim().is_empty() {
            return Err(invalid("URL cannot be empty".into()));
        }
        if url.len() > MAX_URL_LENGTH {
            return Err(invalid(format!(
                "URL exceeds maximum length of {MAX_URL_LENGTH} bytes"
            )));
        }

        let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
        Self::from_url(parsed)
    }

    pub fn from_url(url: Url) -> Result<Self, InvalidUrl> {
        let invalid = |reason: &str| InvalidUrl {
            url: truncate(url.as_str()),
            reason: reason.to_string(),
        };

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("only 'http' and 'https' are allowed"));
        }
        if url.host_str().is_none() {
            return Err(invalid("URL must have a host"));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(invalid("credentials in URL are not allowed"));
        }
        if url.as_str().len() > MAX_URL_LENGTH {
            return Err(invalid("URL too long"));
        }
        Ok(Self(url))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn into_url(self) -> Url {
        self.0
    }
}

fn truncate(url: &str) -> String {
    match url.char_indices().nth(100) {
        Some((cut, _)) => format!("{}...", &url[..cut]),
        None => url.to_string(),
    }
}
