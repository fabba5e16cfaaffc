//! Note API client configuration.

use std::time::Duration;

use crate::error::{ApiError, ApiResult};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of todos fetched per sync.
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Connection settings for the note API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL of the API, for example `https://notes.example.com/api/v1`.
    pub base_url: String,
    /// Bearer token, expected to be a JWT.
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ApiConfig {
    /// Creates a config with the default timeout.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks the token for obvious misconfiguration before any request is
    /// made: empty values, stringified nulls from a broken env pipeline,
    /// and non-JWT shapes are all rejected.
    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::configuration("base URL is not set"));
        }
        let token = self.token.trim();
        if token.is_empty() {
            return Err(ApiError::configuration("API token is not set"));
        }
        if token == "undefined" || token == "null" {
            return Err(ApiError::configuration(
                "API token is a stringified null, check the environment",
            ));
        }
        if !token.contains('.') {
            return Err(ApiError::configuration("API token is not a JWT"));
        }
        Ok(())
    }
}

/// Parameters for one todo fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchQuery {
    /// Number of records to fetch.
    pub size: u32,
    /// Optional text filter applied server-side.
    pub search_text: Option<String>,
    /// Optional tag filter, resolved to a tag id before the fetch.
    pub tag_name: Option<String>,
}

impl FetchQuery {
    /// Creates a query for the first `size` todos.
    pub fn with_size(size: u32) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Restricts the fetch to todos matching `text`.
    #[must_use]
    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Restricts the fetch to todos carrying the named tag.
    #[must_use]
    pub fn with_tag_name(mut self, name: impl Into<String>) -> Self {
        self.tag_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: &str) -> ApiConfig {
        ApiConfig::new("https://notes.example.com/api/v1", token)
    }

    #[test]
    fn accepts_jwt_shaped_token() {
        assert!(config("header.payload.signature").validate().is_ok());
    }

    #[test]
    fn rejects_empty_token() {
        assert!(config("").validate().is_err());
        assert!(config("   ").validate().is_err());
    }

    #[test]
    fn rejects_stringified_nulls() {
        assert!(config("undefined").validate().is_err());
        assert!(config("null").validate().is_err());
    }

    #[test]
    fn rejects_non_jwt_token() {
        assert!(config("plain-token-no-dots").validate().is_err());
    }

    #[test]
    fn strips_trailing_slash_from_base_url() {
        let cfg = ApiConfig::new("https://notes.example.com/api/v1/", "a.b.c");
        assert_eq!(cfg.base_url, "https://notes.example.com/api/v1");
    }

    #[test]
    fn query_builders() {
        let query = FetchQuery::with_size(50)
            .with_search_text("meeting")
            .with_tag_name("work");
        assert_eq!(query.size, 50);
        assert_eq!(query.search_text.as_deref(), Some("meeting"));
        assert_eq!(query.tag_name.as_deref(), Some("work"));
    }
}
