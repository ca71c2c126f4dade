//! Configuration options for the tracker client

use std::time::Duration;

/// Default URL for the community card catalog feed
pub const DEFAULT_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/chase-manning/pokemon-tcg-pocket-cards/refs/heads/main/v4.json";

/// Configuration options for the tracker client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whether to automatically refresh the session token
    pub auto_refresh_token: bool,

    /// URL of the card catalog feed
    pub catalog_url: String,

    /// Timeout applied to catalog feed fetches
    pub catalog_timeout: Duration,

    /// Timeout applied to backend requests
    pub request_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            catalog_timeout: Duration::from_secs(10),
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ClientOptions {
    /// Set whether to automatically refresh the session token
    pub fn with_auto_refresh_token(mut self, value: bool) -> Self {
        self.auto_refresh_token = value;
        self
    }

    /// Set the card catalog feed URL
    pub fn with_catalog_url(mut self, value: &str) -> Self {
        self.catalog_url = value.to_string();
        self
    }

    /// Set the catalog fetch timeout
    pub fn with_catalog_timeout(mut self, value: Duration) -> Self {
        self.catalog_timeout = value;
        self
    }

    /// Set the backend request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }
}
