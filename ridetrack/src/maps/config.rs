//! Mapping client configuration.

use std::time::Duration;

/// Default Google Maps web service base URL.
pub const DEFAULT_MAPS_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Default HTTP timeout for mapping requests.
pub const DEFAULT_MAPS_TIMEOUT: Duration = Duration::from_secs(10);

/// Placeholder key shipped in sample configuration files.
pub const PLACEHOLDER_API_KEY: &str = "your_google_maps_api_key_here";

/// Minimum trimmed query length that reaches the network.
pub const MIN_SEARCH_QUERY_LEN: usize = 2;

/// Configuration for [`GoogleMapsClient`](super::GoogleMapsClient).
#[derive(Debug, Clone, PartialEq)]
pub struct MapsClientConfig {
    /// API credential. Empty means not configured.
    pub api_key: String,

    /// Base URL of the web service, without trailing slash.
    pub base_url: String,

    /// HTTP request timeout.
    pub timeout: Duration,
}

impl Default for MapsClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_MAPS_BASE_URL.to_string(),
            timeout: DEFAULT_MAPS_TIMEOUT,
        }
    }
}

impl MapsClientConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Returns true if a usable credential is present.
    pub fn has_credential(&self) -> bool {
        is_usable_api_key(&self.api_key)
    }
}

/// An API key is usable when it is non-blank and not the sample placeholder.
pub fn is_usable_api_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && !key.contains(PLACEHOLDER_API_KEY)
}
