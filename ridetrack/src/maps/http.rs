//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::error::MapsError;

/// Trait for asynchronous HTTP client operations.
///
/// The mapping client only issues GET requests; everything it needs is in
/// the query string.
pub trait AsyncHttpClient: Send + Sync + 'static {
    /// Performs an async HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, MapsError>> + Send;
}

/// Default User-Agent string for HTTP requests.
const DEFAULT_USER_AGENT: &str = concat!("ridetrack/", env!("CARGO_PKG_VERSION"));

/// Async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new AsyncReqwestClient with a 10 second timeout.
    pub fn new() -> Result<Self, MapsError> {
        Self::with_timeout(Duration::from_secs(10))
    }

    /// Creates a new AsyncReqwestClient with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, MapsError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| MapsError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, MapsError> {
        // Never log the full URL; it carries the API key.
        let endpoint = redact(url);
        trace!(endpoint = %endpoint, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    endpoint = %endpoint,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    endpoint = %endpoint,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(MapsError::Network(format!(
                    "Request to {} failed: {}",
                    endpoint,
                    e.without_url()
                )));
            }
        };

        if !response.status().is_success() {
            warn!(
                endpoint = %endpoint,
                status = response.status().as_u16(),
                "HTTP error status"
            );
            return Err(MapsError::Network(format!(
                "HTTP {} from {}",
                response.status(),
                endpoint
            )));
        }

        match response.bytes().await {
            Ok(bytes) => {
                trace!(endpoint = %endpoint, bytes = bytes.len(), "HTTP response body read");
                Ok(bytes.to_vec())
            }
            Err(e) => {
                warn!(endpoint = %endpoint, "Failed to read response body");
                Err(MapsError::Network(format!(
                    "Failed to read response: {}",
                    e.without_url()
                )))
            }
        }
    }
}

/// Strip the query string from a URL for logging.
pub(crate) fn redact(url: &str) -> &str {
    url.split_once('?').map(|(path, _)| path).unwrap_or(url)
}
