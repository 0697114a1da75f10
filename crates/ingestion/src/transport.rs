//! Upstream transport: raw byte fetches over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use forecast_common::{ForecastError, ForecastResult};
use reqwest::Client;
use tracing::{debug, info, instrument};

/// Fetches raw payload bytes from a URL.
///
/// Network failures and non-success statuses are `Transport` errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> ForecastResult<Bytes>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(request_timeout: Duration) -> ForecastResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("forecast-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ForecastError::Transport {
                url: String::new(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            request_timeout,
        })
    }

    fn map_error(&self, url: &str, e: reqwest::Error) -> ForecastError {
        if e.is_timeout() {
            ForecastError::Timeout {
                url: url.to_string(),
                seconds: self.request_timeout.as_secs(),
            }
        } else {
            ForecastError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> ForecastResult<Bytes> {
        debug!(url = %url, "Downloading payload");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(url, e))?;

        if !response.status().is_success() {
            return Err(ForecastError::Transport {
                url: url.to_string(),
                message: format!("Download failed: {}", response.status()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.map_error(url, e))?;
        info!(size = bytes.len(), url = %url, "Downloaded payload");

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
        // Port 9 (discard) on localhost is closed in test environments.
        let err = transport.fetch("http://127.0.0.1:9/data.nc").await.unwrap_err();
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_invalid_url_is_transport_error() {
        let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
        let err = transport.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, ForecastError::Transport { .. }));
    }
}
