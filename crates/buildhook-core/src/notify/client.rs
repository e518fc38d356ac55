//! HTTP delivery of notify payloads

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::config::HttpConfig;
use crate::error::{Error, Result};

/// Content type sent with every payload
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Delivery failures. Transport errors and bad statuses are the same kind of
/// failure to the pipeline; the variants only carry detail for the log.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("status code is {0}, expected 200")]
    Status(u16),
}

/// Shared, pooled HTTP client with fixed timeouts.
///
/// Build one per process and clone it into every notifier; clones share the
/// connection pool.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    client: Client,
}

impl DeliveryClient {
    /// Create a client from configured timeouts
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))?;

        debug!(
            connect_timeout = %humantime::format_duration(config.connect_timeout),
            read_timeout = %humantime::format_duration(config.read_timeout),
            request_timeout = %humantime::format_duration(config.request_timeout),
            "HTTP client ready"
        );

        Ok(Self { client })
    }

    /// POST `json` to `url` once. Anything but 200 is an error.
    ///
    /// The response body is always drained so the connection returns to the
    /// pool.
    pub async fn post(&self, url: &str, json: &str) -> std::result::Result<StatusCode, DeliveryError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(json.to_owned())
            .send()
            .await?;

        let status = response.status();
        // Body is never inspected.
        if let Err(e) = response.bytes().await {
            debug!(url = %url, status = status.as_u16(), error = %e, "Failed to drain response body");
        }

        if status != StatusCode::OK {
            return Err(DeliveryError::Status(status.as_u16()));
        }

        info!(url = %url, bytes = json.len(), "Notify payload delivered");
        Ok(status)
    }
}
