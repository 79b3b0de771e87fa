use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::event::event_model::TrackedEvent;

/// One flush worth of events plus identity metadata, as POSTed to the
/// collector.
#[derive(Debug, Serialize)]
pub struct DeliveryPayload {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "siteId")]
    pub site_id: String,
    pub events: Vec<TrackedEvent>,
}

#[derive(Debug)]
pub enum TransportError {
    /// Request never completed (connect failure, timeout, serialization).
    Network(String),
    /// Collector answered with a non-success status.
    Status(u16),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(msg) => write!(f, "delivery request failed: {}", msg),
            TransportError::Status(code) => write!(f, "collector answered {}", code),
        }
    }
}

impl std::error::Error for TransportError {}

/// Ships one batch to the collector.
///
/// Called at most once per batch. The caller observes the result for
/// logging only: a failed batch is gone, never retried or re-queued.
pub trait Transport {
    fn deliver(&self, payload: &DeliveryPayload) -> Result<(), TransportError>;
}

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking HTTP POST with JSON content type to a fixed collector endpoint.
///
/// No retry and no response body contract; any 2xx counts as delivered.
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        HttpTransport {
            endpoint: endpoint.into(),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn deliver(&self, payload: &DeliveryPayload) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        Ok(())
    }
}
