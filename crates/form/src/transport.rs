//! How the form reaches the server.

use async_trait::async_trait;
use serde_json::Value;

use api_shared::ContactReq;

/// What came back from the server, before the form interprets it.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// Parsed body, or `None` when the response was not JSON.
    pub body: Option<Value>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),
}

/// Sends one contact request.
#[async_trait]
pub trait ContactTransport: Send + Sync {
    async fn post_contact(&self, request: &ContactReq) -> Result<TransportResponse, TransportError>;
}

/// `POST {base_url}/api/contact` over HTTP.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/contact", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ContactTransport for HttpTransport {
    async fn post_contact(&self, request: &ContactReq) -> Result<TransportResponse, TransportError> {
        // `.json()` sets `Content-Type: application/json`.
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));

        let body = if is_json {
            match response.json::<Value>().await {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!("contact response was not valid JSON: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(TransportResponse { status, body })
    }
}
