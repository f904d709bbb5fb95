//! HTTP transport to the host proxy.

use std::time::Duration;

use async_trait::async_trait;
use psbridge_core::{BridgeError, CommandEnvelope, CommandResult, Session, Transport};

use crate::protocol;

/// Sends each envelope as one HTTP POST to the session endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for the given session.
    ///
    /// # Errors
    /// Returns `BridgeError::Config` if the endpoint does not parse as a URL
    /// with a host, or the HTTP client cannot be built.
    pub fn new(session: &Session) -> Result<Self, BridgeError> {
        let url = reqwest::Url::parse(session.endpoint())
            .map_err(|e| BridgeError::Config(format!("Invalid endpoint URL: {e}")))?;
        if url.host_str().is_none() {
            return Err(BridgeError::Config(format!(
                "endpoint has no host: '{}'",
                session.endpoint()
            )));
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| BridgeError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: session.endpoint().to_string(),
            timeout: session.timeout(),
        })
    }

    /// Endpoint this transport posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn round_trip(&self, envelope: &CommandEnvelope) -> Result<CommandResult, BridgeError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(envelope)
            .send()
            .await
            .map_err(|e| self.map_error(&e))?;

        let body = response.text().await.map_err(|e| self.map_error(&e))?;
        protocol::parse_result(&body, envelope.id())
    }

    fn map_error(&self, e: &reqwest::Error) -> BridgeError {
        if e.is_timeout() {
            BridgeError::Timeout(self.timeout)
        } else if e.is_decode() {
            BridgeError::Protocol(e.to_string())
        } else {
            BridgeError::Transport {
                endpoint: self.endpoint.clone(),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, envelope: &CommandEnvelope) -> Result<CommandResult, BridgeError> {
        tracing::debug!(
            id = %envelope.id(),
            operation = envelope.operation(),
            "Sending command"
        );

        let result = tokio::time::timeout(self.timeout, self.round_trip(envelope))
            .await
            .unwrap_or(Err(BridgeError::Timeout(self.timeout)));

        if let Err(e) = &result {
            tracing::warn!(
                id = %envelope.id(),
                operation = envelope.operation(),
                "Round trip failed: {e}"
            );
        }
        result
    }
}
