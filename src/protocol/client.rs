//! HTTP client for the coordination server.
//!
//! All transport failures surface as [`ClientError::Transport`] with a
//! descriptive message; the owning loops decide when to retry. Every request
//! carries an explicit timeout so a hung server cannot block a loop forever.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::protocol::types::{
    DistinguishedPoint, ParamsMessage, SessionStatus, StatusResponse, SubmitRequest,
};

/// The coordination server as seen by the client. The trait seam exists so
/// the session and pump can be exercised against a scripted coordinator in
/// tests.
#[async_trait]
pub trait Coordinator: Send + Sync {
    /// Fetch the global run status for a problem id.
    async fn get_status(&self, id: &str) -> Result<SessionStatus, ClientError>;

    /// Fetch the problem parameters and jump table for a problem id.
    async fn get_parameters(&self, id: &str) -> Result<ParamsMessage, ClientError>;

    /// Submit a batch of distinguished points. All-or-nothing from the
    /// client's point of view; there is no partial-success contract.
    async fn submit_points(
        &self,
        id: &str,
        points: &[DistinguishedPoint],
    ) -> Result<(), ClientError>;
}

/// reqwest-backed [`Coordinator`] implementation.
#[derive(Debug, Clone)]
pub struct HttpCoordinator {
    base_url: String,
    http_client: Client,
}

impl HttpCoordinator {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timing.request_timeout_secs))
            .user_agent(concat!("ecdl-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.server_url(),
            http_client,
        })
    }

    fn transport(context: &str, err: impl std::fmt::Display) -> ClientError {
        ClientError::Transport(format!("{context}: {err}"))
    }
}

#[async_trait]
impl Coordinator for HttpCoordinator {
    async fn get_status(&self, id: &str) -> Result<SessionStatus, ClientError> {
        let url = format!("{}/problems/{}/status", self.base_url, id);

        let resp = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::transport("Failed to get run status", e))?;

        if !resp.status().is_success() {
            return Err(ClientError::Transport(format!(
                "Status request failed with HTTP {}",
                resp.status()
            )));
        }

        let status: StatusResponse = resp
            .json()
            .await
            .map_err(|e| Self::transport("Failed to parse status response", e))?;

        debug!("Server status for {}: {}", id, status.status);
        Ok(SessionStatus::from_code(status.status))
    }

    async fn get_parameters(&self, id: &str) -> Result<ParamsMessage, ClientError> {
        let url = format!("{}/problems/{}/params", self.base_url, id);

        let resp = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::transport("Failed to get problem parameters", e))?;

        if !resp.status().is_success() {
            return Err(ClientError::Transport(format!(
                "Parameter request failed with HTTP {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| Self::transport("Failed to parse parameter response", e))
    }

    async fn submit_points(
        &self,
        id: &str,
        points: &[DistinguishedPoint],
    ) -> Result<(), ClientError> {
        let url = format!("{}/problems/{}/points", self.base_url, id);
        let body = SubmitRequest {
            points: points.to_vec(),
        };

        let resp = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::transport("Failed to submit points", e))?;

        if !resp.status().is_success() {
            return Err(ClientError::Transport(format!(
                "Point submission failed with HTTP {}",
                resp.status()
            )));
        }

        info!("Submitted {} points for problem {}", points.len(), id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = ClientConfig::default();
        assert!(HttpCoordinator::new(&config).is_ok());
    }

    #[test]
    fn test_base_url_from_config() {
        let mut config = ClientConfig::default();
        config.server.host = "192.168.1.10".to_string();
        config.server.port = 7000;
        let client = HttpCoordinator::new(&config).unwrap();
        assert_eq!(client.base_url, "http://192.168.1.10:7000");
    }
}
