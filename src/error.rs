//! Error taxonomy for the client.
//!
//! Callers distinguish retryable from fatal conditions by variant rather than
//! by inspecting message strings.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// A status, parameter or submission call to the coordination server
    /// failed. Always recoverable: the owning loop logs and retries at its
    /// own cadence.
    #[error("transport error: {0}")]
    Transport(String),

    /// A candidate result failed cryptographic verification. Recoverable;
    /// the candidate is discarded.
    #[error("validation error: {0}")]
    Validation(String),

    /// Bad configuration or no usable compute device. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
