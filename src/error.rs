//! Error types for the remote Linux client

use thiserror::Error;

/// Main error type for remote and local execution
#[derive(Debug, Error)]
pub enum RemoteError {
    /// SSH protocol or channel failure after the TCP connection was made
    #[error("SSH connection error: {0}")]
    Connection(String),

    /// Credentials rejected by the remote host
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// TCP connection could not be established (refused, no route, DNS)
    #[error("Host unreachable: {0}")]
    Unreachable(String),

    /// Connection attempt exceeded the handshake timeout
    #[error("Connection timeout after {0}ms")]
    HandshakeTimeout(u64),

    /// Command round trip timed out
    #[error("Command timeout after {0}ms")]
    Timeout(u64),

    /// SFTP transfer failed
    #[error("File transfer failed: {0}")]
    Transfer(String),

    /// Invalid parameters provided
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SSH key parsing error
    #[error("SSH key error: {0}")]
    SshKey(String),

    /// Command output was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using RemoteError
pub type Result<T> = std::result::Result<T, RemoteError>;

impl RemoteError {
    /// Create a connection error from a string
    pub fn connection(msg: impl Into<String>) -> Self {
        RemoteError::Connection(msg.into())
    }

    /// Create an authentication error from a string
    pub fn auth(msg: impl Into<String>) -> Self {
        RemoteError::Authentication(msg.into())
    }

    /// Create an unreachable host error from a string
    pub fn unreachable(msg: impl Into<String>) -> Self {
        RemoteError::Unreachable(msg.into())
    }

    /// Create a transfer error from a string
    pub fn transfer(msg: impl Into<String>) -> Self {
        RemoteError::Transfer(msg.into())
    }

    /// Create an invalid params error from a string
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        RemoteError::InvalidParams(msg.into())
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        RemoteError::Config(msg.into())
    }

    /// Whether a caller may reasonably retry the operation as-is.
    ///
    /// Authentication failures need new credentials and are never retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteError::Unreachable(_) | RemoteError::HandshakeTimeout(_)
        )
    }
}
