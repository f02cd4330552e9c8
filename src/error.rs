//! Error types for dynsec-mcp

use thiserror::Error;

use crate::dynsec::ConnectionError;

/// Main error type for dynsec operations and the MCP server
#[derive(Debug, Error)]
pub enum DynsecError {
    /// SSH connection, channel or exec failure
    #[error("SSH connection error: {0}")]
    Connection(String),

    /// SSH authentication failed (password or key)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Remote command timed out
    #[error("Command timeout after {0}ms")]
    Timeout(u64),

    /// The broker rejected the administrative action
    #[error(transparent)]
    Broker(#[from] ConnectionError),

    /// The control binary exited non-zero without a connection error
    #[error("mosquitto_ctrl exited with status {exit_code}: {}", .stderr.trim())]
    CommandFailed { exit_code: u32, stderr: String },

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
}

/// Result type alias using DynsecError
pub type Result<T> = std::result::Result<T, DynsecError>;

impl DynsecError {
    /// Create a connection error from a string
    pub fn connection(msg: impl Into<String>) -> Self {
        DynsecError::Connection(msg.into())
    }

    /// Create an authentication error from a string
    pub fn auth(msg: impl Into<String>) -> Self {
        DynsecError::Authentication(msg.into())
    }

    /// Create an invalid params error from a string
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        DynsecError::InvalidParams(msg.into())
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        DynsecError::Config(msg.into())
    }

    /// Whether the broker refused the action (as opposed to the remote run failing)
    pub fn is_broker_rejection(&self) -> bool {
        matches!(self, DynsecError::Broker(_))
    }
}
