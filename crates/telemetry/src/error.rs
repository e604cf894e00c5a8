//! Error types for the telemetry link.

use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TelemetryError {
    /// The broker refused or could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Publish attempted while the link is not connected
    #[error("Not connected to the broker")]
    NotConnected,

    /// The transport failed to subscribe or publish
    #[error("Transport error: {0}")]
    Transport(String),

    /// A message handler failed
    #[error("Handler error: {0}")]
    Handler(String),
}

impl TelemetryError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}
