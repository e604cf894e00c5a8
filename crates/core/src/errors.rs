//! Core error types for the SmartBite pipeline.
//!
//! Transport-specific errors (reqwest, rumqttc, file IO) are converted into
//! these variants by the crates that own the transport, so that the core stays
//! independent of any particular HTTP or broker library.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the pipeline.
///
/// Nothing here is fatal to the process: every variant is meant to be turned
/// into a reported, user-visible state by the component that produced it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Missing or invalid credentials for an operation that requires them.
    #[error("Session error: {0}")]
    Session(String),

    /// Broker unreachable or publish attempted while disconnected.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Malformed inbound telemetry payload.
    #[error("Failed to parse payload: {0}")]
    Parse(String),

    /// Fetching readings from the backend failed.
    #[error("Failed to refresh readings: {0}")]
    Refresh(String),

    /// Registering a new reading failed.
    #[error("Failed to save reading: {0}")]
    Commit(String),

    /// Login or registration rejected by the backend.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Non-success response from the backend.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network-level failure talking to the backend.
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Input validation failed: {0}")]
    Validation(String),

    /// Local key-value store failure.
    #[error("Preference store error: {0}")]
    Preference(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the error came back as a 4xx from the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if (400..500).contains(status))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
