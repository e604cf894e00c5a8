//! Error types for the REST client.

use smartbite_core::Error as CoreError;
use thiserror::Error;

/// Result type alias for REST client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur while talking to the SmartBite backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success response; the backend sends the reason as a text body
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Token that cannot be sent as a header
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl ApiError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }
}

impl From<ApiError> for CoreError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Http(e) => CoreError::Http(e.to_string()),
            ApiError::Json(e) => CoreError::Parse(e.to_string()),
            ApiError::Api { status, message } => CoreError::Api { status, message },
            ApiError::Auth(message) => CoreError::Auth(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_keeps_status_in_core_error() {
        let core: CoreError = ApiError::api(409, "Correo ya registrado").into();
        assert_eq!(
            core,
            CoreError::Api {
                status: 409,
                message: "Correo ya registrado".to_string()
            }
        );
        assert!(core.is_client_error());
    }

    #[test]
    fn test_json_error_becomes_parse_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let core: CoreError = ApiError::from(json_err).into();
        assert!(matches!(core, CoreError::Parse(_)));
    }
}
