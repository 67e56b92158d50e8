//! Error types for QueryDesk
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for QueryDesk operations
///
/// The backend taxonomy is flat: a failure is either a transport problem or
/// a server-reported error. The extra variants cover the local concerns
/// (configuration, token decoding, session persistence).
#[derive(Error, Debug)]
pub enum QuerydeskError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected on the client before any request is sent
    #[error("{0}")]
    Validation(String),

    /// Server answered with a non-success status or a non-success envelope
    #[error("API error (HTTP {status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        /// HTTP status code of the response
        status: u16,
        /// Message extracted from the response body, when present
        message: Option<String>,
    },

    /// Server answered 401; the local session must be torn down
    #[error("Unauthorized: {}", .0.as_deref().unwrap_or("session rejected by server"))]
    Unauthorized(Option<String>),

    /// An authenticated action was attempted without a session token
    #[error("You are not logged in.")]
    NotAuthenticated,

    /// Bearer token could not be decoded
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Session persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl QuerydeskError {
    /// Message the server supplied for this failure, if any.
    ///
    /// Validation errors count as "supplied" because they carry the exact
    /// text the backend would have returned for the same input.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => message.as_deref(),
            Self::Unauthorized(message) => message.as_deref(),
            Self::Validation(message) => Some(message.as_str()),
            Self::NotAuthenticated => Some("You are not logged in."),
            _ => None,
        }
    }
}

/// Result type alias for QueryDesk operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Reduce any error to the single human-readable line shown to the user.
///
/// Uses the server-provided message verbatim when there is one, otherwise
/// the action-specific `fallback` (e.g. `"Login failed."`).
///
/// # Examples
///
/// ```
/// use querydesk::error::{user_message, QuerydeskError};
///
/// let err: anyhow::Error = QuerydeskError::Api {
///     status: 409,
///     message: Some("This username is already taken.".to_string()),
/// }
/// .into();
/// assert_eq!(user_message(&err, "Signup failed."), "This username is already taken.");
///
/// let err = anyhow::anyhow!("connection refused");
/// assert_eq!(user_message(&err, "Signup failed."), "Signup failed.");
/// ```
pub fn user_message(err: &anyhow::Error, fallback: &str) -> String {
    err.downcast_ref::<QuerydeskError>()
        .and_then(QuerydeskError::server_message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Returns `true` when the error is a server 401.
pub fn is_unauthorized(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<QuerydeskError>(),
        Some(QuerydeskError::Unauthorized(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = QuerydeskError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_api_error_display_with_message() {
        let error = QuerydeskError::Api {
            status: 500,
            message: Some("boom".to_string()),
        };
        assert_eq!(error.to_string(), "API error (HTTP 500): boom");
    }

    #[test]
    fn test_api_error_display_without_message() {
        let error = QuerydeskError::Api {
            status: 502,
            message: None,
        };
        assert_eq!(error.to_string(), "API error (HTTP 502): no message");
    }

    #[test]
    fn test_unauthorized_display() {
        let error = QuerydeskError::Unauthorized(None);
        assert_eq!(
            error.to_string(),
            "Unauthorized: session rejected by server"
        );
    }

    #[test]
    fn test_validation_display_is_bare_message() {
        let error = QuerydeskError::Validation("Query cannot be empty.".to_string());
        assert_eq!(error.to_string(), "Query cannot be empty.");
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err: anyhow::Error = QuerydeskError::Unauthorized(Some(
            "Incorrect username or password. Please try again.".to_string(),
        ))
        .into();
        assert_eq!(
            user_message(&err, "Login failed."),
            "Incorrect username or password. Please try again."
        );
    }

    #[test]
    fn test_user_message_falls_back_for_transport_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: anyhow::Error = QuerydeskError::Io(io).into();
        assert_eq!(user_message(&err, "Login failed."), "Login failed.");
    }

    #[test]
    fn test_user_message_ignores_blank_server_text() {
        let err: anyhow::Error = QuerydeskError::Api {
            status: 400,
            message: Some("   ".to_string()),
        }
        .into();
        assert_eq!(user_message(&err, "Upload failed."), "Upload failed.");
    }

    #[test]
    fn test_is_unauthorized() {
        let err: anyhow::Error = QuerydeskError::Unauthorized(None).into();
        assert!(is_unauthorized(&err));
        let err: anyhow::Error = QuerydeskError::NotAuthenticated.into();
        assert!(!is_unauthorized(&err));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: QuerydeskError = json_error.into();
        assert!(matches!(error, QuerydeskError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: QuerydeskError = yaml_error.into();
        assert!(matches!(error, QuerydeskError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QuerydeskError>();
    }
}
