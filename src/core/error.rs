//! Error type system for the stroke dashboard client
//!
//! This module provides the error taxonomy shared by every user action:
//! - Client-side validation failures caught before any network call
//! - Authentication rejections and connectivity failures, kept apart so the
//!   login chain can decide whether a fallback applies
//! - Server failures with the message the API reported
//! - Conversion into user-facing messages for notifications

use serde::{Deserialize, Serialize};

/// Main error type for the dashboard client
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    // Client-side errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Operation already in progress: {0}")]
    Busy(String),

    // Remote errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Server unreachable: {0}")]
    Connectivity(String),

    /// `reported` is false when the message was made up on this side
    /// because the server gave no reason of its own
    #[error("Server error: {message}")]
    Server { message: String, reported: bool },

    // Local errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DashboardError {
    /// Get the error type name used in notifications and logs
    pub fn error_type(&self) -> &'static str {
        match self {
            DashboardError::Validation(_) => "ValidationError",
            DashboardError::Busy(_) => "Busy",
            DashboardError::Authentication(_) => "AuthenticationError",
            DashboardError::Connectivity(_) => "ConnectivityError",
            DashboardError::Server { .. } => "ServerError",
            DashboardError::Storage(_) => "StorageError",
            DashboardError::Config(_) => "ConfigError",
            DashboardError::Io(_) => "IoError",
            DashboardError::Serialization(_) => "SerializationError",
        }
    }

    /// The message shown to the user, without the variant prefix
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::Validation(msg)
            | DashboardError::Busy(msg)
            | DashboardError::Authentication(msg)
            | DashboardError::Server { message: msg, .. } => msg.clone(),
            DashboardError::Connectivity(_) => {
                "Cannot reach the server. Check your connection and try again.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Server failure carrying the server's own message
    pub fn server(message: impl Into<String>) -> Self {
        DashboardError::Server {
            message: message.into(),
            reported: true,
        }
    }

    /// Server failure without a reason from the server
    pub fn server_unexplained(message: impl Into<String>) -> Self {
        DashboardError::Server {
            message: message.into(),
            reported: false,
        }
    }

    /// Whether the request never reached the server
    pub fn is_connectivity(&self) -> bool {
        matches!(self, DashboardError::Connectivity(_))
    }
}

/// Error payload returned by the remote API
///
/// The API is not consistent about the field name, so both are accepted.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Parse an error body, tolerating non-JSON responses
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// The server-reported message, if any non-empty one is present
    pub fn into_message(self) -> Option<String> {
        self.error
            .filter(|m| !m.trim().is_empty())
            .or(self.message.filter(|m| !m.trim().is_empty()))
    }
}

/// Result type alias for operations that can fail with DashboardError
pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types() {
        assert_eq!(
            DashboardError::Validation("x".into()).error_type(),
            "ValidationError"
        );
        assert_eq!(
            DashboardError::Authentication("x".into()).error_type(),
            "AuthenticationError"
        );
        assert_eq!(
            DashboardError::Connectivity("x".into()).error_type(),
            "ConnectivityError"
        );
        assert_eq!(DashboardError::server("x").error_type(), "ServerError");
    }

    #[test]
    fn test_user_message_strips_prefix() {
        let err = DashboardError::Authentication("Invalid credentials".into());
        assert_eq!(err.user_message(), "Invalid credentials");
        assert!(err.to_string().starts_with("Authentication failed"));
    }

    #[test]
    fn test_connectivity_message_is_generic() {
        let err = DashboardError::Connectivity("tcp connect error: refused".into());
        assert!(err.is_connectivity());
        assert!(!err.user_message().contains("tcp"));
    }

    #[test]
    fn test_api_error_body_prefers_error_field() {
        let body = ApiErrorBody::parse(r#"{"error":"Patient not found","message":"ignored"}"#);
        assert_eq!(body.into_message().as_deref(), Some("Patient not found"));
    }

    #[test]
    fn test_api_error_body_falls_back_to_message() {
        let body = ApiErrorBody::parse(r#"{"error":"","message":"Bad image"}"#);
        assert_eq!(body.into_message().as_deref(), Some("Bad image"));
    }

    #[test]
    fn test_api_error_body_non_json() {
        let body = ApiErrorBody::parse("<html>502 Bad Gateway</html>");
        assert!(body.into_message().is_none());
    }
}
