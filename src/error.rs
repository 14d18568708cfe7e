//! Application error types.
//!
//! These errors are serializable so a UI collaborator can receive them as
//! structured payloads alongside the human-readable notification text.

use serde::Serialize;
use thiserror::Error;

/// Application-level errors produced while reconciling searches.
///
/// All variants serialize to a structured JSON object for UI consumption.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Network request failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Remote tracker API request failed.
    #[error("Remote API error: {message}")]
    RemoteApi {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },

    /// Authentication failed or credentials invalid.
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// Fetching a page of issues failed.
    ///
    /// This is the one classified failure: it is shown to the user but is
    /// not reported to the diagnostic log.
    #[error("{message}")]
    RemoteFetch { message: String },

    /// Requested resource not found.
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Settings could not be read, written or validated.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The apply context stopped before acknowledging a mutation.
    #[error("Apply context is not running")]
    ApplyClosed,

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a remote API error.
    pub fn remote_api(message: impl Into<String>) -> Self {
        Self::RemoteApi {
            message: message.into(),
            status_code: None,
            endpoint: None,
        }
    }

    /// Create a remote API error with status code and endpoint.
    pub fn remote_api_full(
        message: impl Into<String>,
        status_code: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self::RemoteApi {
            message: message.into(),
            status_code: Some(status_code),
            endpoint: Some(endpoint.into()),
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a classified page fetch error.
    pub fn remote_fetch(message: impl Into<String>) -> Self {
        Self::RemoteFetch {
            message: message.into(),
        }
    }

    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this failure is an expected, user-facing one.
    ///
    /// Unclassified failures are treated as defects and routed to the
    /// diagnostic log in addition to the user notification.
    pub fn is_classified(&self) -> bool {
        matches!(self, Self::RemoteFetch { .. })
    }
}

// Conversions from common error types

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("Request timed out")
        } else if err.is_connect() {
            Self::network("Failed to connect to server")
        } else if err.is_status() {
            Self::remote_api(format!("HTTP error: {}", err))
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = AppError::network("connection reset");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"type\":\"Network\""));
        assert!(json.contains("connection reset"));
    }

    #[test]
    fn test_remote_api_error_full() {
        let err = AppError::remote_api_full("Not Found", 404, "/projects/1/issues");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"status_code\":404"));
        assert!(json.contains("/projects/1/issues"));
    }

    #[test]
    fn test_optional_fields_not_serialized() {
        let err = AppError::remote_api("boom");
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("status_code"));
        assert!(!json.contains("endpoint"));
    }

    #[test]
    fn test_only_remote_fetch_is_classified() {
        assert!(AppError::remote_fetch("connection broken: timeout").is_classified());
        assert!(!AppError::network("timeout").is_classified());
        assert!(!AppError::ApplyClosed.is_classified());
        assert!(!AppError::internal("bug").is_classified());
    }

    #[test]
    fn test_remote_fetch_displays_bare_message() {
        let err = AppError::remote_fetch("connection broken: Request timed out");
        assert_eq!(err.to_string(), "connection broken: Request timed out");
    }

    #[test]
    fn test_display_impl() {
        let err = AppError::authentication("invalid token");
        assert_eq!(format!("{}", err), "Authentication error: invalid token");
    }
}
