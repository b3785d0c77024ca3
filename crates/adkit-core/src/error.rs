//! Error types for directory operations.
//!
//! Every public operation in the toolkit reports its outcome through [`Result`]. The variants
//! mirror the ways a directory call can go wrong, so callers can tell "not found" apart from
//! "ambiguous" apart from "the server rejected the change" without inspecting message text.

use serde::Serialize;
use thiserror::Error;

/// Main error type for directory operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Connecting, establishing TLS, binding or searching failed at the transport level
    #[error("Transport error: {0}")]
    TransportError(String),

    /// No entry matched the identifier
    #[error("Not found: {0}")]
    NotFound(String),

    /// More than one entry matched an identifier that must be unique
    #[error("Ambiguous match: {0}")]
    AmbiguousMatch(String),

    /// The server rejected an attribute modification
    #[error("Modify failed: {0}")]
    ModifyFailed(String),

    /// The server rejected an add-entry request
    #[error("Create failed: {0}")]
    CreateFailed(String),

    /// The server rejected a move or rename request
    #[error("Move failed: {0}")]
    MoveFailed(String),

    /// A timestamp or numeric value could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Specialized result type for directory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error response for serialization.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
    /// Optional correlation ID supplied by the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail structure.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorDetail {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Server or parser detail text, without the kind prefix carried by `message`
    pub details: String,
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TransportError(_) => "TRANSPORT_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AmbiguousMatch(_) => "AMBIGUOUS_MATCH",
            Self::ModifyFailed(_) => "MODIFY_FAILED",
            Self::CreateFailed(_) => "CREATE_FAILED",
            Self::MoveFailed(_) => "MOVE_FAILED",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    /// Returns the detail text carried by the error, without the kind prefix.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::TransportError(detail)
            | Self::NotFound(detail)
            | Self::AmbiguousMatch(detail)
            | Self::ModifyFailed(detail)
            | Self::CreateFailed(detail)
            | Self::MoveFailed(detail)
            | Self::ParseError(detail)
            | Self::ConfigError(detail)
            | Self::InvalidRequest(detail) => detail,
        }
    }

    /// Converts the error into an `ErrorResponse`.
    #[must_use]
    pub fn into_error_response(self) -> ErrorResponse {
        self.into_error_response_with_id(None)
    }

    /// Converts the error into an `ErrorResponse` with a request ID.
    #[must_use]
    pub fn into_error_response_with_id(self, request_id: Option<String>) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: self.detail().to_string(),
            },
            request_id,
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(self, Self::TransportError(_) | Self::ConfigError(_))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(format!("invalid directory URL: {err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<uuid::Error> for Error {
    fn from(err: uuid::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}
