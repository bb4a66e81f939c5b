//! Error types for the Feishu OAuth proxy.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Message returned to callers for failures whose details stay in the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Errors from the Feishu API client layer.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; carries the raw body or the status text.
    #[error("Feishu API error: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Response body is not valid JSON.
    #[error("Malformed Feishu API response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Provider reported an error inside a well-formed response.
    #[error("Feishu API error: {message}")]
    Provider {
        /// Provider-supplied message
        message: String,
    },

    /// Response matched none of the known token shapes.
    #[error("Unrecognized response format")]
    UnrecognizedFormat,
}

impl ClientError {
    /// Create a status error.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status { status, message: message.into() }
    }

    /// Create a provider error.
    #[must_use]
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider { message: message.into() }
    }

    /// Returns true if the request never produced an HTTP response.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

/// Errors surfaced by the proxy endpoints.
#[derive(thiserror::Error, Debug)]
pub enum ProxyError {
    /// Required request field absent or empty.
    #[error("missing {0}")]
    MissingParameter(&'static str),

    /// Request body could not be decoded.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// App ID supplied without App Secret.
    #[error("incomplete credential, supply both or neither")]
    IncompleteCredential,

    /// App Secret supplied without App ID.
    #[error("parameter mismatch, supply both App ID and App Secret or neither")]
    CredentialMismatch,

    /// Tenant credential failed format or provider validation.
    #[error("invalid credential, check App ID and App Secret")]
    InvalidCredential,

    /// No credential in the request and none configured.
    #[error("no default credential configured, supply App ID and App Secret")]
    NoDefaultCredential,

    /// Provider redirected back with an error.
    #[error("OAuth authorization failed: {0}")]
    AuthorizationDenied(String),

    /// Error from the Feishu API.
    #[error(transparent)]
    Upstream(#[from] ClientError),

    /// Internal proxy fault.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream(e) if e.is_transport() => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Log at error for server faults, warn for rejected requests.
    pub fn log(&self) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::warn!(status = %status, error = %self, "Request rejected");
        }
    }

    /// Message safe to return to the caller.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        if self.status_code().is_server_error() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always false.
    pub success: bool,
    /// Human-readable error message.
    pub error: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self { success: false, error: error.into() }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        self.log();
        (self.status_code(), Json(ErrorBody::new(self.to_user_message()))).into_response()
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for proxy operations.
pub type ProxyResult<T> = Result<T, ProxyError>;
