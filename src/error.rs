//! Client error taxonomy.
//!
//! # Categories
//! - Authentication expiry: recovered inside the client (refresh + replay),
//!   only surfaces here when recovery is impossible
//! - Authentication failure / forbidden: surfaces as `Http` with 401/403
//!   after the session has been cleared
//! - Everything else: terminal for the one request, surfaced to the caller

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::config::loader::ConfigError;

/// Fallback shown to users when the backend gives no message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors returned by [`ApiClient`](crate::http::ApiClient) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No session token for an endpoint outside the public allow-list.
    /// Raised before anything is sent.
    #[error("no session token for protected endpoint {path}")]
    MissingToken { path: String },

    /// Backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        status: StatusCode,
        message: String,
        body: Option<Value>,
    },

    /// Connection, timeout or protocol failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Aborted through the client's canceller.
    #[error("request cancelled")]
    Cancelled,

    #[error("invalid endpoint '{path}': {source}")]
    InvalidUrl {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// Response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// HTTP status of the failure, if the backend answered.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// True for 401/403 answers and for requests rejected for lack of a token.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            ClientError::MissingToken { .. } => true,
            _ => matches!(
                self.status(),
                Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
            ),
        }
    }

    /// Message suitable for a toast: the backend's own message when it sent
    /// one, otherwise a generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Http {
                body: Some(body), ..
            } => backend_message(body).unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Pull a human-readable message out of a backend error body.
pub(crate) fn backend_message(body: &Value) -> Option<String> {
    ["message", "error", "detail"]
        .iter()
        .filter_map(|key| body.get(*key))
        .find_map(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
