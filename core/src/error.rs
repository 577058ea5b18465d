//! Error types for the portfolio API client.
//!
//! # Design
//! `ApiError` is the one failure a caller reacts to: it carries the message to
//! show and the HTTP status that decides recovery (`0` when no response was
//! received at all). It has exactly two constructors, one per origin, and no
//! `From` conversions, so an unrelated failure can never masquerade as one.
//!
//! `ClientError` wraps it together with the failures that are not the
//! server's verdict: a 2xx body of the wrong shape, a payload that could not
//! be encoded, or a request that could not be built (bad base URL, a header
//! value that cannot be sent, an unparsable content type).

use std::fmt;

use thiserror::Error;

use crate::http::HttpResponse;

/// Message reported whenever no HTTP response reached the client.
pub const CONNECTION_ERROR_MESSAGE: &str =
    "Unable to connect to the server. Please check your connection and try again.";

/// Status used for failures where no response was received.
pub const UNREACHABLE_STATUS: u16 = 0;

/// A failure reported by (or on the way to) the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    message: String,
    status: u16,
}

impl ApiError {
    /// The transport never produced a response.
    pub(crate) fn unreachable() -> Self {
        Self {
            message: CONNECTION_ERROR_MESSAGE.to_string(),
            status: UNREACHABLE_STATUS,
        }
    }

    /// The server answered with a non-2xx status.
    ///
    /// Uses the `detail` string of a `{"detail": ...}` body when present,
    /// otherwise a generic message naming the status.
    pub(crate) fn from_response(response: &HttpResponse) -> Self {
        let message = extract_detail(&response.body)
            .unwrap_or_else(|| format!("Request failed ({})", response.status));
        Self {
            message,
            status: response.status,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// No response was received (offline, DNS, connection refused).
    pub fn is_unreachable(&self) -> bool {
        self.status == UNREACHABLE_STATUS
    }

    /// The server refused the credentials: 401 or 403.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, 401 | 403)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiError {}

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .and_then(serde_json::Value::as_str)
        .filter(|detail| !detail.is_empty())
        .map(str::to_string)
}

/// Errors returned by every client operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure or a rejected response.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The server returned 2xx but the body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request payload could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The request was rejected locally and never sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// The underlying `ApiError`, if the failure came from the server or the
    /// connection.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(err) => Some(err),
            _ => None,
        }
    }

    /// HTTP status of an `Api` failure (`0` for transport failures).
    pub fn status(&self) -> Option<u16> {
        self.api().map(ApiError::status)
    }

    /// Callers clear the session and send the user to login on this.
    pub fn is_unauthorized(&self) -> bool {
        self.api().is_some_and(ApiError::is_unauthorized)
    }

    pub fn is_unreachable(&self) -> bool {
        self.api().is_some_and(ApiError::is_unreachable)
    }
}
