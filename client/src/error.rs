//! Errors surfaced by REST calls and the stateful flows built on them.
//!
//! ERROR HANDLING
//! ==============
//! Validation failures are raised before any request is sent. Transport
//! failures carry one fixed user-facing message; HTTP failures carry the
//! server's own `message`/`error` text when the body has one, so callers can
//! show it verbatim or substitute their own fallback.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use forms::{Id, TemplateError, ValidationError};
use serde::Deserialize;

use crate::session_store::SessionStoreError;

/// Shown for every connection-level failure.
pub const CONNECT_FAILED: &str = "Failed to connect to server. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Rejected locally before sending.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A template draft failed local checks.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The request never got a response.
    #[error("Failed to connect to server. Please try again.")]
    Transport(#[source] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{}", .message.as_deref().unwrap_or("request failed"))]
    Http { status: u16, message: Option<String> },

    /// The response body did not have the expected shape.
    #[error("unexpected response from server: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The session could not be read or written.
    #[error(transparent)]
    Session(#[from] SessionStoreError),
}

impl ClientError {
    /// Text the server supplied for an HTTP failure.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Server text if present, otherwise `fallback`; transport and local
    /// failures keep their own message.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Http { message, .. } => message.clone().unwrap_or_else(|| fallback.to_owned()),
            Self::Decode(_) => fallback.to_owned(),
            other => other.to_string(),
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error body shape: `{"message": "..."}` or `{"error": "..."}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Extract the server's error text from a raw body, if any.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed.message.or(parsed.error).filter(|m| !m.trim().is_empty())
}

/// Outcome of a bulk feedback clear that did not fully succeed.
#[derive(Debug, thiserror::Error)]
pub enum ClearError {
    /// The list of records to delete could not be fetched.
    #[error("could not load feedback to clear: {0}")]
    Fetch(#[source] ClientError),

    /// Some deletes failed; the rest went through.
    #[error("cleared {deleted} feedback record(s); {} failed", .failed.len())]
    Partial { deleted: usize, failed: Vec<(Id, ClientError)> },
}
