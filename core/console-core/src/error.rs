//! Error types for console-core operations.
//!
//! Session-level failures never escape the session manager as raw errors;
//! callers observe a status instead. These variants describe what went wrong
//! at the transport, storage and configuration seams.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Invalid API base URL {url}: {details}")]
    InvalidBaseUrl { url: String, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Transport Errors
    // ─────────────────────────────────────────────────────────────────────
    /// The backend rejected the credentials attached to a request.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Malformed response from {endpoint}: {details}")]
    MalformedResponse { endpoint: String, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Session Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("No access token available")]
    MissingToken,

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConsoleError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ConsoleError::Unauthorized)
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ConsoleError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        ConsoleError::Json {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for Results using ConsoleError.
pub type Result<T> = std::result::Result<T, ConsoleError>;

impl From<ConsoleError> for String {
    fn from(err: ConsoleError) -> String {
        err.to_string()
    }
}
