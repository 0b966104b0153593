//! Error types for Backlog API operations.

use wikilift_core::WikiError;

/// Error from Backlog API operations.
#[derive(Debug, thiserror::Error)]
pub enum BacklogError {
    /// Authentication or authorization rejected (HTTP 401/403).
    #[error("authentication failed (HTTP {status}): {body}")]
    Auth { status: u16, body: String },

    /// Entity does not exist (HTTP 404).
    #[error("not found: {body}")]
    NotFound { body: String },

    /// Any other HTTP failure. `status` 0 means the request never
    /// reached the server.
    #[error("HTTP error: {status} - {body}")]
    Http { status: u16, body: String },

    /// IO error (attachment file reading).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl BacklogError {
    /// Classify an HTTP error status into the API error taxonomy.
    pub(crate) fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Auth { status, body },
            404 => Self::NotFound { body },
            _ => Self::Http { status, body },
        }
    }
}

impl From<serde_json::Error> for BacklogError {
    fn from(e: serde_json::Error) -> Self {
        BacklogError::Json(e.to_string())
    }
}

impl From<ureq::Error> for BacklogError {
    fn from(e: ureq::Error) -> Self {
        BacklogError::Http {
            status: 0,
            body: e.to_string(),
        }
    }
}

impl From<BacklogError> for WikiError {
    fn from(err: BacklogError) -> Self {
        match &err {
            BacklogError::Auth { .. } => WikiError::Auth(err.to_string()),
            BacklogError::NotFound { .. } => WikiError::NotFound(err.to_string()),
            _ => WikiError::Request(err.to_string()),
        }
    }
}
