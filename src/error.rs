//! Error taxonomy for the discussion sync engine.
//!
//! DESIGN
//! ======
//! One enum covers transport, server, and local failures. Callers rarely
//! branch on variants: pollers log and keep cached data, `send` keeps the
//! draft, `create` raises an alert. `is_transient` marks what the next poll
//! tick will retry on its own.

use crate::api::RecordId;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The request never produced a response (connect failure, timeout, reset).
    #[error("network failure: {0}")]
    Network(String),

    /// Input rejected locally or by the server (HTTP 400).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested group does not exist or is not visible to this user.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success HTTP status.
    #[error("server rejected request: status {status}")]
    Rejected { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// A selection referenced a group id missing from the cached list.
    #[error("unknown group {0}")]
    UnknownGroup(RecordId),
}

impl SyncError {
    /// Stable machine-readable code, used as a structured log field.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E_NETWORK",
            Self::Validation(_) => "E_VALIDATION",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::Rejected { .. } => "E_REJECTED",
            Self::Decode(_) => "E_DECODE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::UnknownGroup(_) => "E_UNKNOWN_GROUP",
        }
    }

    /// Whether simply trying again later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Rejected { status: 429 | 500..=599, .. })
    }
}

/// Map a non-success HTTP status and its body to the matching variant.
#[must_use]
pub fn status_error(status: u16, body: String) -> SyncError {
    match status {
        400 => SyncError::Validation(body),
        404 => SyncError::NotFound(body),
        _ => SyncError::Rejected { status, body },
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
