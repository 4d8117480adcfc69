//! Error types for session credential operations

/// Errors from credential storage and token refresh operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("refresh request timed out")]
    Timeout,

    #[error("refresh token rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid refresh response: {0}")]
    Parse(String),

    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
