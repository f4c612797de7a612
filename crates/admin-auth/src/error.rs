//! Error types for session and auth endpoint operations

/// Errors from auth endpoint calls and session persistence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP request timed out: {0}")]
    Timeout(String),

    #[error("auth endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid auth response: {0}")]
    InvalidResponse(String),

    #[error("session parse error: {0}")]
    SessionParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Map a reqwest send failure, keeping timeouts distinguishable.
    pub(crate) fn transport(context: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(format!("{context}: {err}"))
        } else {
            Error::Http(format!("{context}: {err}"))
        }
    }
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
