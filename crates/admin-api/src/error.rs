//! Normalized error shape handed to callers
//!
//! Every failure, whatever its source, reaches calling code as an `ApiError`
//! `{ status, message, code?, fieldErrors? }`. `status == 0` means no response
//! was received.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Shown for any failure where the server never answered (including timeouts).
pub const NETWORK_ERROR_MESSAGE: &str = "Unable to reach the server. Please check your connection.";

/// Returned when a 401 cannot be recovered by refreshing.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Returned when a non-admin account logs in.
pub const NOT_ADMIN_MESSAGE: &str = "Access denied. Admin privileges required.";

/// The single error shape all request failures are converted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<BTreeMap<String, String>>,
}

/// Error taxonomy derived from a normalized error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response: network unreachable or timeout
    Transport,
    /// 400, possibly with field errors
    Validation,
    /// 401 that survived the refresh attempt, or a rejected login
    Auth,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 429
    RateLimit,
    /// 5xx
    Server,
    /// Any other 4xx
    Client,
    /// Failure on our side: session storage or an undecodable body
    Local,
}

const CODE_LOCAL: &str = "local";
const CODE_INVALID_RESPONSE: &str = "invalid_response";

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
            field_errors: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// No response was received.
    pub fn network(timed_out: bool) -> Self {
        Self::new(0, NETWORK_ERROR_MESSAGE).with_code(if timed_out { "timeout" } else { "network" })
    }

    pub fn session_expired() -> Self {
        Self::new(401, SESSION_EXPIRED_MESSAGE).with_code("session_expired")
    }

    /// The refresh leader went away before it settled.
    pub fn refresh_interrupted() -> Self {
        Self::new(401, "Session refresh was interrupted. Please retry.").with_code("refresh_interrupted")
    }

    pub fn not_admin() -> Self {
        Self::new(403, NOT_ADMIN_MESSAGE).with_code("not_admin")
    }

    pub fn local(message: impl Into<String>) -> Self {
        Self::new(0, message).with_code(CODE_LOCAL)
    }

    /// A 2xx body that does not decode into the expected type.
    pub fn invalid_response(detail: impl std::fmt::Display) -> Self {
        Self::new(0, format!("Unexpected response from server: {detail}"))
            .with_code(CODE_INVALID_RESPONSE)
    }

    pub fn kind(&self) -> ErrorKind {
        if matches!(self.code.as_deref(), Some(CODE_LOCAL | CODE_INVALID_RESPONSE)) {
            return ErrorKind::Local;
        }
        match self.status {
            0 => ErrorKind::Transport,
            400 => ErrorKind::Validation,
            401 => ErrorKind::Auth,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            429 => ErrorKind::RateLimit,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Client,
        }
    }

    /// A 403 whose message says the account lacks admin rights.
    pub fn denies_admin_access(&self) -> bool {
        self.status == 403 && self.message.to_lowercase().contains("admin")
    }

    /// Field error for one input, if the server reported one.
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors
            .as_ref()
            .and_then(|errors| errors.get(field))
            .map(String::as_str)
    }
}

/// Fallback text when the server gave no message.
pub fn generic_message(status: u16) -> &'static str {
    match status {
        0 => NETWORK_ERROR_MESSAGE,
        400 => "The request was invalid.",
        401 => "Authentication required.",
        403 => "Access denied.",
        404 => "The requested resource was not found.",
        429 => "Too many requests. Please try again later.",
        500..=599 => "Server error. Please try again later.",
        _ => "Request failed.",
    }
}
