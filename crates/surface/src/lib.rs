//! UI surface abstraction for the admin console client
//!
//! The API client never renders anything itself. Everything a user would see
//! as a side effect of a request goes through a `Surface`:
//! - `notify` is the toast sink (success messages, access denied, outages)
//! - `redirect_to_login` is the forced navigation after the session is lost
//!
//! `LogSurface` writes both to tracing and is the default when no surface is
//! configured. `MemorySurface` records them for assertions.

pub mod log;
pub mod memory;

pub use log::LogSurface;
pub use memory::MemorySurface;

use serde::Serialize;

/// Toast severity, mirrors the notification styles of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A single user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Sink for presentation side effects of API calls.
///
/// Implementations must be cheap and non-blocking: they are called inline on
/// the request path, sometimes while other requests wait on a token refresh.
pub trait Surface: Send + Sync {
    /// Identifier for logging (e.g. "log", "memory", "console")
    fn id(&self) -> &str;

    /// Show a notification to the user.
    fn notify(&self, notification: Notification);

    /// Navigate to the login screen. Called after the session was cleared.
    fn redirect_to_login(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_severity() {
        assert_eq!(Notification::success("saved").severity, Severity::Success);
        assert_eq!(Notification::warning("expired").severity, Severity::Warning);
        assert_eq!(Notification::error("down").severity, Severity::Error);
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_value(Notification::error("boom")).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["message"], "boom");
    }
}
