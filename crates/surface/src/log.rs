//! Tracing-backed surface, used when the caller wires no UI.

use tracing::{info, warn};

use crate::{Notification, Severity, Surface};

/// Emits notifications and login redirects as log events.
#[derive(Debug, Default, Clone)]
pub struct LogSurface;

impl LogSurface {
    pub fn new() -> Self {
        Self
    }
}

impl Surface for LogSurface {
    fn id(&self) -> &str {
        "log"
    }

    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Success | Severity::Info => {
                info!(severity = notification.severity.label(), message = %notification.message, "notification");
            }
            Severity::Warning | Severity::Error => {
                warn!(severity = notification.severity.label(), message = %notification.message, "notification");
            }
        }
    }

    fn redirect_to_login(&self) {
        warn!("session ended, login required");
    }
}
