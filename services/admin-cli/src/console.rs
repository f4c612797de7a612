//! Terminal surface: notifications and login prompts go to stderr so stdout
//! stays clean for JSON output.

use std::io::Write;

use surface::{Notification, Severity, Surface};

#[derive(Debug, Default)]
pub struct ConsoleSurface;

impl ConsoleSurface {
    fn line(notification: &Notification) -> String {
        let marker = match notification.severity {
            Severity::Success => "✔",
            Severity::Info => "ℹ",
            Severity::Warning => "!",
            Severity::Error => "✖",
        };
        format!("{marker} {}", notification.message)
    }
}

impl Surface for ConsoleSurface {
    fn id(&self) -> &str {
        "console"
    }

    fn notify(&self, notification: Notification) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", Self::line(&notification));
    }

    fn redirect_to_login(&self) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "Session ended. Run `eduadmin login <email>` to sign in again.");
    }
}
