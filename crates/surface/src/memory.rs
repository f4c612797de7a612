//! Recording surface for tests and headless callers.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{Notification, Severity, Surface};

/// Keeps every notification and counts login redirects.
#[derive(Debug, Default)]
pub struct MemorySurface {
    notifications: Mutex<Vec<Notification>>,
    redirects: AtomicUsize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all notifications in the order they were raised.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    /// Messages with the given severity.
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|n| n.severity == severity)
            .map(|n| n.message)
            .collect()
    }

    /// How many times the login screen was forced.
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Surface for MemorySurface {
    fn id(&self) -> &str {
        "memory"
    }

    fn notify(&self, notification: Notification) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(notification);
        }
    }

    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}
