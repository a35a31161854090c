//! User-visible notifications raised by the wizard and its collaborators.

use std::sync::Mutex;

use serde::Serialize;

/// Shown when Next is pressed with required fields missing or invalid.
pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields before proceeding.";
/// Shown when the booking request could not be delivered.
pub const SUBMISSION_FAILED_MESSAGE: &str =
    "There was an error submitting your booking. Please try again.";
/// Shown when the availability lookup failed.
pub const AVAILABILITY_FAILED_MESSAGE: &str = "Failed to check availability. Please try again.";
/// Shown when the picked date has no free slots.
pub const DATE_UNAVAILABLE_MESSAGE: &str =
    "That date is not available. Please choose another day.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Warning,
    Error,
}

/// A toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    /// Blocking notifications explain why an action did not happen.
    pub blocking: bool,
}

impl Notification {
    pub fn blocking_error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            blocking: true,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
            blocking: false,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
            blocking: false,
        }
    }
}

/// Sink for notifications; the front end decides how to show them.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Keeps every notification in memory, oldest first.
#[derive(Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all recorded notifications.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Remove and return all recorded notifications.
    pub fn drain(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|e| e.is_empty()).unwrap_or(true)
    }

    /// Whether any recorded notification carries `message`.
    pub fn contains(&self, message: &str) -> bool {
        self.snapshot().iter().any(|n| n.message == message)
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        tracing::debug!(level = ?notification.level, "{}", notification.message);
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(notification);
        }
    }
}
