//! Transient user notifications
//!
//! Backend failures never reach the form as errors; they are reported here as
//! toasts carrying the server's message, or a generic fallback when the
//! server sent none.

use parking_lot::Mutex;
use rca_remote::RemoteError;
use std::fmt::Debug;

/// Message shown when the server gave no usable explanation
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Toast shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    /// Error toast for a failed backend call
    #[must_use]
    pub fn from_remote(err: &RemoteError) -> Self {
        Self::error(err.server_message().unwrap_or(GENERIC_FAILURE))
    }
}

/// Sink for notifications
pub trait Notifier: Send + Sync + Debug {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error | NotificationLevel::Warning => {
                tracing::warn!(level = ?notification.level, "{}", notification.message);
            }
            NotificationLevel::Success | NotificationLevel::Info => {
                tracing::info!(level = ?notification.level, "{}", notification.message);
            }
        }
    }
}

/// Keeps notifications until a UI drains them
#[derive(Debug, Default)]
pub struct QueuedNotifier {
    queue: Mutex<Vec<Notification>>,
}

impl QueuedNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued notification, oldest first
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.queue.lock())
    }

    /// Copy of the queue
    #[must_use]
    pub fn snapshot(&self) -> Vec<Notification> {
        self.queue.lock().clone()
    }
}

impl Notifier for QueuedNotifier {
    fn notify(&self, notification: Notification) {
        self.queue.lock().push(notification);
    }
}
