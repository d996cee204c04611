//! Notification system error types.

use thiserror::Error;

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The desktop notification service rejected or failed the request.
    #[error("failed to send notification: {0}")]
    SendFailed(String),

    /// No notification service is reachable (e.g., no session bus).
    #[error("notification service not available: {0}")]
    NotAvailable(String),
}

impl NotificationError {
    /// Returns true if the notification service itself is missing.
    #[must_use]
    pub fn is_service_error(&self) -> bool {
        matches!(self, Self::NotAvailable(_))
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::SendFailed(_) => "Check the desktop notification settings",
            Self::NotAvailable(_) => "Run the daemon inside a desktop session",
        }
    }
}
