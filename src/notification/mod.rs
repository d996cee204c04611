//! Transition notifications.
//!
//! The coordinator emits a [`TransitionNotice`] on every phase transition.
//! Notices travel over a channel to the dispatcher, which hands each one to
//! a [`NotificationSink`] on the blocking pool:
//!
//! - `DesktopNotifier`: desktop popup (`notify-rust`) plus sound
//! - `MockNotificationSink`: records notices for tests
//!
//! Delivery is fire-and-forget. Failures are logged and never reach the
//! coordinator.

mod desktop;
mod dispatcher;
pub mod error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub use self::desktop::{DesktopNotifier, APP_NAME, NOTIFICATION_TIMEOUT};
pub use self::dispatcher::spawn_dispatcher;
pub use self::error::NotificationError;

use crate::types::{NotificationKind, TransitionNotice};

/// Delivers transition notices to the user.
///
/// `notify` may block; it is always called from a blocking thread.
pub trait NotificationSink: Send + Sync {
    /// Delivers one notice.
    ///
    /// # Errors
    ///
    /// Returns an error if the notice could not be shown.
    fn notify(&self, notice: &TransitionNotice) -> Result<(), NotificationError>;
}

/// Mock sink for testing.
#[derive(Debug, Default)]
pub struct MockNotificationSink {
    notices: Mutex<Vec<TransitionNotice>>,
    should_fail: AtomicBool,
}

impl MockNotificationSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn get_notices(&self) -> Vec<TransitionNotice> {
        self.recorded().clone()
    }

    /// Returns the kinds of the recorded notices, in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.recorded().iter().map(|n| n.kind).collect()
    }

    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.recorded().len()
    }

    pub fn clear_recorded(&self) {
        self.recorded().clear();
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<TransitionNotice>> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NotificationSink for MockNotificationSink {
    fn notify(&self, notice: &TransitionNotice) -> Result<(), NotificationError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed("Mock failure".to_string()));
        }
        self.recorded().push(notice.clone());
        Ok(())
    }
}
