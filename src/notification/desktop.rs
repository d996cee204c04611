//! Desktop notifier: a `notify-rust` popup plus a sound.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify_rust::{Notification, Timeout};
use tracing::{debug, warn};

use super::error::NotificationError;
use super::NotificationSink;
use crate::sound::{SoundPlayer, SoundSource};
use crate::types::TransitionNotice;

/// Application name shown by the notification service.
pub const APP_NAME: &str = "restcycle";

/// How long the popup stays on screen.
pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Shows the popup for a notice.
pub type PopupFn = dyn Fn(&TransitionNotice) -> Result<(), NotificationError> + Send + Sync;

/// Shows a desktop popup for the notice, then plays its sound.
///
/// Sound playback blocks until the clip ends, so the popup goes first.
pub struct DesktopNotifier {
    player: Arc<dyn SoundPlayer>,
    sounds_dir: Option<PathBuf>,
    popup: Box<PopupFn>,
}

impl DesktopNotifier {
    pub fn new(player: Arc<dyn SoundPlayer>, sounds_dir: Option<PathBuf>) -> Self {
        Self {
            player,
            sounds_dir,
            popup: Box::new(show_popup),
        }
    }

    /// Replaces the `notify-rust` popup.
    pub fn with_popup<F>(mut self, popup: F) -> Self
    where
        F: Fn(&TransitionNotice) -> Result<(), NotificationError> + Send + Sync + 'static,
    {
        self.popup = Box::new(popup);
        self
    }

    /// Plays the kind-specific sound. Failures are logged only.
    fn play_sound(&self, notice: &TransitionNotice) {
        let source = SoundSource::for_kind(notice.kind, self.sounds_dir.as_deref());
        if let Err(e) = self.player.play(&source) {
            warn!(
                request_id = %notice.id,
                "Failed to play {}: {} ({})",
                source.name(),
                e,
                e.suggestion()
            );
        }
    }
}

impl NotificationSink for DesktopNotifier {
    fn notify(&self, notice: &TransitionNotice) -> Result<(), NotificationError> {
        let shown = (self.popup)(notice);
        self.play_sound(notice);
        shown
    }
}

impl std::fmt::Debug for DesktopNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopNotifier")
            .field("sound_disabled", &self.player.is_disabled())
            .field("sounds_dir", &self.sounds_dir)
            .finish()
    }
}

fn show_popup(notice: &TransitionNotice) -> Result<(), NotificationError> {
    let timeout_ms = u32::try_from(NOTIFICATION_TIMEOUT.as_millis()).unwrap_or(u32::MAX);

    Notification::new()
        .summary(&notice.title)
        .body(&notice.message)
        .appname(APP_NAME)
        .timeout(Timeout::Milliseconds(timeout_ms))
        .show()
        .map_err(|e| classify(e.to_string()))?;

    debug!(request_id = %notice.id, "Desktop notification shown");
    Ok(())
}

/// Maps a notify-rust error message to our error type.
fn classify(message: String) -> NotificationError {
    let lower = message.to_lowercase();
    if lower.contains("dbus") || lower.contains("d-bus") {
        NotificationError::NotAvailable(message)
    } else {
        NotificationError::SendFailed(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::MockSoundPlayer;
    use crate::types::NotificationKind;

    #[test]
    fn test_plays_kind_sound_even_without_desktop() {
        let player = Arc::new(MockSoundPlayer::new());
        let notifier = DesktopNotifier::new(player.clone(), None);

        // The popup may fail in a headless environment
        let _ = notifier.notify(&TransitionNotice::new(NotificationKind::AutoRest, "away"));

        let calls = player.get_play_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], SoundSource::tone(NotificationKind::AutoRest));
    }

    #[test]
    fn test_uses_sound_file_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("worktime.wav"), b"RIFF").unwrap();

        let player = Arc::new(MockSoundPlayer::new());
        let notifier = DesktopNotifier::new(player.clone(), Some(dir.path().to_path_buf()));
        let _ = notifier.notify(&TransitionNotice::new(NotificationKind::Resume, "back"));

        let calls = player.get_play_calls();
        assert_eq!(
            calls[0],
            SoundSource::file(NotificationKind::Resume, dir.path().join("worktime.wav"))
        );
    }

    #[test]
    fn test_sound_failure_is_not_reported() {
        let player = Arc::new(MockSoundPlayer::new());
        player.set_should_fail(true);
        let notifier = DesktopNotifier::new(player, None).with_popup(|_| Ok(()));

        // Only the popup result is reported
        let result = notifier.notify(&TransitionNotice::new(NotificationKind::Rest, "rest"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_popup_is_shown_before_sound() {
        let player = Arc::new(MockSoundPlayer::new());
        let seen = Arc::new(std::sync::Mutex::new(None));

        let notifier = {
            let player = player.clone();
            let seen = Arc::clone(&seen);
            DesktopNotifier::new(player.clone(), None).with_popup(move |_| {
                *seen.lock().unwrap() = Some(player.play_count());
                Ok(())
            })
        };

        notifier
            .notify(&TransitionNotice::new(NotificationKind::Rest, "rest"))
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), Some(0));
        assert_eq!(player.play_count(), 1);
    }

    #[test]
    fn test_popup_failure_still_plays_sound() {
        let player = Arc::new(MockSoundPlayer::new());
        let notifier = DesktopNotifier::new(player.clone(), None).with_popup(|_| {
            Err(NotificationError::NotAvailable("no session bus".to_string()))
        });

        let result = notifier.notify(&TransitionNotice::new(NotificationKind::Resume, "back"));

        assert!(matches!(result, Err(NotificationError::NotAvailable(_))));
        assert_eq!(
            player.get_play_calls(),
            vec![SoundSource::tone(NotificationKind::Resume)]
        );
    }

    #[test]
    fn test_classify() {
        assert!(classify("org.freedesktop.DBus.Error.ServiceUnknown".to_string())
            .is_service_error());
        assert!(!classify("timed out".to_string()).is_service_error());
    }

    #[test]
    fn test_debug_impl() {
        let notifier = DesktopNotifier::new(Arc::new(MockSoundPlayer::new()), None);
        let debug_str = format!("{:?}", notifier);
        assert!(debug_str.contains("DesktopNotifier"));
        assert!(debug_str.contains("sound_disabled: false"));
    }
}
