//! Sound source selection.
//!
//! Each notification kind has its own sound: a WAV file from the configured
//! sounds directory when present, otherwise a short generated tone with a
//! kind-specific pitch.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::NotificationKind;

/// Length of the generated fallback tone.
pub const TONE_DURATION: Duration = Duration::from_millis(600);

/// Represents the source of a sound to be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// A sound file on disk.
    File {
        kind: NotificationKind,
        path: PathBuf,
    },
    /// A generated sine tone.
    Tone { kind: NotificationKind },
}

impl SoundSource {
    #[must_use]
    pub fn file(kind: NotificationKind, path: impl Into<PathBuf>) -> Self {
        Self::File {
            kind,
            path: path.into(),
        }
    }

    #[must_use]
    pub fn tone(kind: NotificationKind) -> Self {
        Self::Tone { kind }
    }

    /// Picks the sound for `kind`.
    ///
    /// Uses `<sounds_dir>/<file name>` if it exists, the tone otherwise.
    #[must_use]
    pub fn for_kind(kind: NotificationKind, sounds_dir: Option<&Path>) -> Self {
        match sounds_dir.map(|dir| dir.join(sound_file_name(kind))) {
            Some(path) if path.is_file() => Self::file(kind, path),
            _ => Self::tone(kind),
        }
    }

    /// Returns a display name for logs.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::File { path, .. } => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::Tone { kind } => format!("{} tone", kind.as_str()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::File { kind, .. } | Self::Tone { kind } => *kind,
        }
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    #[must_use]
    pub fn is_tone(&self) -> bool {
        matches!(self, Self::Tone { .. })
    }

    /// Returns the file path if this is a file sound.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path, .. } => Some(path),
            Self::Tone { .. } => None,
        }
    }
}

/// File name of the custom sound for `kind`.
#[must_use]
pub fn sound_file_name(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Rest => "restime.wav",
        NotificationKind::Resume => "worktime.wav",
        NotificationKind::AutoRest => "r-u-there.wav",
    }
}

/// Pitch of the generated tone for `kind`, in Hz.
#[must_use]
pub fn tone_frequency(kind: NotificationKind) -> f32 {
    match kind {
        NotificationKind::Rest => 880.0,
        NotificationKind::Resume => 660.0,
        NotificationKind::AutoRest => 440.0,
    }
}
