//! Sound player implementation using rodio.
//!
//! The output stream is opened per playback and the call blocks until the
//! clip has finished, so `play` belongs on a blocking thread.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use rodio::source::SineWave;
use rodio::{Decoder, OutputStream, Sink, Source};
use tracing::{debug, warn};

use super::error::SoundError;
use super::source::{tone_frequency, SoundSource, TONE_DURATION};
use crate::types::NotificationKind;

/// Volume of the generated tone.
const TONE_AMPLITUDE: f32 = 0.25;

/// A sound player that uses rodio for audio playback.
pub struct RodioSoundPlayer {
    /// Whether sound playback is disabled.
    disabled: AtomicBool,
}

impl RodioSoundPlayer {
    /// Creates a new sound player.
    ///
    /// No audio device is touched until the first playback.
    #[must_use]
    pub fn new(disabled: bool) -> Self {
        Self {
            disabled: AtomicBool::new(disabled),
        }
    }

    /// Plays a sound from the given source and waits until it ends.
    ///
    /// A file that cannot be opened or decoded is replaced by the tone for
    /// the same kind.
    ///
    /// # Errors
    ///
    /// Returns an error if no audio output is available or the fallback
    /// tone fails too.
    pub fn play(&self, source: &SoundSource) -> Result<(), SoundError> {
        if self.is_disabled() {
            debug!("Sound playback disabled, skipping");
            return Ok(());
        }

        match source {
            SoundSource::File { kind, path } => {
                debug!("Playing sound file: {}", source.name());
                match play_file(path) {
                    Ok(()) => Ok(()),
                    Err(e) if e.should_fallback_to_tone() => {
                        warn!(
                            "Failed to play sound '{}': {}, falling back to tone",
                            source.name(),
                            e
                        );
                        play_tone(*kind)
                    }
                    Err(e) => Err(e),
                }
            }
            SoundSource::Tone { kind } => {
                debug!("Playing {}", source.name());
                play_tone(*kind)
            }
        }
    }

    /// Returns true if sound playback is currently disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    /// Enables sound playback.
    pub fn enable(&self) {
        self.disabled.store(false, Ordering::Relaxed);
        debug!("Sound playback enabled");
    }

    /// Disables sound playback.
    pub fn disable(&self) {
        self.disabled.store(true, Ordering::Relaxed);
        debug!("Sound playback disabled");
    }
}

impl Default for RodioSoundPlayer {
    fn default() -> Self {
        Self::new(false)
    }
}

impl std::fmt::Debug for RodioSoundPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioSoundPlayer")
            .field("disabled", &self.is_disabled())
            .finish()
    }
}

/// Opens the default output. The stream must outlive the sink.
fn open_output() -> Result<(OutputStream, Sink), SoundError> {
    let (stream, handle) =
        OutputStream::try_default().map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;
    let sink = Sink::try_new(&handle).map_err(|e| SoundError::StreamError(e.to_string()))?;
    Ok((stream, sink))
}

fn play_file(path: &Path) -> Result<(), SoundError> {
    let file = File::open(path)
        .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    let decoder =
        Decoder::new(BufReader::new(file)).map_err(|e| SoundError::DecodeError(e.to_string()))?;

    let (_stream, sink) = open_output()?;
    sink.append(decoder);
    sink.sleep_until_end();
    Ok(())
}

fn play_tone(kind: NotificationKind) -> Result<(), SoundError> {
    let tone = SineWave::new(tone_frequency(kind))
        .take_duration(TONE_DURATION)
        .amplify(TONE_AMPLITUDE);

    let (_stream, sink) = open_output()?;
    sink.append(tone);
    sink.sleep_until_end();
    Ok(())
}
