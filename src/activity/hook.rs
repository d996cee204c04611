//! Global keyboard/mouse hook backed by `rdev`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rdev::{listen, Event, EventType};
use tracing::{debug, error};

use super::InputReporter;

/// Delay before restarting a failed listener.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Starts a thread that forwards every keyboard and mouse event to `reporter`.
///
/// The listener is restarted after a failure until `running` is cleared.
/// A listener that is up cannot be stopped; the thread then ends with the
/// process.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn_input_hook(
    reporter: InputReporter,
    running: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("input-hook".to_string())
        .spawn(move || {
            let mut failures: u32 = 0;
            while running.load(Ordering::SeqCst) {
                let listener_reporter = reporter.clone();
                let result = listen(move |event: Event| {
                    if is_user_input(&event.event_type) {
                        listener_reporter.report();
                    }
                });

                match result {
                    Ok(()) => break,
                    Err(e) => {
                        failures += 1;
                        if failures == 1 {
                            error!(
                                "Failed to listen for input events: {:?}. Retrying every second, \
                                 use `restcycle input` to report activity meanwhile",
                                e
                            );
                        } else {
                            debug!(failures, "Input listener failed again: {:?}", e);
                        }
                        thread::sleep(RETRY_DELAY);
                    }
                }
            }
        })
}

fn is_user_input(event_type: &EventType) -> bool {
    matches!(
        event_type,
        EventType::KeyPress(_)
            | EventType::KeyRelease(_)
            | EventType::ButtonPress(_)
            | EventType::ButtonRelease(_)
            | EventType::MouseMove { .. }
            | EventType::Wheel { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdev::{Button, Key};

    #[test]
    fn test_every_event_kind_counts_as_input() {
        assert!(is_user_input(&EventType::KeyPress(Key::KeyA)));
        assert!(is_user_input(&EventType::KeyRelease(Key::Space)));
        assert!(is_user_input(&EventType::ButtonPress(Button::Left)));
        assert!(is_user_input(&EventType::ButtonRelease(Button::Right)));
        assert!(is_user_input(&EventType::MouseMove { x: 1.0, y: 2.0 }));
        assert!(is_user_input(&EventType::Wheel {
            delta_x: 0,
            delta_y: -1
        }));
    }
}
