//! Display utilities for the restcycle CLI.
//!
//! This module provides formatted output for:
//! - Success and error messages
//! - Cycle status
//! - Configuration

use std::time::Duration;

use crate::types::{CycleConfig, CycleState, IpcResponse, StateSnapshot};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the daemon's message for a successful command.
    pub fn show_success(response: &IpcResponse) {
        if !response.message.is_empty() {
            println!("* {}", response.message);
        }
    }

    /// Shows the current cycle status.
    pub fn show_status(response: &IpcResponse) {
        match response.data.as_ref().and_then(|data| data.snapshot) {
            Some(snapshot) => {
                println!("restcycle status");
                println!("─────────────────────────────");
                println!("{}", Self::status_line(&snapshot));
            }
            None => println!("The daemon did not report a status"),
        }
    }

    /// Shows the active configuration.
    pub fn show_config(response: &IpcResponse) {
        let Some(config) = response.data.as_ref().and_then(|data| data.config.as_ref()) else {
            println!("The daemon did not report a configuration");
            return;
        };

        for line in Self::config_lines(config) {
            println!("{}", line);
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// One-line summary of a snapshot, e.g. `Working  work 03:20 / 25:00`.
    pub fn status_line(snapshot: &StateSnapshot) -> String {
        let label = Self::state_label(snapshot.state);
        let work = format!(
            "work {} / {}",
            Self::format_time(snapshot.work_elapsed),
            Self::format_time(snapshot.work_total)
        );
        let rest = format!(
            "rest {} / {}",
            Self::format_time(snapshot.rest_elapsed),
            Self::format_time(snapshot.rest_total)
        );

        match snapshot.state {
            CycleState::Idle => format!("{:<16} {}", label, "waiting for activity"),
            CycleState::Working | CycleState::WorkPaused => format!("{:<16} {}", label, work),
            CycleState::WaitingForRest => format!("{:<16} {} (step away to rest)", label, work),
            CycleState::Resting => format!("{:<16} {}", label, rest),
        }
    }

    fn config_lines(config: &CycleConfig) -> Vec<String> {
        let mut lines = vec![
            format!("work:           {} min", config.work_minutes),
            format!("rest:           {} min", config.rest_minutes),
            format!("auto rest:      {} min", config.auto_rest_minutes),
            format!("rest message:   {}", config.rest_message),
            format!("resume message: {}", config.resume_message),
        ];
        if let Some(dir) = &config.sounds_dir {
            lines.push(format!("sounds dir:     {}", dir.display()));
        }
        lines
    }

    fn state_label(state: CycleState) -> &'static str {
        match state {
            CycleState::Idle => "Idle",
            CycleState::Working => "Working",
            CycleState::WorkPaused => "Paused",
            CycleState::WaitingForRest => "Time to rest",
            CycleState::Resting => "Resting",
        }
    }

    /// Formats a duration as `mm:ss`, dropping fractions of a second.
    fn format_time(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
    }
}

// ============================================================================
// Tests
// ============================================================================
