//! Command definitions for the restcycle CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::types::ConfigUpdate;

// ============================================================================
// CLI Structure
// ============================================================================

/// restcycle - reminds you to rest based on how long you have actually worked
#[derive(Parser, Debug)]
#[command(
    name = "restcycle",
    version,
    about = "Activity-aware work/rest reminders",
    long_about = "Counts work time only while you are using the keyboard or mouse,\n\
                  prompts you to rest once the work target is reached and tells you\n\
                  when the rest is over.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Daemon socket path (defaults to ~/.restcycle/restcycle.sock)
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the daemon in the foreground
    Run(RunArgs),

    /// Show the current cycle state
    Status {
        /// Refresh the status every second until interrupted
        #[arg(short, long)]
        watch: bool,
    },

    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Report one input event to the daemon
    Input,

    /// Stop the daemon
    Stop,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Run Command Arguments
// ============================================================================

/// Arguments for the run command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable notification sounds
    #[arg(long)]
    pub no_sound: bool,

    /// Seconds without input after which you count as away
    #[arg(
        long,
        value_name = "SECS",
        default_value = "3",
        value_parser = parse_threshold
    )]
    pub inactivity_threshold: Duration,

    /// Directory with restime.wav, worktime.wav and r-u-there.wav
    #[arg(long, value_name = "DIR")]
    pub sounds_dir: Option<PathBuf>,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            config: None,
            no_sound: false,
            inactivity_threshold: Duration::from_secs(3),
            sounds_dir: None,
        }
    }
}

// ============================================================================
// Config Command Arguments
// ============================================================================

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the active configuration
    Show,

    /// Change configuration values; the cycle restarts from idle
    Set(SetArgs),
}

/// Arguments for `config set`. Durations below 1 minute are raised to 1.
#[derive(Args, Debug, Clone, Default)]
pub struct SetArgs {
    /// Work duration in minutes
    #[arg(short, long, allow_negative_numbers = true)]
    pub work: Option<i64>,

    /// Rest duration in minutes
    #[arg(short, long, allow_negative_numbers = true)]
    pub rest: Option<i64>,

    /// Inactivity during a work pause that counts as a rest, in minutes
    #[arg(short, long, allow_negative_numbers = true)]
    pub auto_rest: Option<i64>,

    /// Message shown when it is time to rest
    #[arg(long)]
    pub rest_message: Option<String>,

    /// Message shown when the rest is over
    #[arg(long)]
    pub resume_message: Option<String>,
}

impl SetArgs {
    /// Converts the arguments into a partial update.
    pub fn to_update(&self) -> ConfigUpdate {
        ConfigUpdate {
            work_minutes: self.work,
            rest_minutes: self.rest,
            auto_rest_minutes: self.auto_rest,
            rest_message: self.rest_message.clone(),
            resume_message: self.resume_message.clone(),
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Parses the inactivity threshold in seconds.
///
/// - Must be a positive number
/// - Fractions are allowed (`0.5`)
fn parse_threshold(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", s))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err("The inactivity threshold must be greater than 0".to_string());
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

// ============================================================================
// Tests
// ============================================================================
