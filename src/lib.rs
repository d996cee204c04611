//! restcycle library
//!
//! This library provides the core functionality for the restcycle daemon and
//! CLI. It includes:
//! - Activity detection turning raw input into active/inactive edges
//! - The work/rest cycle coordinator and its tick loop
//! - IPC server/client for daemon-CLI communication
//! - Desktop notifications with sound
//! - Persistent configuration
//! - Type definitions for configuration and state

pub mod activity;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod notification;
pub mod sound;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    ConfigUpdate, CycleConfig, CycleState, IpcRequest, IpcResponse, NotificationKind,
    ResponseData, StateSnapshot, TransitionNotice,
};

// Re-export activity types
pub use activity::{ActivityEdge, ActivityMonitor, EdgeDetector, EdgeHandler, InputReporter};

// Re-export daemon types
pub use daemon::{CycleCoordinator, Daemon, DaemonOptions, TickLoop};

// Re-export config types
pub use config::{ConfigError, ConfigStore};

// Re-export notification types
pub use notification::{
    DesktopNotifier, MockNotificationSink, NotificationError, NotificationSink,
};

// Re-export sound types
pub use sound::{MockSoundPlayer, RodioSoundPlayer, SoundError, SoundPlayer, SoundSource};
