//! Core data types for restcycle.
//!
//! This module defines the data structures used for:
//! - Cycle state and state snapshots
//! - Cycle configuration with clamping of partial updates
//! - Transition notices handed to the notification sink
//! - IPC request/response serialization

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// CycleState
// ============================================================================

/// Represents the current state of the work/rest cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    /// Waiting for the first activity
    Idle,
    /// Counting work time
    Working,
    /// Work interrupted by inactivity
    WorkPaused,
    /// Work target reached, waiting for the user to step away
    WaitingForRest,
    /// Counting rest time
    Resting,
}

impl CycleState {
    /// All states, in cycle order.
    pub const ALL: [CycleState; 5] = [
        CycleState::Idle,
        CycleState::Working,
        CycleState::WorkPaused,
        CycleState::WaitingForRest,
        CycleState::Resting,
    ];

    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleState::Idle => "idle",
            CycleState::Working => "working",
            CycleState::WorkPaused => "work_paused",
            CycleState::WaitingForRest => "waiting_for_rest",
            CycleState::Resting => "resting",
        }
    }

    /// Returns true if the work counter is meaningful in this state.
    pub fn tracks_work(&self) -> bool {
        matches!(self, CycleState::Working | CycleState::WorkPaused)
    }
}

impl Default for CycleState {
    fn default() -> Self {
        CycleState::Idle
    }
}

impl std::fmt::Display for CycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CycleConfig
// ============================================================================

/// Lowest accepted value for any configured duration, in minutes.
pub const MIN_MINUTES: u32 = 1;

fn default_work_minutes() -> u32 {
    25
}

fn default_rest_minutes() -> u32 {
    5
}

fn default_auto_rest_minutes() -> u32 {
    5
}

fn default_rest_message() -> String {
    "25 minutes have passed. Get up and rest your eyes.".to_string()
}

fn default_resume_message() -> String {
    "Rest is over. You can get back to work.".to_string()
}

/// Configuration for the work/rest cycle.
///
/// Durations are whole minutes. Missing fields fall back to their defaults
/// when deserializing, so an empty JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Work duration in minutes
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    /// Rest duration in minutes
    #[serde(default = "default_rest_minutes")]
    pub rest_minutes: u32,
    /// Continuous inactivity during a work pause that counts as a rest, in minutes
    #[serde(default = "default_auto_rest_minutes")]
    pub auto_rest_minutes: u32,
    /// Message shown when it is time to rest
    #[serde(default = "default_rest_message")]
    pub rest_message: String,
    /// Message shown when the rest is over
    #[serde(default = "default_resume_message")]
    pub resume_message: String,
    /// Directory holding custom notification sounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sounds_dir: Option<PathBuf>,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            rest_minutes: default_rest_minutes(),
            auto_rest_minutes: default_auto_rest_minutes(),
            rest_message: default_rest_message(),
            resume_message: default_resume_message(),
            sounds_dir: None,
        }
    }
}

impl CycleConfig {
    /// Creates a new configuration with the specified work duration.
    pub fn with_work_minutes(mut self, minutes: u32) -> Self {
        self.work_minutes = minutes;
        self
    }

    /// Creates a new configuration with the specified rest duration.
    pub fn with_rest_minutes(mut self, minutes: u32) -> Self {
        self.rest_minutes = minutes;
        self
    }

    /// Creates a new configuration with the specified auto-rest duration.
    pub fn with_auto_rest_minutes(mut self, minutes: u32) -> Self {
        self.auto_rest_minutes = minutes;
        self
    }

    /// Returns the configuration with every duration raised to at least
    /// [`MIN_MINUTES`].
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.work_minutes = self.work_minutes.max(MIN_MINUTES);
        self.rest_minutes = self.rest_minutes.max(MIN_MINUTES);
        self.auto_rest_minutes = self.auto_rest_minutes.max(MIN_MINUTES);
        self
    }

    pub fn work_duration(&self) -> Duration {
        minutes(self.work_minutes)
    }

    pub fn rest_duration(&self) -> Duration {
        minutes(self.rest_minutes)
    }

    pub fn auto_rest_duration(&self) -> Duration {
        minutes(self.auto_rest_minutes)
    }
}

fn minutes(value: u32) -> Duration {
    Duration::from_secs(u64::from(value) * 60)
}

// ============================================================================
// ConfigUpdate
// ============================================================================

/// A partial configuration update coming from the outside world.
///
/// Durations are signed so that out-of-range input survives parsing and can
/// be clamped here instead of being rejected somewhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(rename = "workMinutes", skip_serializing_if = "Option::is_none")]
    pub work_minutes: Option<i64>,
    #[serde(rename = "restMinutes", skip_serializing_if = "Option::is_none")]
    pub rest_minutes: Option<i64>,
    #[serde(rename = "autoRestMinutes", skip_serializing_if = "Option::is_none")]
    pub auto_rest_minutes: Option<i64>,
    #[serde(rename = "restMessage", skip_serializing_if = "Option::is_none")]
    pub rest_message: Option<String>,
    #[serde(rename = "resumeMessage", skip_serializing_if = "Option::is_none")]
    pub resume_message: Option<String>,
}

impl ConfigUpdate {
    /// Returns true if the update does not touch any field.
    pub fn is_empty(&self) -> bool {
        self.work_minutes.is_none()
            && self.rest_minutes.is_none()
            && self.auto_rest_minutes.is_none()
            && self.rest_message.is_none()
            && self.resume_message.is_none()
    }

    /// Applies the update on top of `base`, clamping durations to
    /// [`MIN_MINUTES`].
    pub fn apply_to(&self, base: &CycleConfig) -> CycleConfig {
        let mut config = base.clone();

        if let Some(work) = self.work_minutes {
            config.work_minutes = clamp_minutes(work);
        }
        if let Some(rest) = self.rest_minutes {
            config.rest_minutes = clamp_minutes(rest);
        }
        if let Some(auto_rest) = self.auto_rest_minutes {
            config.auto_rest_minutes = clamp_minutes(auto_rest);
        }
        if let Some(message) = &self.rest_message {
            config.rest_message = message.clone();
        }
        if let Some(message) = &self.resume_message {
            config.resume_message = message.clone();
        }

        config.clamped()
    }
}

fn clamp_minutes(value: i64) -> u32 {
    u32::try_from(value.max(i64::from(MIN_MINUTES))).unwrap_or(u32::MAX)
}

// ============================================================================
// StateSnapshot
// ============================================================================

/// Immutable point-in-time copy of the coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Current cycle state
    pub state: CycleState,
    /// Accumulated work time in the current segment
    #[serde(rename = "workElapsed", with = "duration_secs")]
    pub work_elapsed: Duration,
    /// Configured work duration
    #[serde(rename = "workTotal", with = "duration_secs")]
    pub work_total: Duration,
    /// Accumulated rest time
    #[serde(rename = "restElapsed", with = "duration_secs")]
    pub rest_elapsed: Duration,
    /// Configured rest duration
    #[serde(rename = "restTotal", with = "duration_secs")]
    pub rest_total: Duration,
}

impl StateSnapshot {
    /// Work time left before the rest prompt.
    pub fn work_remaining(&self) -> Duration {
        self.work_total.saturating_sub(self.work_elapsed)
    }

    /// Rest time left before the resume prompt.
    pub fn rest_remaining(&self) -> Duration {
        self.rest_total.saturating_sub(self.rest_elapsed)
    }
}

/// (De)serializes a `Duration` as fractional seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Message used for automatic rests; not configurable.
pub const AUTO_REST_MESSAGE: &str = "You have been away for a while. Starting an automatic rest.";

/// Kind of phase-transition notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Work target reached
    Rest,
    /// Rest target reached
    Resume,
    /// Long inactivity during a work pause turned into a rest
    AutoRest,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Rest => "rest",
            NotificationKind::Resume => "resume",
            NotificationKind::AutoRest => "auto_rest",
        }
    }

    /// Returns the notification title for this kind.
    pub fn title(&self) -> &'static str {
        match self {
            NotificationKind::Rest => "Time to rest!",
            NotificationKind::Resume => "Rest is over!",
            NotificationKind::AutoRest => "Automatic rest",
        }
    }
}

/// A notification request emitted by the coordinator on a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionNotice {
    /// Request ID, used to correlate coordinator and sink logs
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl TransitionNotice {
    /// Creates a notice with the default title for `kind`.
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: kind.title().to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum IpcRequest {
    /// Query the current snapshot
    Status,
    /// Query the active configuration
    GetConfig,
    /// Update the configuration and restart the cycle
    SetConfig {
        #[serde(flatten)]
        update: ConfigUpdate,
    },
    /// Report one raw input event to the activity monitor
    Input,
    /// Stop the daemon
    Shutdown,
}

impl IpcRequest {
    /// Returns true if sending the request twice has the same effect as
    /// sending it once.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, IpcRequest::Status | IpcRequest::GetConfig)
    }
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<StateSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<CycleConfig>,
}

impl ResponseData {
    pub fn from_snapshot(snapshot: StateSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            config: None,
        }
    }

    pub fn from_config(config: CycleConfig) -> Self {
        Self {
            snapshot: None,
            config: Some(config),
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
