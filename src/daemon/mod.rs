//! Daemon module for restcycle.
//!
//! This module contains the core daemon functionality:
//! - `coordinator`: the activity-driven work/rest state machine
//! - `timer`: tick loop that advances the coordinator
//! - `ipc`: Unix socket server for the CLI
//! - `shutdown`: cooperative shutdown signal
//!
//! [`Daemon::run`] wires them together with the activity monitor and the
//! notification dispatcher.

pub mod coordinator;
pub mod ipc;
pub mod shutdown;
pub mod timer;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub use coordinator::{CoordinatorState, CycleCoordinator};
pub use ipc::{default_socket_path, GraceCheck, IpcError, IpcServer, RequestHandler};
pub use shutdown::ShutdownSignal;
pub use timer::{TickLoop, TICK_INTERVAL};

use crate::activity::{ActivityMonitor, MonitorConfig, DEFAULT_INACTIVITY_THRESHOLD};
use crate::config::ConfigStore;
use crate::notification::{spawn_dispatcher, DesktopNotifier, NotificationSink};
use crate::sound::RodioSoundPlayer;

// ============================================================================
// DaemonOptions
// ============================================================================

/// Session options for the daemon; they override the config file.
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    /// Socket to listen on
    pub socket_path: PathBuf,
    /// Config file; the platform default when `None`
    pub config_path: Option<PathBuf>,
    /// Disable sound playback
    pub no_sound: bool,
    /// Time without input after which the user counts as inactive
    pub inactivity_threshold: Duration,
    /// Directory holding custom sounds; falls back to the config value
    pub sounds_dir: Option<PathBuf>,
}

impl DaemonOptions {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            config_path: None,
            no_sound: false,
            inactivity_threshold: DEFAULT_INACTIVITY_THRESHOLD,
            sounds_dir: None,
        }
    }
}

// ============================================================================
// Daemon
// ============================================================================

/// The restcycle daemon.
pub struct Daemon {
    options: DaemonOptions,
    sink: Option<Arc<dyn NotificationSink>>,
    grace: GraceCheck,
}

impl Daemon {
    pub fn new(options: DaemonOptions) -> Self {
        Self {
            options,
            sink: None,
            grace: GraceCheck::default(),
        }
    }

    /// Replaces the desktop notifier.
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Overrides the post-config-update grace check timing.
    pub fn with_grace_check(mut self, grace: GraceCheck) -> Self {
        self.grace = grace;
        self
    }

    /// Runs until Ctrl-C or a `shutdown` request.
    ///
    /// # Errors
    ///
    /// Returns an error if the config location, the activity monitor thread
    /// or the socket cannot be set up.
    pub async fn run(self) -> Result<()> {
        let Self {
            options,
            sink,
            grace,
        } = self;

        let store = match &options.config_path {
            Some(path) => ConfigStore::new(path),
            None => ConfigStore::at_default_location()
                .context("Failed to locate the configuration file")?,
        };
        let config = store.load();
        info!(
            path = %store.path().display(),
            work_minutes = config.work_minutes,
            rest_minutes = config.rest_minutes,
            auto_rest_minutes = config.auto_rest_minutes,
            "Configuration loaded"
        );

        // Bind first so a busy or invalid socket fails before any thread starts
        let server = IpcServer::new(&options.socket_path)?;

        let sink: Arc<dyn NotificationSink> = match sink {
            Some(sink) => sink,
            None => {
                let sounds_dir = options
                    .sounds_dir
                    .clone()
                    .or_else(|| config.sounds_dir.clone());
                let player = Arc::new(RodioSoundPlayer::new(options.no_sound));
                Arc::new(DesktopNotifier::new(player, sounds_dir))
            }
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let coordinator = CycleCoordinator::new(config, event_tx);
        let _dispatcher = spawn_dispatcher(event_rx, sink);

        let shutdown = ShutdownSignal::new();
        let monitor = ActivityMonitor::spawn(
            Arc::new(coordinator.clone()),
            MonitorConfig {
                inactivity_threshold: options.inactivity_threshold,
                ..MonitorConfig::default()
            },
            shutdown.running_flag(),
        )
        .context("Failed to start the activity monitor")?;

        start_input_hook(&monitor, &shutdown);

        let handler = Arc::new(
            RequestHandler::new(
                coordinator.clone(),
                store,
                monitor.reporter(),
                Arc::new(monitor.last_input()),
                shutdown.clone(),
            )
            .with_grace_check(grace),
        );

        let tick = tokio::spawn(TickLoop::new(coordinator, shutdown.running_flag()).run());

        let interrupt = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, shutting down");
                interrupt.trigger();
            }
        });

        info!("Daemon started");
        server.serve(handler, shutdown).await;
        drop(server);

        tick.await.context("Tick loop task failed")?;
        tokio::task::spawn_blocking(move || monitor.join())
            .await
            .context("Failed to stop the activity monitor")?;

        info!("Daemon stopped");
        Ok(())
    }
}

#[cfg(feature = "input-hook")]
fn start_input_hook(monitor: &ActivityMonitor, shutdown: &ShutdownSignal) {
    match crate::activity::spawn_input_hook(monitor.reporter(), shutdown.running_flag()) {
        Ok(_) => debug!("Input hook started"),
        Err(e) => tracing::error!(
            "Failed to start the input hook: {}. Report activity with `restcycle input`",
            e
        ),
    }
}

#[cfg(not(feature = "input-hook"))]
fn start_input_hook(_monitor: &ActivityMonitor, _shutdown: &ShutdownSignal) {
    debug!("Built without the input hook, waiting for `restcycle input` reports");
}
