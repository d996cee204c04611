//! IPC server for the restcycle daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket, one request per connection
//! - Request handling against the cycle coordinator
//! - The configuration update path with its post-update grace check

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

use crate::activity::{ActivityStatus, InputReporter};
use crate::config::ConfigStore;
use crate::types::{ConfigUpdate, IpcRequest, IpcResponse, ResponseData};

use super::coordinator::CycleCoordinator;
use super::shutdown::ShutdownSignal;

// ============================================================================
// Constants
// ============================================================================

/// Socket directory under the home directory
const SOCKET_DIR: &str = ".restcycle";

/// Socket file name
const SOCKET_FILE_NAME: &str = "restcycle.sock";

/// Maximum request size in bytes (4KB)
pub const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

/// Returns the default socket path (`~/.restcycle/restcycle.sock`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_socket_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine the home directory")?;
    Ok(home.join(SOCKET_DIR).join(SOCKET_FILE_NAME))
}

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Client closed the connection without sending anything
    #[error("Connection closed by client")]
    ConnectionClosed,

    /// Malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// A leftover socket file is removed before binding, unless a daemon is
    /// still accepting connections on it.
    ///
    /// # Errors
    ///
    /// Returns an error if another daemon owns the socket or it cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            if std::os::unix::net::UnixStream::connect(socket_path).is_ok() {
                anyhow::bail!("A daemon is already running on {}", socket_path.display());
            }
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Reads until the client shuts down its write side, with a read timeout
    /// and a size limit.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest, IpcError> {
        let mut buffer = Vec::with_capacity(512);
        let limit = (MAX_REQUEST_SIZE + 1) as u64;

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            (&mut *stream).take(limit).read_to_end(&mut buffer),
        )
        .await;

        match read_result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string())),
            Err(_) => return Err(IpcError::Timeout),
        }

        if buffer.is_empty() {
            return Err(IpcError::ConnectionClosed);
        }
        if buffer.len() > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge);
        }

        serde_json::from_slice(&buffer).map_err(|e| IpcError::InvalidRequest(e.to_string()))
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;
        stream
            .shutdown()
            .await
            .context("Failed to close response stream")?;

        Ok(())
    }

    /// Accepts connections until `shutdown` is triggered.
    ///
    /// Each connection is handled on its own task.
    pub async fn serve(&self, handler: Arc<RequestHandler>, shutdown: ShutdownSignal) {
        info!(socket = %self.socket_path.display(), "IPC server listening");

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                accepted = self.accept() => match accepted {
                    Ok(stream) => {
                        let handler = Arc::clone(&handler);
                        tokio::spawn(async move { handle_connection(stream, &handler).await });
                    }
                    Err(e) => warn!("{:#}", e),
                },
            }
        }

        debug!("IPC server stopped");
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn handle_connection(mut stream: UnixStream, handler: &RequestHandler) {
    let response = match IpcServer::receive_request(&mut stream).await {
        Ok(request) => {
            debug!(?request, "IPC request");
            handler.handle(request).await
        }
        Err(e) => {
            debug!("Rejected IPC request: {}", e);
            IpcResponse::error(e.to_string())
        }
    };

    if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
        debug!("Failed to send IPC response: {:#}", e);
    }
}

// ============================================================================
// GraceCheck
// ============================================================================

/// Best-effort activity check run after a configuration update.
///
/// A config update resets the cycle to idle while the activity detector may
/// still consider the user active, in which case no new activity edge would
/// arrive. After `delay`, if the detector is still active and an input was
/// seen within `window`, the check synthesizes the missing activity edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraceCheck {
    pub delay: Duration,
    pub window: Duration,
}

impl Default for GraceCheck {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
            window: Duration::from_secs(5),
        }
    }
}

impl GraceCheck {
    /// Returns true if `last_input` falls inside the window ending at `now`.
    pub fn is_recent(&self, last_input: Option<Instant>, now: Instant) -> bool {
        last_input.is_some_and(|at| now.saturating_duration_since(at) < self.window)
    }

    /// Returns true if the detector is active and has seen input recently.
    ///
    /// An inactive detector will raise a real activity edge on the next
    /// input, so it needs no help.
    pub fn should_resume(&self, input: &dyn ActivityStatus, now: Instant) -> bool {
        input.is_active() && self.is_recent(input.last_input(), now)
    }

    /// Waits for the delay, then synthesizes an activity edge if the user is
    /// still active.
    pub async fn run(self, coordinator: CycleCoordinator, input: Arc<dyn ActivityStatus>) {
        sleep(self.delay).await;

        if self.should_resume(input.as_ref(), Instant::now()) {
            debug!("Recent input after config update, resuming work");
            coordinator.on_activity_edge();
        }
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the coordinator.
pub struct RequestHandler {
    coordinator: CycleCoordinator,
    store: ConfigStore,
    reporter: InputReporter,
    input: Arc<dyn ActivityStatus>,
    shutdown: ShutdownSignal,
    grace: GraceCheck,
    // Held across merge and save so the file matches the applied config
    config_write: Mutex<()>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(
        coordinator: CycleCoordinator,
        store: ConfigStore,
        reporter: InputReporter,
        input: Arc<dyn ActivityStatus>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            coordinator,
            store,
            reporter,
            input,
            shutdown,
            grace: GraceCheck::default(),
            config_write: Mutex::new(()),
        }
    }

    /// Overrides the grace check timing.
    pub fn with_grace_check(mut self, grace: GraceCheck) -> Self {
        self.grace = grace;
        self
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Status => self.handle_status(),
            IpcRequest::GetConfig => self.handle_get_config(),
            IpcRequest::SetConfig { update } => self.handle_set_config(update),
            IpcRequest::Input => self.handle_input(),
            IpcRequest::Shutdown => self.handle_shutdown(),
        }
    }

    /// Handles the status command.
    fn handle_status(&self) -> IpcResponse {
        IpcResponse::success("", Some(ResponseData::from_snapshot(self.coordinator.snapshot())))
    }

    /// Handles the get-config command.
    fn handle_get_config(&self) -> IpcResponse {
        IpcResponse::success("", Some(ResponseData::from_config(self.coordinator.config())))
    }

    /// Handles the set-config command: validate, persist, apply, grace check.
    fn handle_set_config(&self, update: ConfigUpdate) -> IpcResponse {
        if let Err(message) = validate_update(&update) {
            return IpcResponse::error(message);
        }

        let config = {
            let _write = self
                .config_write
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let config = self.coordinator.update_config(&update);

            if let Err(e) = self.store.save(&config) {
                warn!(
                    path = %self.store.path().display(),
                    "Failed to save configuration, keeping it for this session: {}",
                    e
                );
            }
            config
        };

        tokio::spawn(
            self.grace
                .run(self.coordinator.clone(), Arc::clone(&self.input)),
        );

        IpcResponse::success(
            "Configuration updated, cycle restarted",
            Some(ResponseData::from_config(config)),
        )
    }

    /// Handles the input command.
    fn handle_input(&self) -> IpcResponse {
        if self.reporter.report() {
            IpcResponse::success("Input reported", None)
        } else {
            IpcResponse::error("Activity monitor is not running")
        }
    }

    /// Handles the shutdown command.
    fn handle_shutdown(&self) -> IpcResponse {
        info!("Shutdown requested over IPC");
        self.shutdown.trigger();
        IpcResponse::success("Daemon is shutting down", None)
    }
}

/// Rejects updates that cannot be clamped into a valid configuration.
fn validate_update(update: &ConfigUpdate) -> Result<(), String> {
    let blank = |value: &Option<String>| value.as_deref().is_some_and(|s| s.trim().is_empty());

    if blank(&update.rest_message) {
        return Err("restMessage must not be empty".to_string());
    }
    if blank(&update.resume_message) {
        return Err("resumeMessage must not be empty".to_string());
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
