//! IPC client for communicating with the restcycle daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::daemon::default_socket_path;
use crate::types::{ConfigUpdate, IpcRequest, IpcResponse};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: u64 = 65536;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
#[derive(Debug, Clone)]
pub struct IpcClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl IpcClient {
    /// Creates a client for the default socket path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        Ok(Self::with_socket_path(default_socket_path()?))
    }

    /// Creates a client for a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    pub fn socket_path(&self) -> &PathBuf {
        &self.socket_path
    }

    /// Queries the current cycle snapshot.
    pub async fn status(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Status).await
    }

    /// Queries the active configuration.
    pub async fn get_config(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::GetConfig).await
    }

    /// Sends a partial configuration update. The daemon restarts the cycle.
    pub async fn set_config(&self, update: ConfigUpdate) -> Result<IpcResponse> {
        self.send(&IpcRequest::SetConfig { update }).await
    }

    /// Reports one input event to the daemon's activity monitor.
    pub async fn input(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Input).await
    }

    /// Asks the daemon to stop.
    pub async fn shutdown(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Shutdown).await
    }

    /// Sends a request and turns an error response into `Err`.
    async fn send(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let response = self.send_request_with_retry(request).await?;
        if !response.is_success() {
            anyhow::bail!("{}", response.message);
        }
        Ok(response)
    }

    /// Sends a request to the daemon with retry logic.
    ///
    /// Connection failures are always retried. Once a request has been
    /// written, only idempotent requests are sent again, since the daemon may
    /// already have acted on it. The daemon's error responses are returned as
    /// they are.
    async fn send_request_with_retry(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            let error = match self.connect().await {
                Ok(stream) => match self.exchange(stream, request).await {
                    Ok(response) => return Ok(response),
                    Err(e) if !request.is_idempotent() => return Err(e),
                    Err(e) => e,
                },
                Err(e) => e,
            };

            tracing::warn!("Request failed (attempt {}/{}): {:#}", attempt, MAX_RETRIES, error);
            last_error = Some(error);

            if attempt < MAX_RETRIES {
                let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Request was not sent")))
    }

    async fn connect(&self) -> Result<UnixStream> {
        timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("Connection timed out")?
            .with_context(|| {
                format!(
                    "Cannot connect to the daemon at {}. Start it with 'restcycle run'",
                    self.socket_path.display()
                )
            })
    }

    /// Writes one request on a connected stream and reads the response.
    async fn exchange(&self, mut stream: UnixStream, request: &IpcRequest) -> Result<IpcResponse> {
        let io_timeout = Duration::from_secs(IO_TIMEOUT_SECS);

        let request_json =
            serde_json::to_vec(request).context("Failed to serialize the request")?;

        timeout(io_timeout, stream.write_all(&request_json))
            .await
            .context("Write timed out")?
            .context("Failed to send the request")?;

        timeout(io_timeout, stream.flush())
            .await
            .context("Flush timed out")?
            .context("Failed to flush the request")?;

        // Closing the write side marks the end of the request
        stream
            .shutdown()
            .await
            .context("Failed to close the write side")?;

        let mut buffer = Vec::new();
        let mut limited = (&mut stream).take(MAX_RESPONSE_SIZE);
        timeout(io_timeout, limited.read_to_end(&mut buffer))
            .await
            .context("Read timed out")?
            .context("Failed to receive the response")?;

        if buffer.is_empty() {
            anyhow::bail!("The daemon closed the connection without responding");
        }

        serde_json::from_slice(&buffer).context("Failed to parse the response")
    }
}

// ============================================================================
// Tests
// ============================================================================
