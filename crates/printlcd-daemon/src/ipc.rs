//! Control socket for print job events and status queries
//!
//! A Unix domain socket carrying one JSON request line per connection and
//! one JSON response line back. Print host hooks (or the `printlcd` CLI)
//! report job lifecycle and progress here; the daemon forwards them to the
//! state driver.

use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

use crate::driver::{DriverHandle, DriverStatus, PrintEvent};

// ============================================================================
// IPC Message Types
// ============================================================================

/// Requests sent to the daemon
///
/// Serialized as JSON with a `type` field for discrimination:
/// - `{"type": "print_started", "name": "benchy.gcode"}`
/// - `{"type": "print_done"}`
/// - `{"type": "progress", "percent": 42}`
/// - `{"type": "time_left", "seconds": 1800}`
/// - `{"type": "status"}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpcRequest {
    PrintStarted {
        name: String,
    },
    PrintDone {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    PrintCancelled {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    PrintFailed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// Job progress in percent
    Progress { percent: u8 },
    /// Estimated seconds until the job finishes; `null` when unknown
    TimeLeft {
        #[serde(default)]
        seconds: Option<f64>,
    },
    Status,
    /// Re-read the configuration file
    Reload,
}

/// Responses sent back by the daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpcResponse {
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Status(DriverStatus),
    Error {
        message: String,
    },
}

impl IpcResponse {
    fn ok() -> Self {
        Self::Success { message: None }
    }

    fn error(message: impl ToString) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }
}

/// Where the control socket lives
///
/// The configured path if there is one, else `$XDG_RUNTIME_DIR/printlcd.sock`,
/// else `/tmp/printlcd-$UID.sock`.
pub fn socket_path(configured: Option<&Path>) -> PathBuf {
    match configured {
        Some(path) => path.to_path_buf(),
        None => default_socket_path(std::env::var_os("XDG_RUNTIME_DIR")),
    }
}

fn default_socket_path(runtime_dir: Option<OsString>) -> PathBuf {
    match runtime_dir {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir).join("printlcd.sock"),
        _ => {
            let uid = nix::unistd::getuid();
            PathBuf::from(format!("/tmp/printlcd-{}.sock", uid))
        }
    }
}

// ============================================================================
// IPC Server
// ============================================================================

/// Listener on the control socket
///
/// The socket file is removed when the server is dropped.
pub struct IpcServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl IpcServer {
    /// Bind the control socket at `socket_path`
    ///
    /// A leftover socket file from a previous run is removed first.
    ///
    /// # Errors
    ///
    /// Returns an error if the stale file cannot be removed or the socket
    /// cannot be bound.
    pub fn bind(socket_path: PathBuf) -> Result<Self> {
        if socket_path.exists() {
            tracing::debug!(path = %socket_path.display(), "Removing stale socket file");
            std::fs::remove_file(&socket_path).with_context(|| {
                format!(
                    "Failed to remove stale socket file: {}",
                    socket_path.display()
                )
            })?;
        }

        let listener = UnixListener::bind(&socket_path).with_context(|| {
            format!("Failed to create control socket at {}", socket_path.display())
        })?;

        tracing::info!(path = %socket_path.display(), "Control socket listening");

        Ok(Self {
            listener,
            socket_path,
        })
    }

    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept control connection")?;

        tracing::debug!("Accepted control connection");

        Ok(stream)
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                tracing::warn!("Failed to remove control socket on shutdown: {}", e);
            } else {
                tracing::debug!("Removed control socket: {}", self.socket_path.display());
            }
        }
    }
}

// ============================================================================
// Request Handling
// ============================================================================

/// Serve one control connection
///
/// Reads one JSON request line, passes it to `handler` and writes the
/// response line. A line that does not parse gets an `error` response.
///
/// # Errors
///
/// Returns an error if reading from or writing to the stream fails.
pub async fn handle_ipc_connection<F, Fut>(mut stream: UnixStream, handler: F) -> Result<()>
where
    F: FnOnce(IpcRequest) -> Fut,
    Fut: Future<Output = IpcResponse>,
{
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);

    let mut line = String::new();
    let bytes_read = reader
        .read_line(&mut line)
        .await
        .context("Failed to read control request")?;

    if bytes_read == 0 {
        tracing::debug!("Control connection closed without data");
        return Ok(());
    }

    let line = line.trim();
    tracing::debug!("Received control request: {}", line);

    let response = match serde_json::from_str::<IpcRequest>(line) {
        Ok(request) => handler(request).await,
        Err(e) => {
            tracing::warn!("Failed to parse control request: {}", e);
            IpcResponse::error(format!("Invalid request: {}", e))
        }
    };

    let response_json =
        serde_json::to_string(&response).context("Failed to serialize control response")?;

    tracing::debug!("Sending control response: {}", response_json);

    writer
        .write_all(response_json.as_bytes())
        .await
        .context("Failed to write control response")?;
    writer
        .write_all(b"\n")
        .await
        .context("Failed to write newline")?;
    writer
        .flush()
        .await
        .context("Failed to flush control response")?;

    Ok(())
}

/// Maps control requests onto the state driver
#[derive(Clone)]
pub struct RequestHandler {
    driver: DriverHandle,
    remaining: Arc<RwLock<Option<u64>>>,
    config_path: PathBuf,
}

impl RequestHandler {
    /// `remaining` is the snapshot the driver polls for the time left
    pub fn new(
        driver: DriverHandle,
        remaining: Arc<RwLock<Option<u64>>>,
        config_path: PathBuf,
    ) -> Self {
        Self {
            driver,
            remaining,
            config_path,
        }
    }

    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        tracing::debug!(?request, "Handling control request");

        let result = match request {
            IpcRequest::PrintStarted { name } => {
                // Whatever was known belonged to the previous job
                self.set_remaining(None);
                self.driver.print_event(PrintEvent::Started { name }).await
            }
            IpcRequest::PrintDone { name } => {
                self.driver.print_event(PrintEvent::Done { name }).await
            }
            IpcRequest::PrintCancelled { name } => {
                self.driver.print_event(PrintEvent::Cancelled { name }).await
            }
            IpcRequest::PrintFailed { name } => {
                self.driver.print_event(PrintEvent::Failed { name }).await
            }
            IpcRequest::Progress { percent } => self.driver.progress(percent).await,
            IpcRequest::TimeLeft { seconds } => {
                self.set_remaining(remaining_from(seconds));
                Ok(())
            }
            IpcRequest::Status => {
                return match self.driver.status().await {
                    Ok(status) => IpcResponse::Status(status),
                    Err(e) => IpcResponse::error(e),
                }
            }
            IpcRequest::Reload => {
                return match self.reload().await {
                    Ok(()) => IpcResponse::Success {
                        message: Some("Configuration reloaded".to_string()),
                    },
                    Err(e) => IpcResponse::error(format!("{:#}", e)),
                }
            }
        };

        match result {
            Ok(()) => IpcResponse::ok(),
            Err(e) => IpcResponse::error(e),
        }
    }

    /// Re-read the configuration file and hand the display settings to the driver
    pub async fn reload(&self) -> Result<()> {
        tracing::info!(path = %self.config_path.display(), "Reloading configuration");

        let config = crate::load_config(&self.config_path)?;
        self.driver.reconfigure(config.display).await?;
        Ok(())
    }

    fn set_remaining(&self, seconds: Option<u64>) {
        match self.remaining.write() {
            Ok(mut guard) => *guard = seconds,
            Err(_) => tracing::warn!("Remaining time snapshot is poisoned"),
        }
    }
}

/// Negative or non-finite estimates count as unknown
fn remaining_from(seconds: Option<f64>) -> Option<u64> {
    seconds
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(|s| s as u64)
}
