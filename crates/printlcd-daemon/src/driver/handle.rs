//! Messages accepted by the state driver and the handle used to send them

use printlcd_config::{DisplayConfig, Priority};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::state::ScreenState;

/// Print job lifecycle notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintEvent {
    Started { name: String },
    Done { name: Option<String> },
    Cancelled { name: Option<String> },
    Failed { name: Option<String> },
}

impl PrintEvent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Done { .. } => "done",
            Self::Cancelled { .. } => "cancelled",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Everything the driver reacts to, consumed one at a time
#[derive(Debug)]
pub enum DriverMessage {
    Print(PrintEvent),
    /// Job progress in percent
    Progress(u8),
    /// Periodic refresh while printing, tagged with the timer that sent it
    RefreshTick { generation: u64 },
    /// The idle timeout ran out, tagged with the timer that sent it
    IdleTimeout { generation: u64 },
    Reconfigure(DisplayConfig),
    Status(oneshot::Sender<DriverStatus>),
    Shutdown,
}

/// Snapshot of the driver's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverStatus {
    pub state: ScreenState,
    pub priority: Priority,
    pub filename: Option<String>,
    pub percent: Option<u8>,
    /// ETA as shown on the display
    pub eta: String,
    /// Finish time as shown on the display
    pub finish: String,
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u16>,
    /// Connection attempts to LCDd since the driver started
    #[serde(default)]
    pub connect_attempts: u64,
}

/// The driver task has exited
#[derive(Debug, Error)]
#[error("State driver is not running")]
pub struct DriverStopped;

/// Cloneable sender side of a running [`StateDriver`](super::StateDriver)
///
/// The driver stops once every handle is dropped or [`shutdown`](Self::shutdown)
/// is called.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    pub(super) sender: mpsc::Sender<DriverMessage>,
}

impl DriverHandle {
    pub async fn send(&self, message: DriverMessage) -> Result<(), DriverStopped> {
        self.sender.send(message).await.map_err(|_| DriverStopped)
    }

    pub async fn print_event(&self, event: PrintEvent) -> Result<(), DriverStopped> {
        self.send(DriverMessage::Print(event)).await
    }

    pub async fn progress(&self, percent: u8) -> Result<(), DriverStopped> {
        self.send(DriverMessage::Progress(percent)).await
    }

    pub async fn reconfigure(&self, settings: DisplayConfig) -> Result<(), DriverStopped> {
        self.send(DriverMessage::Reconfigure(settings)).await
    }

    /// Query the driver's state
    ///
    /// Answered after every message sent before it has been handled.
    pub async fn status(&self) -> Result<DriverStatus, DriverStopped> {
        let (reply, response) = oneshot::channel();
        self.send(DriverMessage::Status(reply)).await?;
        response.await.map_err(|_| DriverStopped)
    }

    pub async fn shutdown(&self) -> Result<(), DriverStopped> {
        self.send(DriverMessage::Shutdown).await
    }
}
