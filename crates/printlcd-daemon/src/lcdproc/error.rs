//! Error types for LCDproc client operations

use thiserror::Error;

/// Errors that can occur when talking to LCDd
#[derive(Debug, Error)]
pub enum LcdError {
    /// Failed to open the TCP connection to LCDd
    #[error("Failed to connect to LCDd at {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// LCDd did not accept the connection in time
    #[error("Timed out connecting to LCDd at {host}:{port} after {timeout_ms}ms")]
    ConnectTimeout { host: String, port: u16, timeout_ms: u64 },

    /// Failed to send a command to LCDd
    #[error("Failed to send command to LCDd: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Failed to receive a reply from LCDd
    #[error("Failed to receive reply from LCDd: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// LCDd closed the connection
    #[error("Connection to LCDd closed unexpectedly")]
    ConnectionClosed,

    /// The connection was already closed or failed earlier
    #[error("Not connected to LCDd")]
    NotConnected,

    /// The handshake reply lacks a field the session cannot work without
    #[error("LCDd handshake reply is missing `{field}`: {reply:?}")]
    MissingCapability { field: &'static str, reply: String },

    /// LCDd answered with something other than what the command expects
    #[error("Unexpected reply from LCDd: {reply:?}")]
    UnexpectedReply { reply: String },

    /// LCDd rejected a command (`huh? ...`)
    #[error("LCDd rejected `{command}`: {message}")]
    Rejected { command: String, message: String },

    /// A screen with this id is already registered on the session
    #[error("Screen `{screen}` already exists")]
    DuplicateScreen { screen: String },

    /// A widget with this id is already registered on the screen
    #[error("Widget `{widget}` already exists on screen `{screen}`")]
    DuplicateWidget { screen: String, widget: String },

    #[error("Screen `{screen}` does not exist")]
    UnknownScreen { screen: String },

    #[error("Widget `{widget}` does not exist on screen `{screen}`")]
    UnknownWidget { screen: String, widget: String },

    /// The widget exists but is of a different kind than requested
    #[error("Widget `{widget}` is a {actual} widget, not {expected}")]
    WidgetKindMismatch {
        widget: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl LcdError {
    /// Whether this error means the transport is gone and the session
    /// must be rebuilt
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::SendFailed(_) | Self::ReceiveFailed(_) | Self::ConnectionClosed | Self::NotConnected
        )
    }
}
