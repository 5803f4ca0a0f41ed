//! Line-oriented TCP transport to LCDd

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use super::{Command, LcdError};

/// Upper bound for establishing the TCP connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound for LCDd to answer a single command
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// A connection to LCDd
///
/// Every command is answered by exactly one reply line. LCDd also pushes
/// unsolicited lines (`listen`, `ignore`, `key`, `menuevent`) whenever it
/// feels like it; those are skipped while waiting for a reply.
///
/// Any I/O failure marks the connection dead. A dead connection is never
/// revived: the owner has to build a new one.
#[derive(Debug)]
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    host: String,
    port: u16,
    alive: bool,
    reply_timeout: Duration,
}

impl Connection {
    /// Open a TCP connection to LCDd at `host:port`
    ///
    /// Makes a single attempt bounded by [`DEFAULT_CONNECT_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns `LcdError::ConnectionFailed` if the socket cannot be opened.
    /// Returns `LcdError::ConnectTimeout` if LCDd does not accept in time.
    pub async fn connect(host: &str, port: u16) -> Result<Self, LcdError> {
        Self::connect_with_timeout(host, port, DEFAULT_CONNECT_TIMEOUT).await
    }

    pub async fn connect_with_timeout(
        host: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> Result<Self, LcdError> {
        let stream = match timeout(connect_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(LcdError::ConnectionFailed {
                    host: host.to_string(),
                    port,
                    source,
                })
            }
            Err(_) => {
                return Err(LcdError::ConnectTimeout {
                    host: host.to_string(),
                    port,
                    timeout_ms: connect_timeout.as_millis() as u64,
                })
            }
        };

        // Commands are tiny and latency matters more than throughput
        let _ = stream.set_nodelay(true);

        let (read_half, write_half) = stream.into_split();

        debug!(host = host, port = port, "Connected to LCDd");

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            host: host.to_string(),
            port,
            alive: true,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Locally tracked liveness; no round trip
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Send one command and wait for its reply line
    ///
    /// Returns the reply with the line terminator stripped.
    ///
    /// # Errors
    ///
    /// Returns `LcdError::NotConnected` if the connection is already dead.
    /// Returns `LcdError::SendFailed` / `ReceiveFailed` / `ConnectionClosed`
    /// on I/O failure; the connection is dead afterwards.
    /// Returns `LcdError::Rejected` if LCDd answers `huh?`; the connection
    /// stays usable.
    pub async fn request(&mut self, command: &Command) -> Result<String, LcdError> {
        if !self.alive {
            return Err(LcdError::NotConnected);
        }

        trace!(command = %command, "-> LCDd");

        if let Err(e) = self.write_line(command.as_str()).await {
            self.alive = false;
            return Err(LcdError::SendFailed(e));
        }

        let reply = match timeout(self.reply_timeout, self.read_reply()).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                self.alive = false;
                return Err(e);
            }
            Err(_) => {
                self.alive = false;
                return Err(LcdError::ReceiveFailed(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("no reply within {}ms", self.reply_timeout.as_millis()),
                )));
            }
        };

        trace!(reply = %reply, "<- LCDd");

        if let Some(message) = reply.strip_prefix("huh?") {
            return Err(LcdError::Rejected {
                command: command.to_string(),
                message: message.trim().to_string(),
            });
        }

        Ok(reply)
    }

    /// Release the socket
    ///
    /// Idempotent. `is_alive()` returns false afterwards.
    pub async fn close(&mut self) {
        if self.alive {
            self.alive = false;
            let _ = self.writer.shutdown().await;
            debug!(host = %self.host, port = self.port, "Closed LCDd connection");
        }
    }

    async fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    async fn read_reply(&mut self) -> Result<String, LcdError> {
        loop {
            let mut line = String::new();
            let bytes_read = self
                .reader
                .read_line(&mut line)
                .await
                .map_err(LcdError::ReceiveFailed)?;

            if bytes_read == 0 {
                return Err(LcdError::ConnectionClosed);
            }

            let line = line.trim_end_matches(['\r', '\n']);
            if is_unsolicited(line) {
                debug!(message = line, "LCDd notification");
                continue;
            }

            return Ok(line.to_string());
        }
    }
}

/// Lines LCDd sends on its own rather than in answer to a command
fn is_unsolicited(line: &str) -> bool {
    ["listen ", "ignore ", "key ", "menuevent "]
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcdproc::mock::MockLcdd;

    #[test]
    fn test_unsolicited_lines() {
        assert!(is_unsolicited("listen status"));
        assert!(is_unsolicited("ignore status"));
        assert!(is_unsolicited("key Enter"));
        assert!(!is_unsolicited("success"));
        assert!(!is_unsolicited("huh? Invalid command"));
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_failed() {
        // Bind then drop a listener to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = Connection::connect("127.0.0.1", port).await.unwrap_err();
        match &err {
            LcdError::ConnectionFailed { host, port: p, .. } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(*p, port);
            }
            other => panic!("Expected ConnectionFailed, got: {:?}", other),
        }
        assert!(err.to_string().contains("Failed to connect"));
    }

    #[tokio::test]
    async fn test_request_returns_reply_line() {
        let lcdd = MockLcdd::start().await;
        let mut conn = Connection::connect(lcdd.host(), lcdd.port()).await.unwrap();

        let reply = conn.request(&Command::screen_add("s1")).await.unwrap();

        assert_eq!(reply, "success");
        assert_eq!(lcdd.commands(), vec!["screen_add s1"]);
        assert!(conn.is_alive());
    }

    #[tokio::test]
    async fn test_request_skips_notifications() {
        let lcdd = MockLcdd::start().await;
        let mut conn = Connection::connect(lcdd.host(), lcdd.port()).await.unwrap();

        // The mock announces `listen` before acknowledging a foreground screen
        let reply = conn
            .request(&Command::new("screen_set").arg("s1").arg("-priority").arg("foreground"))
            .await
            .unwrap();

        assert_eq!(reply, "success");
    }

    #[tokio::test]
    async fn test_rejected_command_keeps_connection_alive() {
        let lcdd = MockLcdd::start().await;
        let mut conn = Connection::connect(lcdd.host(), lcdd.port()).await.unwrap();

        let err = conn.request(&Command::new("bogus")).await.unwrap_err();

        match err {
            LcdError::Rejected { command, message } => {
                assert_eq!(command, "bogus");
                assert_eq!(message, "Invalid command \"bogus\"");
            }
            other => panic!("Expected Rejected, got: {:?}", other),
        }
        assert!(conn.is_alive());
    }

    #[tokio::test]
    async fn test_hangup_marks_connection_dead() {
        let lcdd = MockLcdd::start().await;
        let mut conn = Connection::connect(lcdd.host(), lcdd.port()).await.unwrap();

        lcdd.hang_up_next(1);
        let err = conn.request(&Command::screen_add("s1")).await.unwrap_err();

        assert!(err.is_transport(), "Expected transport error, got: {:?}", err);
        assert!(!conn.is_alive());

        // No further I/O is attempted on a dead connection
        let err = conn.request(&Command::screen_add("s2")).await.unwrap_err();
        assert!(matches!(err, LcdError::NotConnected));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let lcdd = MockLcdd::start().await;
        let mut conn = Connection::connect(lcdd.host(), lcdd.port()).await.unwrap();

        conn.close().await;
        conn.close().await;

        assert!(!conn.is_alive());
        assert!(matches!(
            conn.request(&Command::hello()).await,
            Err(LcdError::NotConnected)
        ));
    }
}
