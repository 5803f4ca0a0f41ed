//! LCDproc client session: handshake, capabilities and screen registry

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{debug, info};

use super::screen::{Screen, ScreenHandle};
use super::{Command, Connection, LcdError};

/// Capabilities reported by LCDd in its handshake reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub version: Option<String>,
    pub protocol: Option<String>,
    /// Display width in characters
    pub width: u16,
    /// Display height in characters
    pub height: u16,
    pub cell_width: Option<u16>,
    pub cell_height: Option<u16>,
}

impl ServerInfo {
    /// Parse the reply to `hello`
    ///
    /// ```text
    /// connect LCDproc 0.5.9 protocol 0.3 lcd wid 20 hgt 4 cellwid 5 cellhgt 8
    /// ```
    ///
    /// `wid` and `hgt` are required; without them no geometry can be computed.
    ///
    /// # Errors
    ///
    /// Returns `LcdError::UnexpectedReply` if the reply is not a `connect` line.
    /// Returns `LcdError::MissingCapability` if `wid` or `hgt` is absent or
    /// not a number.
    pub fn parse(reply: &str) -> Result<Self, LcdError> {
        let tokens: Vec<&str> = reply.split_whitespace().collect();

        if tokens.first() != Some(&"connect") {
            return Err(LcdError::UnexpectedReply {
                reply: reply.to_string(),
            });
        }

        let value_of = |key: &str| token_after(&tokens, key);
        let dimension = |key: &'static str| -> Result<u16, LcdError> {
            value_of(key)
                .and_then(|v| v.parse().ok())
                .ok_or_else(|| LcdError::MissingCapability {
                    field: key,
                    reply: reply.to_string(),
                })
        };

        Ok(Self {
            version: value_of("LCDproc").map(str::to_string),
            protocol: value_of("protocol").map(str::to_string),
            width: dimension("wid")?,
            height: dimension("hgt")?,
            cell_width: value_of("cellwid").and_then(|v| v.parse().ok()),
            cell_height: value_of("cellhgt").and_then(|v| v.parse().ok()),
        })
    }
}

/// The token following `key`, if any
fn token_after<'t>(tokens: &[&'t str], key: &str) -> Option<&'t str> {
    tokens
        .iter()
        .position(|t| *t == key)
        .and_then(|i| tokens.get(i + 1))
        .copied()
}

/// An established LCDproc client session
///
/// A session only exists after a successful handshake, so its
/// [`ServerInfo`] is always populated. Once the connection dies or the
/// session is closed, every screen on it is gone for good; build a new
/// session instead of repairing this one.
#[derive(Debug)]
pub struct Session {
    connection: Connection,
    info: ServerInfo,
    screens: HashMap<String, Screen>,
}

impl Session {
    /// Connect to LCDd and perform the handshake
    ///
    /// # Errors
    ///
    /// Returns the connection error if LCDd cannot be reached, or the
    /// handshake error if LCDd's reply is unusable.
    pub async fn start(host: &str, port: u16) -> Result<Self, LcdError> {
        let connection = Connection::connect(host, port).await?;
        Self::start_on(connection).await
    }

    /// Perform the handshake on an already open connection
    pub async fn start_on(mut connection: Connection) -> Result<Self, LcdError> {
        let info = match Self::handshake(&mut connection).await {
            Ok(info) => info,
            Err(e) => {
                connection.close().await;
                return Err(e);
            }
        };

        info!(
            host = connection.host(),
            port = connection.port(),
            width = info.width,
            height = info.height,
            version = info.version.as_deref().unwrap_or("unknown"),
            "LCDd session started"
        );

        Ok(Self {
            connection,
            info,
            screens: HashMap::new(),
        })
    }

    async fn handshake(connection: &mut Connection) -> Result<ServerInfo, LcdError> {
        let reply = connection.request(&Command::hello()).await?;
        ServerInfo::parse(&reply)
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn is_alive(&self) -> bool {
        self.connection.is_alive()
    }

    /// Send a raw command on the session's connection
    pub async fn request(&mut self, command: &Command) -> Result<String, LcdError> {
        self.connection.request(command).await
    }

    /// Register a new screen with LCDd
    ///
    /// # Errors
    ///
    /// Returns `LcdError::DuplicateScreen` without any traffic if `id` is
    /// already registered on this session.
    pub async fn add_screen(&mut self, id: &str) -> Result<ScreenHandle<'_>, LcdError> {
        let slot = match self.screens.entry(id.to_string()) {
            Entry::Occupied(_) => {
                return Err(LcdError::DuplicateScreen {
                    screen: id.to_string(),
                })
            }
            Entry::Vacant(slot) => slot,
        };

        self.connection.request(&Command::screen_add(id)).await?;
        debug!(screen = id, "Screen added");

        Ok(ScreenHandle {
            connection: &mut self.connection,
            screen: slot.insert(Screen::new(id)),
        })
    }

    /// Access a registered screen. No I/O.
    pub fn screen(&mut self, id: &str) -> Result<ScreenHandle<'_>, LcdError> {
        let screen = self
            .screens
            .get_mut(id)
            .ok_or_else(|| LcdError::UnknownScreen {
                screen: id.to_string(),
            })?;

        Ok(ScreenHandle {
            connection: &mut self.connection,
            screen,
        })
    }

    /// Close the session
    ///
    /// Idempotent. LCDd drops every screen of a disconnected client, so the
    /// local registry is cleared too.
    pub async fn close(&mut self) {
        self.connection.close().await;
        self.screens.clear();
    }
}
