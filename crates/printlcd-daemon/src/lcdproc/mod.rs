//! LCDproc client for talking to LCDd
//!
//! ## Architecture
//!
//! - `Connection`: line-oriented request/reply transport over TCP
//! - `Session`: handshake, display capabilities, screen registry
//! - `ScreenHandle`: priority, heartbeat and widget registration for one screen
//! - `Widget` and the per-kind structs: local widget state and its wire format
//! - `LcdError`: error types for all of the above
//!
//! ## Protocol
//!
//! LCDd listens on TCP port 13666. Clients send one command per line and get
//! one reply line per command (`success`, `huh? <reason>`, or the `connect ...`
//! capability line for `hello`). LCDd may interleave unsolicited `listen` /
//! `ignore` notifications, which the connection skips.

mod command;
mod connection;
mod error;
mod screen;
mod session;
mod widget;

#[cfg(test)]
pub(crate) mod mock;

pub use command::Command;
pub use connection::{Connection, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REPLY_TIMEOUT};
pub use error::LcdError;
pub use screen::{Heartbeat, Screen, ScreenHandle, WidgetHandle};
pub use session::{ServerInfo, Session};
pub use widget::{
    Bar, Direction, FrameWidget, HBarWidget, IconWidget, NumberWidget, ScrollerWidget,
    StringWidget, TitleWidget, VBarWidget, Widget, WidgetVariant,
};
