//! Typed builder for LCDproc protocol lines

use std::fmt;

/// A single LCDproc command line, without the trailing newline
///
/// Commands are built token by token so every widget kind writes its fields
/// in one fixed order and text arguments are always quoted the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    line: String,
}

impl Command {
    pub fn new(name: &str) -> Self {
        Self {
            line: name.to_string(),
        }
    }

    /// Append a bare token (ids, numbers, keywords)
    pub fn arg(mut self, token: impl fmt::Display) -> Self {
        self.line.push(' ');
        self.line.push_str(&token.to_string());
        self
    }

    /// Append a double-quoted text argument
    ///
    /// Embedded double quotes become single quotes and control characters
    /// become spaces, so the text can never end the quoted argument early or
    /// split the line.
    pub fn quoted(mut self, text: &str) -> Self {
        self.line.push_str(" \"");
        self.line.extend(text.chars().map(|ch| match ch {
            '"' => '\'',
            c if c.is_control() => ' ',
            c => c,
        }));
        self.line.push('"');
        self
    }

    pub fn as_str(&self) -> &str {
        &self.line
    }

    // Protocol commands used by the session and screen layers

    pub fn hello() -> Self {
        Self::new("hello")
    }

    pub fn screen_add(screen: &str) -> Self {
        Self::new("screen_add").arg(screen)
    }

    pub fn widget_add(screen: &str, widget: &str, kind: &str) -> Self {
        Self::new("widget_add").arg(screen).arg(widget).arg(kind)
    }

    pub fn widget_set(screen: &str, widget: &str) -> Self {
        Self::new("widget_set").arg(screen).arg(widget)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}
