//! Configuration data model

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default LCDd TCP port
pub const DEFAULT_PORT: u16 = 13666;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub global: GlobalConfig,
    pub display: DisplayConfig,
}

/// Global settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalConfig {
    pub log_level: LogLevel,
    /// Overrides the default control socket location
    pub control_socket: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// LCDd screen priority
///
/// Determines whether LCDd shows a screen and how it competes with screens
/// from other clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Hidden,
    Background,
    Info,
    Foreground,
}

impl Priority {
    /// Token used on the wire and in the config file
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Background => "background",
            Self::Info => "info",
            Self::Foreground => "foreground",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hidden" => Ok(Self::Hidden),
            "background" => Ok(Self::Background),
            "info" => Ok(Self::Info),
            "foreground" => Ok(Self::Foreground),
            _ => Err(format!(
                "Unknown priority: {} (expected hidden, background, info or foreground)",
                s
            )),
        }
    }
}

/// Settings for the LCDd connection and the status screen
///
/// Any change to these settings invalidates the running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayConfig {
    /// When false the daemon never connects to LCDd
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Hide the status screen after `idle_time_minutes` without a job
    pub hide_page_when_idle: bool,
    pub priority_printing: Priority,
    pub priority_non_printing: Priority,
    pub idle_time_minutes: u64,
    pub title_show: bool,
    pub title_text: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            hide_page_when_idle: true,
            priority_printing: Priority::Foreground,
            priority_non_printing: Priority::Info,
            idle_time_minutes: 60,
            title_show: false,
            title_text: "OctoPrint".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parse_is_case_insensitive() {
        assert_eq!("Foreground".parse::<Priority>(), Ok(Priority::Foreground));
        assert_eq!("HIDDEN".parse::<Priority>(), Ok(Priority::Hidden));
        assert!("alert".parse::<Priority>().is_err());
    }

    #[test]
    fn test_priority_wire_tokens() {
        assert_eq!(Priority::Hidden.to_string(), "hidden");
        assert_eq!(Priority::Background.as_str(), "background");
    }

    #[test]
    fn test_display_defaults() {
        let display = DisplayConfig::default();
        assert!(display.enabled);
        assert_eq!(display.port, 13666);
        assert_eq!(display.priority_printing, Priority::Foreground);
        assert_eq!(display.priority_non_printing, Priority::Info);
        assert_eq!(display.idle_time_minutes, 60);
    }
}
