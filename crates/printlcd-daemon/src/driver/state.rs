//! Print job state and its projection onto the status screen

use chrono::NaiveDateTime;
use printlcd_config::{DisplayConfig, Priority};
use serde::{Deserialize, Serialize};

use super::timefmt::{format_eta, format_finish, format_percent};

/// Which phase the status screen is in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenState {
    /// No job for a while
    #[default]
    Idle,
    Printing,
    /// A job ended recently
    NonPrinting,
}

impl ScreenState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Printing => "printing",
            Self::NonPrinting => "non_printing",
        }
    }

    /// Screen priority for this state under `settings`
    pub fn priority(&self, settings: &DisplayConfig) -> Priority {
        match self {
            Self::Printing => settings.priority_printing,
            Self::NonPrinting => settings.priority_non_printing,
            Self::Idle if settings.hide_page_when_idle => Priority::Hidden,
            Self::Idle => settings.priority_non_printing,
        }
    }
}

impl std::fmt::Display for ScreenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the driver knows about the current job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrintJobState {
    pub state: ScreenState,
    pub filename: Option<String>,
    pub started_at: Option<NaiveDateTime>,
    pub percent: Option<u8>,
    pub remaining_seconds: Option<u64>,
}

impl PrintJobState {
    /// A new job begins; progress from a previous job is dropped
    pub fn start(&mut self, filename: &str, now: NaiveDateTime) {
        self.state = ScreenState::Printing;
        self.filename = Some(filename.to_string());
        self.started_at = Some(now);
        self.percent = None;
        self.remaining_seconds = None;
    }

    /// The job ended, however it ended
    ///
    /// The filename stays on screen until the next job.
    pub fn finish(&mut self) {
        self.state = ScreenState::NonPrinting;
        self.started_at = None;
        self.percent = None;
        self.remaining_seconds = None;
    }

    pub fn go_idle(&mut self) {
        self.state = ScreenState::Idle;
    }

    pub fn is_printing(&self) -> bool {
        self.state == ScreenState::Printing
    }

    /// Render every field for the current instant
    pub fn view(&self, settings: &DisplayConfig, now: NaiveDateTime) -> StatusView {
        StatusView {
            priority: self.state.priority(settings),
            filename: self.filename.clone().unwrap_or_default(),
            percent: format_percent(self.percent),
            eta: format_eta(self.remaining_seconds),
            finish: format_finish(self.started_at, now, self.remaining_seconds),
        }
    }
}

/// Display texts derived from a [`PrintJobState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub priority: Priority,
    pub filename: String,
    pub percent: String,
    pub eta: String,
    pub finish: String,
}
