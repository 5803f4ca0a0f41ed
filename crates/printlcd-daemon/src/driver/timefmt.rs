//! Text formatting for the status screen fields

use chrono::{NaiveDateTime, TimeDelta};

/// Shown in place of any value that is not known
pub const PLACEHOLDER: &str = " - ";

/// Largest remaining time that is displayed as-is (99:59:59)
pub const MAX_ETA_SECONDS: u64 = 359_999;

/// Remaining time as zero-padded `HH:MM`
///
/// Seconds are truncated, and anything beyond [`MAX_ETA_SECONDS`] is shown as
/// `99:59` so the field never grows wider than five characters.
pub fn format_eta(remaining: Option<u64>) -> String {
    let Some(remaining) = remaining else {
        return PLACEHOLDER.to_string();
    };

    let clamped = remaining.min(MAX_ETA_SECONDS);
    let hours = clamped / 3600;
    let minutes = (clamped - hours * 3600) / 60;
    format!("{:02}:{:02}", hours, minutes)
}

/// Expected wall-clock finish time
///
/// `HH:MM` of `now + remaining` when the job finishes on the day it started,
/// otherwise prefixed with the day offset from the start date, e.g.
/// `+1d 01:00`.
pub fn format_finish(
    started_at: Option<NaiveDateTime>,
    now: NaiveDateTime,
    remaining: Option<u64>,
) -> String {
    let (Some(started_at), Some(remaining)) = (started_at, remaining) else {
        return PLACEHOLDER.to_string();
    };

    let finish = i64::try_from(remaining)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta));
    let Some(finish) = finish else {
        return PLACEHOLDER.to_string();
    };

    let clock = finish.format("%H:%M");
    let days = (finish.date() - started_at.date()).num_days();
    if days == 0 {
        clock.to_string()
    } else {
        format!("{:+}d {}", days, clock)
    }
}

/// Job progress as `NN%`
pub fn format_percent(percent: Option<u8>) -> String {
    match percent {
        Some(percent) => format!("{}%", percent),
        None => PLACEHOLDER.to_string(),
    }
}
