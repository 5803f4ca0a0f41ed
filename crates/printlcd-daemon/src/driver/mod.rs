//! Print status state machine on top of the LCDproc client
//!
//! ## Architecture
//!
//! - `StateDriver`: actor owning the job state, the LCDd session and the timers
//! - `DriverHandle`: cloneable sender used by event sources
//! - `Layout`: where each status widget sits on a display of a given size
//! - `PrintJobState` / `ScreenState`: job data and the idle / printing /
//!   non-printing phases, projected onto a screen priority
//! - `timefmt`: ETA, finish time and percent texts
//!
//! ## Timers
//!
//! The refresh timer (while printing) and the idle timer (after a job) run
//! as separate tasks that post messages back to the driver. Every timer
//! carries a generation number; a message from a timer that has since been
//! replaced or cancelled is dropped on arrival.

mod handle;
mod layout;
mod sources;
mod state;
mod state_driver;
pub mod timefmt;

pub use handle::{DriverHandle, DriverMessage, DriverStatus, DriverStopped, PrintEvent};
pub use layout::{Fields, Layout, SCREEN_ID};
pub use sources::{Clock, ProgressSource, SystemClock};
pub use state::{PrintJobState, ScreenState, StatusView};
pub use state_driver::{StateDriver, REFRESH_INTERVAL};
