//! Collaborators polled by the state driver

use std::sync::{Arc, RwLock};

use chrono::NaiveDateTime;

/// Provides the remaining time of the current job
///
/// Polled on every refresh tick. `None` means the remaining time is not
/// known (no estimate yet, or the source could not be read) and is shown as
/// the placeholder.
///
/// # Implementations
///
/// - `()`: never knows the remaining time
/// - `Arc<RwLock<Option<u64>>>`: a shared snapshot updated by whoever learns
///   the value, e.g. the control socket
pub trait ProgressSource: Send + Sync {
    fn remaining_seconds(&self) -> Option<u64>;
}

impl ProgressSource for () {
    fn remaining_seconds(&self) -> Option<u64> {
        None
    }
}

impl ProgressSource for Arc<RwLock<Option<u64>>> {
    fn remaining_seconds(&self) -> Option<u64> {
        // A poisoned lock reads as unknown
        self.read().ok().and_then(|guard| *guard)
    }
}

/// Source of the local wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The system's local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_source_is_always_unknown() {
        assert_eq!(().remaining_seconds(), None);
    }

    #[test]
    fn test_shared_snapshot_reflects_writes() {
        let shared = Arc::new(RwLock::new(None));
        let source = shared.clone();

        assert_eq!(source.remaining_seconds(), None);

        *shared.write().unwrap() = Some(90);
        assert_eq!(source.remaining_seconds(), Some(90));

        *shared.write().unwrap() = None;
        assert_eq!(source.remaining_seconds(), None);
    }
}
