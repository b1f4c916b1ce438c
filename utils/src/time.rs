//! Utility functions for `std::time`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Extension trait to add methods to `std::time::SystemTime`
pub trait SystemTimeExt {
    /// Returns the duration since the Unix epoch.
    ///
    /// Times before the epoch saturate to zero.
    fn epoch(&self) -> Duration;

    /// Returns the number of milliseconds (rounded down) since the Unix epoch.
    fn epoch_millis(&self) -> u64;

    /// Returns the number of seconds (rounded down) since the Unix epoch.
    fn epoch_secs(&self) -> u64;
}

impl SystemTimeExt for SystemTime {
    fn epoch(&self) -> Duration {
        self.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO)
    }

    fn epoch_millis(&self) -> u64 {
        self.epoch().as_millis().min(u64::MAX as u128) as u64
    }

    fn epoch_secs(&self) -> u64 {
        self.epoch().as_secs()
    }
}
