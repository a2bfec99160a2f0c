//! Time source for report timestamps.

use chrono::{DateTime, SecondsFormat, Utc};

/// Supplies the current time.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Format a timestamp as RFC 3339 with second precision and a `Z` suffix.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}
