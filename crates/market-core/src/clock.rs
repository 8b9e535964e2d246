//! Source of "today" for date resolution.

use chrono::{FixedOffset, NaiveDate, Utc};
use std::fmt::Debug;

/// Supplies the current calendar date.
pub trait Clock: Send + Sync + Debug {
    /// Returns today's date in the market's timezone.
    fn today(&self) -> NaiveDate;
}

/// Wall clock shifted to a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: Option<FixedOffset>,
}

impl SystemClock {
    /// Creates a UTC clock.
    #[must_use]
    pub fn new() -> Self {
        Self { offset: None }
    }

    /// Shifts the clock by `hours` east of UTC. Out-of-range offsets are ignored.
    #[must_use]
    pub fn with_offset_hours(mut self, hours: i32) -> Self {
        self.offset = hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .or(self.offset);
        self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        let now = Utc::now();
        self.offset
            .map_or_else(|| now.date_naive(), |offset| now.with_timezone(&offset).date_naive())
    }
}

/// A clock frozen on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
