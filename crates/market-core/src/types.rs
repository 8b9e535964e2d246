//! Core calendar and entity types.
//!
//! - [`Ticker`] - Trading symbol / entity code
//! - [`DateSlot`] - Named member of a reference date set
//! - [`ReferenceDateSet`] - Resolved comparison dates for one table

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::params::TimeWindow;

/// A trading symbol.
///
/// Symbols are trimmed and uppercased on creation so that rows from different
/// tables join regardless of casing.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ticker(String);

impl Ticker {
    /// Creates a new ticker, trimming and converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the ticker as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Ticker {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Ticker {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A named member of a [`ReferenceDateSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSlot {
    /// Most recent session.
    Latest,
    /// Session before the latest one.
    Previous,
    /// Session nearest to one week ago.
    Week,
    /// Session nearest to one month ago.
    Month,
    /// Session nearest to one year ago.
    Year,
    /// Session nearest to January 1st of the current year.
    YearStart,
}

impl DateSlot {
    /// All slots in resolution order.
    pub const ALL: [Self; 6] = [
        Self::Latest,
        Self::Previous,
        Self::Week,
        Self::Month,
        Self::Year,
        Self::YearStart,
    ];
}

/// Comparison dates resolved against one table's trading calendar.
///
/// Slots that could not be found in the table hold the fallback date and are
/// listed in [`degraded`](Self::degraded).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDateSet {
    /// Most recent session.
    pub latest: NaiveDate,
    /// Session before `latest` (equal to `latest` when only one exists).
    pub previous: NaiveDate,
    /// Session nearest to one week ago.
    pub week: NaiveDate,
    /// Session nearest to one month ago.
    pub month: NaiveDate,
    /// Session nearest to one year ago.
    pub year: NaiveDate,
    /// Session nearest to the start of the current year.
    pub year_start: NaiveDate,
    /// Slots that fell back to the substitute date.
    pub degraded: Vec<DateSlot>,
}

impl ReferenceDateSet {
    /// Creates a set where every slot holds `date` and nothing is degraded.
    #[must_use]
    pub const fn uniform(date: NaiveDate) -> Self {
        Self {
            latest: date,
            previous: date,
            week: date,
            month: date,
            year: date,
            year_start: date,
            degraded: Vec::new(),
        }
    }

    /// Returns the date held by `slot`.
    #[must_use]
    pub const fn get(&self, slot: DateSlot) -> NaiveDate {
        match slot {
            DateSlot::Latest => self.latest,
            DateSlot::Previous => self.previous,
            DateSlot::Week => self.week,
            DateSlot::Month => self.month,
            DateSlot::Year => self.year,
            DateSlot::YearStart => self.year_start,
        }
    }

    /// Returns true if any slot fell back to the substitute date.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    /// Returns true if `slot` fell back to the substitute date.
    #[must_use]
    pub fn is_slot_degraded(&self, slot: DateSlot) -> bool {
        self.degraded.contains(&slot)
    }

    /// Returns the first session of a look-back window ending at `latest`.
    #[must_use]
    pub const fn window_start(&self, window: TimeWindow) -> NaiveDate {
        match window {
            TimeWindow::Latest => self.latest,
            TimeWindow::OneWeek => self.week,
            TimeWindow::OneMonth => self.month,
            TimeWindow::YearToDate => self.year_start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_ticker_normalization() {
        assert_eq!(Ticker::new(" vnm ").as_str(), "VNM");
        assert_eq!(Ticker::from("fpt"), Ticker::new("FPT"));
    }

    #[test]
    fn test_window_start() {
        let set = ReferenceDateSet {
            latest: d(2024, 3, 15),
            previous: d(2024, 3, 14),
            week: d(2024, 3, 8),
            month: d(2024, 2, 15),
            year: d(2023, 3, 15),
            year_start: d(2024, 1, 2),
            degraded: vec![],
        };
        assert_eq!(set.window_start(TimeWindow::Latest), d(2024, 3, 15));
        assert_eq!(set.window_start(TimeWindow::OneWeek), d(2024, 3, 8));
        assert_eq!(set.window_start(TimeWindow::OneMonth), d(2024, 2, 15));
        assert_eq!(set.window_start(TimeWindow::YearToDate), d(2024, 1, 2));
        assert!(!set.is_degraded());
    }

    #[test]
    fn test_uniform_set() {
        let mut set = ReferenceDateSet::uniform(d(2024, 5, 1));
        set.degraded.push(DateSlot::Year);
        for slot in DateSlot::ALL {
            assert_eq!(set.get(slot), d(2024, 5, 1));
        }
        assert!(set.is_slot_degraded(DateSlot::Year));
        assert!(!set.is_slot_degraded(DateSlot::Week));
    }
}
