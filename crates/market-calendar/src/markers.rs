//! Quarter and year end markers.

use chrono::{Datelike, NaiveDate};
use market_core::PeriodKind;
use market_core::dates::{quarter_end, quarter_of};

/// End of one reporting period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PeriodMarker {
    /// Last day of the period.
    pub end: NaiveDate,
    /// Calendar year of `end`.
    pub year: i32,
    /// Calendar quarter of `end` (4 for year markers).
    pub quarter: u32,
}

impl PeriodMarker {
    /// Returns the compact year-quarter code, e.g. `20241`.
    #[must_use]
    pub fn code(&self) -> String {
        format!("{}{}", self.year, self.quarter)
    }
}

/// Iterator over the ends of the periods preceding a date, newest first.
///
/// ```
/// use chrono::NaiveDate;
/// use market_calendar::PeriodMarkers;
/// use market_core::PeriodKind;
///
/// let from = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
/// let codes: Vec<String> = PeriodMarkers::new(PeriodKind::Quarter, from, 3)
///     .map(|m| m.code())
///     .collect();
/// assert_eq!(codes, ["20241", "20234", "20233"]);
/// ```
#[derive(Clone, Debug)]
pub struct PeriodMarkers {
    kind: PeriodKind,
    cursor: NaiveDate,
    remaining: usize,
}

impl PeriodMarkers {
    /// Yields the ends of the `count` periods before the one containing `from`.
    #[must_use]
    pub const fn new(kind: PeriodKind, from: NaiveDate, count: usize) -> Self {
        Self {
            kind,
            cursor: from,
            remaining: count,
        }
    }

    fn previous_end(&self) -> Option<PeriodMarker> {
        let (year, quarter) = match self.kind {
            PeriodKind::Year => (self.cursor.year() - 1, 4),
            PeriodKind::Quarter => match quarter_of(self.cursor) {
                1 => (self.cursor.year() - 1, 4),
                q => (self.cursor.year(), q - 1),
            },
        };
        Some(PeriodMarker {
            end: quarter_end(year, quarter)?,
            year,
            quarter,
        })
    }
}

impl Iterator for PeriodMarkers {
    type Item = PeriodMarker;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let marker = self.previous_end()?;
        self.cursor = marker.end;
        self.remaining -= 1;
        Some(marker)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
