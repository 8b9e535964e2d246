//! Calendar helpers shared by sources and the resolver.

use chrono::{Datelike, NaiveDate};

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Converts a date to days since the Unix epoch (the physical Polars date type).
#[must_use]
pub fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

/// Converts days since the Unix epoch back to a date.
#[must_use]
pub fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)
}

/// Parses a date cell rendered as text.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, and timestamps that start with either.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let head = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(head, "%Y/%m/%d"))
        .ok()
}

/// Returns the candidate closest to `target` by absolute day distance.
///
/// Candidates on either side of the target qualify. When two candidates are
/// equally close the later one wins.
pub fn nearest_date<I>(candidates: I, target: NaiveDate) -> Option<NaiveDate>
where
    I: IntoIterator<Item = NaiveDate>,
{
    candidates
        .into_iter()
        .min_by_key(|date| ((*date - target).num_days().abs(), std::cmp::Reverse(*date)))
}

/// Returns the calendar quarter (1-4) of `date`.
#[must_use]
pub fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// Returns the last day of `quarter` (1-4) in `year`.
#[must_use]
pub fn quarter_end(year: i32, quarter: u32) -> Option<NaiveDate> {
    match quarter {
        4 => NaiveDate::from_ymd_opt(year, 12, 31),
        1..=3 => NaiveDate::from_ymd_opt(year, quarter * 3 + 1, 1)?.pred_opt(),
        _ => None,
    }
}

/// Returns January 1st of the year `date` falls in.
#[must_use]
pub fn start_of_year(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_epoch_round_trip() {
        assert_eq!(epoch_days(d(1970, 1, 1)), 0);
        assert_eq!(epoch_days(d(1970, 1, 11)), 10);
        assert_eq!(from_epoch_days(epoch_days(d(2024, 2, 29))), Some(d(2024, 2, 29)));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-10"), Some(d(2024, 1, 10)));
        assert_eq!(parse_date("2024/01/10"), Some(d(2024, 1, 10)));
        assert_eq!(parse_date("2024-01-10T07:00:00Z"), Some(d(2024, 1, 10)));
        assert_eq!(parse_date("2024-01-10 00:00:00.000"), Some(d(2024, 1, 10)));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_nearest_date_picks_closest_either_side() {
        let dates = [d(2024, 1, 1), d(2024, 1, 10), d(2024, 1, 20)];
        assert_eq!(nearest_date(dates, d(2024, 1, 8)), Some(d(2024, 1, 10)));
        assert_eq!(nearest_date(dates, d(2024, 1, 3)), Some(d(2024, 1, 1)));
        assert_eq!(nearest_date(dates, d(2025, 6, 1)), Some(d(2024, 1, 20)));
    }

    #[test]
    fn test_nearest_date_tie_prefers_later() {
        let dates = [d(2024, 1, 1), d(2024, 1, 5)];
        assert_eq!(nearest_date(dates, d(2024, 1, 3)), Some(d(2024, 1, 5)));
        assert_eq!(nearest_date(Vec::new(), d(2024, 1, 3)), None);
    }

    #[test]
    fn test_quarter_helpers() {
        assert_eq!(quarter_of(d(2024, 5, 17)), 2);
        assert_eq!(quarter_end(2024, 1), Some(d(2024, 3, 31)));
        assert_eq!(quarter_end(2024, 2), Some(d(2024, 6, 30)));
        assert_eq!(quarter_end(2023, 4), Some(d(2023, 12, 31)));
        assert_eq!(quarter_end(2023, 5), None);
        assert_eq!(start_of_year(d(2024, 8, 9)), Some(d(2024, 1, 1)));
    }
}
