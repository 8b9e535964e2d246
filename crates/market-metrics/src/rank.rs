//! Ranking helpers.

use market_core::{LiquidityRow, RankOrder};
use std::cmp::Ordering;

/// Returns the `k` highest rows followed by the `k` lowest, lowest first.
///
/// Rows are stably sorted by `key` descending. When fewer than `2k` rows exist
/// the two halves overlap and a row can appear in both.
///
/// ```
/// use market_metrics::top_and_bottom;
///
/// let rows = vec![10, 8, 6, 4, 2, 0, -2, -4, -6, -8];
/// let picked = top_and_bottom(rows, 3, |v| f64::from(*v));
/// assert_eq!(picked, [10, 8, 6, -8, -6, -4]);
/// ```
pub fn top_and_bottom<T, F>(mut rows: Vec<T>, k: usize, key: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> f64,
{
    rows.sort_by(|a, b| key(b).total_cmp(&key(a)));
    let mut picked: Vec<T> = rows.iter().take(k).cloned().collect();
    picked.extend(rows.iter().rev().take(k).cloned());
    picked
}

/// Like [`top_and_bottom`] but the whole list reads descending: the `k`
/// highest rows, then the `k` lowest from the highest of them down.
///
/// ```
/// use market_metrics::top_and_bottom_desc;
///
/// let rows = vec![10, 8, 6, 4, 2, 0, -2, -4, -6, -8];
/// let picked = top_and_bottom_desc(rows, 3, |v| f64::from(*v));
/// assert_eq!(picked, [10, 8, 6, -4, -6, -8]);
/// ```
pub fn top_and_bottom_desc<T, F>(mut rows: Vec<T>, k: usize, key: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> f64,
{
    rows.sort_by(|a, b| key(b).total_cmp(&key(a)));
    let mut picked: Vec<T> = rows.iter().take(k).cloned().collect();
    picked.extend_from_slice(&rows[rows.len().saturating_sub(k)..]);
    picked
}

/// Returns the `n` rows with the highest `key`, stably sorted descending.
pub fn top_n<T, F>(mut rows: Vec<T>, n: usize, key: F) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    rows.sort_by(|a, b| key(b).total_cmp(&key(a)));
    rows.truncate(n);
    rows
}

/// Rows that can be ordered by [`RankOrder`].
pub trait Rankable {
    /// Percent change used by the change orders.
    fn change(&self) -> Option<f64>;

    /// Contribution used by the contribution orders.
    fn contribution(&self) -> Option<f64>;
}

impl Rankable for LiquidityRow {
    fn change(&self) -> Option<f64> {
        self.value_change_percent
    }

    fn contribution(&self) -> Option<f64> {
        Some(self.contribute)
    }
}

/// Sorts rows in place by `order`. Stable; rows without a key go last.
/// [`RankOrder::Unsorted`] leaves the input order untouched.
pub fn rank<T: Rankable>(rows: &mut [T], order: RankOrder) {
    let (key, descending): (fn(&T) -> Option<f64>, bool) = match order {
        RankOrder::ChangeDesc => (T::change, true),
        RankOrder::ChangeAsc => (T::change, false),
        RankOrder::ContributionDesc => (T::contribution, true),
        RankOrder::ContributionAsc => (T::contribution, false),
        RankOrder::Unsorted => return,
    };
    rows.sort_by(|a, b| match (key(a), key(b)) {
        (Some(x), Some(y)) if descending => y.total_cmp(&x),
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
