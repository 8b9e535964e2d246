//! Percent change and contribution.
//!
//! Every ratio here guards its denominator: zero, missing and non-finite
//! baselines produce `None`, never `inf` or `NaN`.

/// Returns `(current - baseline) / baseline * 100`.
///
/// ```
/// use market_metrics::percent_change;
///
/// assert_eq!(percent_change(110.0, 100.0), Some(10.0));
/// assert_eq!(percent_change(5.0, 0.0), None);
/// ```
#[must_use]
pub fn percent_change(current: f64, baseline: f64) -> Option<f64> {
    if baseline == 0.0 || !baseline.is_finite() || !current.is_finite() {
        return None;
    }
    Some((current - baseline) / baseline * 100.0)
}

/// [`percent_change`] over optional inputs.
#[must_use]
pub fn percent_change_opt(current: Option<f64>, baseline: Option<f64>) -> Option<f64> {
    percent_change(current?, baseline?)
}

/// Returns `part / whole * 100`, or `None` when `whole` is zero or not finite.
#[must_use]
pub fn contribution(part: f64, whole: f64) -> Option<f64> {
    if whole == 0.0 || !whole.is_finite() || !part.is_finite() {
        return None;
    }
    Some(part / whole * 100.0)
}

/// [`contribution`] with the sentinel mapped to `0.0`.
#[must_use]
pub fn contribution_or_zero(part: f64, whole: f64) -> f64 {
    contribution(part, whole).unwrap_or(0.0)
}

/// Money flow of one session: volume times the typical price.
#[must_use]
pub fn money_flow(volume: f64, close: f64, high: f64, low: f64) -> f64 {
    volume * (close + high + low) / 3.0
}
