//! Advance/decline classification.

use market_core::BreadthRow;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a close landed relative to its reference price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Movement {
    /// Closed exactly at the reference price.
    Equal,
    /// Closed above the reference price, below the ceiling.
    Increase,
    /// Closed below the reference price, above the floor.
    Decrease,
    /// Closed at or above the ceiling.
    Ceiling,
    /// Closed at or below the floor.
    Floor,
}

/// Ceiling and floor multipliers around the reference price.
///
/// The default band is +/-7%, the daily limit of the main exchange. Keep the
/// multipliers as literals: `100.0 * 1.07` must equal the limit price `107.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBand {
    /// Ceiling multiplier.
    pub upper: f64,
    /// Floor multiplier.
    pub lower: f64,
}

impl Default for PriceBand {
    fn default() -> Self {
        Self {
            upper: 1.07,
            lower: 0.93,
        }
    }
}

impl PriceBand {
    /// Creates a band from explicit multipliers.
    #[must_use]
    pub const fn new(upper: f64, lower: f64) -> Self {
        Self { upper, lower }
    }

    /// Classifies `close` against `reference`.
    ///
    /// The outcomes are mutually exclusive. Non-finite inputs, and inputs that
    /// fall in no bucket, yield `None`.
    #[must_use]
    pub fn classify(&self, reference: f64, close: f64) -> Option<Movement> {
        if !reference.is_finite() || !close.is_finite() {
            return None;
        }
        let ceiling = reference * self.upper;
        let floor = reference * self.lower;

        if close == reference {
            Some(Movement::Equal)
        } else if close >= ceiling {
            Some(Movement::Ceiling)
        } else if close <= floor {
            Some(Movement::Floor)
        } else if reference < close && close < ceiling {
            Some(Movement::Increase)
        } else if floor < close && close < reference {
            Some(Movement::Decrease)
        } else {
            None
        }
    }
}

/// Per-bucket counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BreadthCounts {
    /// Closes at the reference price.
    pub equal: u32,
    /// Closes inside the band, above the reference.
    pub increase: u32,
    /// Closes inside the band, below the reference.
    pub decrease: u32,
    /// Closes at or above the ceiling.
    pub high: u32,
    /// Closes at or below the floor.
    pub low: u32,
}

impl BreadthCounts {
    /// Counts one classified close. `None` counts nowhere.
    pub fn record(&mut self, movement: Option<Movement>) {
        match movement {
            Some(Movement::Equal) => self.equal += 1,
            Some(Movement::Increase) => self.increase += 1,
            Some(Movement::Decrease) => self.decrease += 1,
            Some(Movement::Ceiling) => self.high += 1,
            Some(Movement::Floor) => self.low += 1,
            None => {}
        }
    }
}

/// Day/week/month percent changes attached to a group.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChangeTriple {
    /// Change versus the previous session.
    pub day: Option<f64>,
    /// Change versus the one-week session.
    pub week: Option<f64>,
    /// Change versus the one-month session.
    pub month: Option<f64>,
}

/// Sums classified closes per group and attaches each group's changes.
///
/// Groups keep the order in which they first appear. A group with no entry
/// in `changes` is dropped.
pub fn group_breadth<I, S>(rows: I, changes: &HashMap<String, ChangeTriple>) -> Vec<BreadthRow>
where
    I: IntoIterator<Item = (S, Option<Movement>)>,
    S: Into<String>,
{
    let mut order: Vec<(String, BreadthCounts)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (group, movement) in rows {
        let group = group.into();
        let slot = match positions.get(&group) {
            Some(&i) => i,
            None => {
                positions.insert(group.clone(), order.len());
                order.push((group, BreadthCounts::default()));
                order.len() - 1
            }
        };
        order[slot].1.record(movement);
    }

    order
        .into_iter()
        .filter_map(|(industry, counts)| {
            let triple = changes.get(&industry)?;
            Some(BreadthRow {
                industry,
                equal: counts.equal,
                increase: counts.increase,
                decrease: counts.decrease,
                high: counts.high,
                low: counts.low,
                day_change_percent: triple.day,
                week_change_percent: triple.week,
                month_change_percent: triple.month,
            })
        })
        .collect()
}
