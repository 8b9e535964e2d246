//! Request parameter and cache lifetime definitions.
//!
//! This module defines [`Ttl`] for cache entry lifetimes and the enumerated
//! request parameters ([`TimeWindow`], [`RankOrder`], [`InvestorKind`],
//! [`TradeSide`], [`Exchange`], [`PeriodKind`]). Every parameter decodes from the loose codes
//! callers send and falls back to a default instead of rejecting the request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Lifetime of a cache entry, counted from the time it was written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ttl {
    /// No expiry; only removed manually or by backend pressure.
    #[default]
    Forever,
    /// Expires one minute after the write.
    Minute,
    /// Expires one week after the write.
    Week,
}

impl Ttl {
    /// Returns the expiry duration, or `None` for [`Ttl::Forever`].
    #[must_use]
    pub const fn duration(&self) -> Option<Duration> {
        match self {
            Self::Forever => None,
            Self::Minute => Some(Duration::from_secs(60)),
            Self::Week => Some(Duration::from_secs(7 * 24 * 60 * 60)),
        }
    }
}

/// Look-back window for flow aggregations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeWindow {
    /// The latest session only.
    Latest,
    /// Since the one-week reference date.
    OneWeek,
    /// Since the one-month reference date.
    OneMonth,
    /// Since the first session of the current year.
    #[default]
    YearToDate,
}

impl TimeWindow {
    /// Decodes a caller-supplied window code. Unknown codes fall back to
    /// [`TimeWindow::YearToDate`].
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Latest,
            1 => Self::OneWeek,
            2 => Self::OneMonth,
            3 => Self::YearToDate,
            _ => {
                debug!(code, "Unknown window code, using year to date");
                Self::YearToDate
            }
        }
    }

    /// Returns the canonical code used in cache keys.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Latest => 0,
            Self::OneWeek => 1,
            Self::OneMonth => 2,
            Self::YearToDate => 3,
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Single-direction ordering applied to ranked rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankOrder {
    /// Highest change first.
    ChangeDesc,
    /// Lowest change first.
    ChangeAsc,
    /// Highest contribution first.
    ContributionDesc,
    /// Lowest contribution first.
    ContributionAsc,
    /// Input order, untouched.
    #[default]
    Unsorted,
}

impl RankOrder {
    /// Decodes a caller-supplied order code. Unknown codes keep the input order.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::ChangeDesc,
            1 => Self::ChangeAsc,
            2 => Self::ContributionDesc,
            3 => Self::ContributionAsc,
            _ => {
                debug!(code, "Unknown order code, keeping input order");
                Self::Unsorted
            }
        }
    }
}

impl fmt::Display for RankOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChangeDesc => write!(f, "0"),
            Self::ChangeAsc => write!(f, "1"),
            Self::ContributionDesc => write!(f, "2"),
            Self::ContributionAsc => write!(f, "3"),
            Self::Unsorted => write!(f, "unsorted"),
        }
    }
}

/// Investor group whose trades are aggregated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestorKind {
    /// Foreign investors.
    #[default]
    Foreign,
    /// Proprietary desks of securities firms.
    Proprietary,
}

impl InvestorKind {
    /// Decodes a caller-supplied investor code. Unknown codes fall back to
    /// [`InvestorKind::Foreign`].
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Foreign,
            1 => Self::Proprietary,
            _ => {
                debug!(code, "Unknown investor code, using foreign");
                Self::Foreign
            }
        }
    }
}

impl fmt::Display for InvestorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Foreign => write!(f, "0"),
            Self::Proprietary => write!(f, "1"),
        }
    }
}

/// Side of the foreign trades reported by net foreign queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeSide {
    /// Bought value.
    #[default]
    Buy,
    /// Sold value.
    Sell,
}

impl TradeSide {
    /// Decodes a caller-supplied transaction code: `0` is buy, anything else sell.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        if code == 0 { Self::Buy } else { Self::Sell }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "0"),
            Self::Sell => write!(f, "1"),
        }
    }
}

/// Listing venue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    /// Ho Chi Minh City Stock Exchange.
    #[default]
    Hose,
    /// Hanoi Stock Exchange.
    Hnx,
    /// Unlisted Public Company Market.
    Upcom,
}

impl Exchange {
    /// Parses an exchange code case-insensitively. Returns `None` for unknown codes.
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "HOSE" | "HSX" => Some(Self::Hose),
            "HNX" => Some(Self::Hnx),
            "UPCOM" => Some(Self::Upcom),
            _ => None,
        }
    }

    /// Parses an exchange code, falling back to [`Exchange::Hose`].
    #[must_use]
    pub fn parse_or_default(code: &str) -> Self {
        Self::parse(code).unwrap_or_else(|| {
            debug!(code, "Unknown exchange code, using HOSE");
            Self::default()
        })
    }

    /// Returns the canonical upper-case code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Hose => "HOSE",
            Self::Hnx => "HNX",
            Self::Upcom => "UPCOM",
        }
    }

    /// Returns the code of the exchange's main index.
    #[must_use]
    pub const fn index_code(&self) -> &'static str {
        match self {
            Self::Hose => "VNINDEX",
            Self::Hnx => "HNXINDEX",
            Self::Upcom => "UPINDEX",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Reporting period granularity for period markers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodKind {
    /// Calendar quarters.
    #[default]
    Quarter,
    /// Calendar years.
    Year,
}
