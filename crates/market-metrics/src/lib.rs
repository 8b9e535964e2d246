#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/market/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Row alignment by entity key.
pub mod align;
/// Advance/decline classification.
pub mod breadth;
/// Percent change and contribution.
pub mod change;
/// Ranking helpers.
pub mod rank;

pub use align::{align, index_by, sum_by_key};
pub use breadth::{BreadthCounts, ChangeTriple, Movement, PriceBand, group_breadth};
pub use change::{contribution, contribution_or_zero, money_flow, percent_change, percent_change_opt};
pub use rank::{Rankable, rank, top_and_bottom, top_and_bottom_desc, top_n};
