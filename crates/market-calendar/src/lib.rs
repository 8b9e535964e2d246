#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/market/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Quarter and year end markers.
pub mod markers;
/// Reference date resolution.
pub mod resolver;

pub use markers::{PeriodMarker, PeriodMarkers};
pub use resolver::{CalendarResolver, LookbackMode};
