//! Benchmark result figures: stats and duration parsing, result tables, and
//! annotated bar charts saved for inclusion in a report.

pub mod chart;
pub mod config;
pub mod error;
pub mod exec_utils;
pub mod labels;
pub mod parsers;
pub mod saver;
pub mod stats;
pub mod table;

pub mod prelude {
    pub use crate::error::*;
    pub use tracing::{debug, error, info, trace, warn};
}
