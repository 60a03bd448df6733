//! Run reports.
//!
//! A `RunReport` keeps one outcome per configured strategy, in configured
//! order, and is written next to the model artifacts as `report.json`.
pub mod report;

pub use report::{RunReport, StrategyOutcome, RANKING_TOLERANCE, REPORT_FILE_NAME};
