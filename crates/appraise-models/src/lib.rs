//! appraise-models: training strategies for house-price regression.
//!
//! This crate wraps four regression families (gradient-descent linear
//! regression, a decision tree, a random forest and gradient-boosted trees)
//! behind one `TrainingStrategy` contract, scores every fitted model on a
//! shared held-out split, and persists each model as a self-describing JSON
//! artifact.
//!
//! Tree-based fitting is delegated to `smartcore` and `gbdt`. The crate itself
//! owns the dataset split, the evaluation metric, persistence and the parallel
//! orchestration of independent strategies.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod models;
pub mod orchestrator;
pub mod persistence;
pub mod report;
pub mod runtime;
pub mod stats;

pub use error::{AppraiseError, ErrorKind, Result};
