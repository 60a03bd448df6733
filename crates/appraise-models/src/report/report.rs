use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppraiseError, ErrorKind, Result};
use crate::evaluation::EvaluationResult;

pub const REPORT_FILE_NAME: &str = "report.json";

/// Relative RMSE difference below which two strategies are ranked as a tie.
pub const RANKING_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StrategyOutcome {
    Succeeded(EvaluationResult),
    Failed {
        strategy: String,
        kind: ErrorKind,
        message: String,
    },
}

impl StrategyOutcome {
    pub fn failed(strategy: impl Into<String>, err: &AppraiseError) -> Self {
        StrategyOutcome::Failed {
            strategy: strategy.into(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn strategy(&self) -> &str {
        match self {
            StrategyOutcome::Succeeded(result) => &result.strategy,
            StrategyOutcome::Failed { strategy, .. } => strategy,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StrategyOutcome::Succeeded(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub created_at: DateTime<Utc>,
    pub train_size: usize,
    pub test_size: usize,
    pub outcomes: Vec<StrategyOutcome>,
}

impl RunReport {
    pub fn new(train_size: usize, test_size: usize, outcomes: Vec<StrategyOutcome>) -> Self {
        Self {
            created_at: Utc::now(),
            train_size,
            test_size,
            outcomes,
        }
    }

    pub fn succeeded(&self) -> Vec<&EvaluationResult> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                StrategyOutcome::Succeeded(result) => Some(result),
                StrategyOutcome::Failed { .. } => None,
            })
            .collect()
    }

    pub fn failed(&self) -> Vec<&StrategyOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success()).collect()
    }

    pub fn outcome(&self, strategy: &str) -> Option<&StrategyOutcome> {
        self.outcomes.iter().find(|o| o.strategy() == strategy)
    }

    /// Succeeded strategies by RMSE, best first. Ties within
    /// `RANKING_TOLERANCE` keep configured order.
    pub fn ranking(&self) -> Vec<&EvaluationResult> {
        let mut ranked = self.succeeded();
        // Stable sort, so equal keys stay in configured order.
        ranked.sort_by(|a, b| compare_rmse(a.rmse(), b.rmse()));
        ranked
    }

    pub fn best(&self) -> Option<&EvaluationResult> {
        self.ranking().into_iter().next()
    }

    pub fn log_summary(&self) {
        log::info!(
            "[appraise::report] {} of {} strategies succeeded ({} train / {} test records)",
            self.succeeded().len(),
            self.outcomes.len(),
            self.train_size,
            self.test_size
        );
        for (rank, result) in self.ranking().iter().enumerate() {
            log::info!(
                "[appraise::report] #{} {:<24} RMSE = {:.6} (MSE = {:.6})",
                rank + 1,
                result.strategy,
                result.rmse(),
                result.mse()
            );
        }
        for outcome in self.failed() {
            if let StrategyOutcome::Failed {
                strategy,
                kind,
                message,
            } = outcome
            {
                log::error!("[appraise::report] {} failed ({}): {}", strategy, kind, message);
            }
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppraiseError::persistence(path, e))?;
        }
        let file = File::create(path).map_err(|e| AppraiseError::persistence(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| AppraiseError::persistence(path, e))?;
        writer.flush().map_err(|e| AppraiseError::persistence(path, e))
    }
}

fn compare_rmse(a: f64, b: f64) -> Ordering {
    let scale = a.abs().max(b.abs());
    if (a - b).abs() <= RANKING_TOLERANCE * scale {
        Ordering::Equal
    } else {
        a.partial_cmp(&b).unwrap_or(Ordering::Equal)
    }
}
