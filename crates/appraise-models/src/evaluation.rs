//! Scoring of fitted models against the held-out test set.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use smartcore::metrics;

use crate::data_handling::TestSet;
use crate::error::{AppraiseError, Result};
use crate::models::FittedModel;

/// Largest MSE still reported as an exact fit.
pub const EXACT_MATCH_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub mse: f64,
    pub rmse: f64,
    pub n_samples: usize,
}

impl Score {
    pub fn from_mse(mse: f64, n_samples: usize) -> Self {
        Self {
            mse,
            rmse: mse.sqrt(),
            n_samples,
        }
    }

    /// True when every prediction matched its label within `EXACT_MATCH_TOLERANCE`.
    pub fn is_exact(&self) -> bool {
        self.mse <= EXACT_MATCH_TOLERANCE
    }
}

/// Metric of one strategy, tagged with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub strategy: String,
    pub model: String,
    pub score: Score,
    pub artifact: PathBuf,
    pub elapsed_secs: f64,
}

impl EvaluationResult {
    pub fn mse(&self) -> f64 {
        self.score.mse
    }

    pub fn rmse(&self) -> f64 {
        self.score.rmse
    }
}

/// Mean squared error of `model` over every record of `test_set`.
pub fn score(model: &FittedModel, test_set: &TestSet) -> Result<Score> {
    if test_set.is_empty() {
        return Err(AppraiseError::Evaluation(
            "test set is empty; mean squared error is undefined".to_string(),
        ));
    }

    let rows: Vec<&[f64]> = test_set.iter().map(|r| r.features()).collect();
    let predictions = model.predict_batch(&rows)?;
    let labels = test_set.labels();
    let mse = mean_squared_error(&labels, &predictions)?;
    Ok(Score::from_mse(mse, labels.len()))
}

pub fn mean_squared_error(labels: &[f64], predictions: &[f64]) -> Result<f64> {
    if labels.is_empty() {
        return Err(AppraiseError::Evaluation("cannot average over zero predictions".to_string()));
    }
    if labels.len() != predictions.len() {
        return Err(AppraiseError::Evaluation(format!(
            "{} labels but {} predictions",
            labels.len(),
            predictions.len()
        )));
    }

    let y_true = labels.to_vec();
    let y_pred = predictions.to_vec();
    let mse = metrics::mean_squared_error(&y_true, &y_pred);
    if !mse.is_finite() {
        return Err(AppraiseError::Evaluation(format!(
            "mean squared error is not finite ({})",
            mse
        )));
    }
    Ok(mse)
}
