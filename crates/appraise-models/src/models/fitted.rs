use std::fmt;

use chrono::{DateTime, Utc};
use gbdt::decision_tree::{Data, DataVec, ValueType};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::DecisionTreeRegressor;

use crate::error::{AppraiseError, Result};
use crate::models::linear::LinearModel;
use crate::models::utils::dense_matrix;

pub type TreeRegressor = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;
pub type ForestRegressor = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Backend-specific fitted model, tagged with its family on disk.
#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", content = "params")]
pub enum BackendModel {
    LinearRegression(LinearModel),
    DecisionTree(TreeRegressor),
    RandomForest(ForestRegressor),
    GradientBoostedTrees(GBDT),
}

impl BackendModel {
    pub fn kind(&self) -> &'static str {
        match self {
            BackendModel::LinearRegression(_) => "LinearRegression",
            BackendModel::DecisionTree(_) => "DecisionTree",
            BackendModel::RandomForest(_) => "RandomForest",
            BackendModel::GradientBoostedTrees(_) => "GradientBoostedTrees",
        }
    }
}

/// A trained model plus the metadata needed to reload and query it without
/// any outside information.
#[derive(Serialize, Deserialize)]
pub struct FittedModel {
    strategy: String,
    n_features: usize,
    trained_at: DateTime<Utc>,
    model: BackendModel,
}

impl FittedModel {
    pub fn new(strategy: impl Into<String>, n_features: usize, model: BackendModel) -> Self {
        Self {
            strategy: strategy.into(),
            n_features,
            trained_at: Utc::now(),
            model,
        }
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn kind(&self) -> &'static str {
        self.model.kind()
    }

    /// Input dimensionality the model was trained with.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn backend(&self) -> &BackendModel {
        &self.model
    }

    pub fn predict(&self, features: &[f64]) -> Result<f64> {
        let mut predictions = self.predict_batch(&[features])?;
        predictions.pop().ok_or_else(|| {
            AppraiseError::Evaluation(format!("{} returned no prediction", self.strategy))
        })
    }

    /// Predict one value per row. Every row must match `n_features`.
    pub fn predict_batch(&self, rows: &[&[f64]]) -> Result<Vec<f64>> {
        if let Some(bad) = rows.iter().find(|r| r.len() != self.n_features) {
            return Err(AppraiseError::Prediction {
                expected: self.n_features,
                actual: bad.len(),
            });
        }
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        match &self.model {
            BackendModel::LinearRegression(linear) => {
                Ok(rows.iter().map(|row| linear.predict_row(row)).collect())
            }
            BackendModel::DecisionTree(tree) => {
                let x = self.backend_matrix(rows)?;
                tree.predict(&x).map_err(|e| self.backend_error(e))
            }
            BackendModel::RandomForest(forest) => {
                let x = self.backend_matrix(rows)?;
                forest.predict(&x).map_err(|e| self.backend_error(e))
            }
            BackendModel::GradientBoostedTrees(gbdt) => {
                let data: DataVec = rows
                    .iter()
                    .map(|row| {
                        let features = row.iter().map(|v| *v as ValueType).collect();
                        Data::new_training_data(features, 1.0, 0.0, None)
                    })
                    .collect();
                Ok(gbdt.predict(&data).into_iter().map(f64::from).collect())
            }
        }
    }

    fn backend_matrix(&self, rows: &[&[f64]]) -> Result<DenseMatrix<f64>> {
        let owned: Vec<Vec<f64>> = rows.iter().map(|r| r.to_vec()).collect();
        dense_matrix(&owned).map_err(|e| self.backend_error(e))
    }

    fn backend_error(&self, err: impl fmt::Display) -> AppraiseError {
        AppraiseError::Evaluation(format!("{} prediction failed: {}", self.strategy, err))
    }
}

impl fmt::Debug for FittedModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FittedModel")
            .field("strategy", &self.strategy)
            .field("kind", &self.kind())
            .field("n_features", &self.n_features)
            .field("trained_at", &self.trained_at)
            .finish()
    }
}
