use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::config::ModelType;
use crate::data_handling::TrainingSet;
use crate::error::{AppraiseError, Result};
use crate::models::fitted::{BackendModel, FittedModel};
use crate::models::strategy_trait::TrainingStrategy;
use crate::models::utils::training_matrix;
use crate::runtime::CancellationToken;

/// Least-squares linear model fitted by full-batch gradient descent.
///
/// Features are standardized with the training means and standard deviations
/// and the label is centred on its training mean; both are stored with the
/// weights so predictions only need the raw feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    weights: Vec<f64>,
    intercept: f64,
    feature_means: Vec<f64>,
    feature_scales: Vec<f64>,
}

impl LinearModel {
    /// Run `iterations` steps of gradient descent with step size
    /// `step_size / sqrt(t)` at iteration `t`.
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[f64],
        iterations: usize,
        step_size: f64,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let n_samples = rows.len();
        let n_features = rows.first().map(|r| r.len()).unwrap_or(0);
        let x = Array2::from_shape_vec(
            (n_samples, n_features),
            rows.iter().flatten().copied().collect(),
        )
        .map_err(|e| AppraiseError::Training(format!("failed to build feature matrix: {}", e)))?;
        let y = Array1::from(labels.to_vec());

        let means = x
            .mean_axis(Axis(0))
            .ok_or_else(|| AppraiseError::Training("training set is empty".to_string()))?;
        let scales = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 { s } else { 1.0 });
        let z = (&x - &means) / &scales;

        let y_mean = y.mean().unwrap_or(0.0);
        let y_centred = &y - y_mean;

        let mut weights = Array1::<f64>::zeros(n_features);
        for t in 1..=iterations {
            if cancel.is_cancelled() {
                return Err(AppraiseError::Timeout(format!(
                    "linear regression cancelled after {} of {} iterations",
                    t - 1,
                    iterations
                )));
            }

            let residual = z.dot(&weights) - &y_centred;
            let gradient = z.t().dot(&residual) / n_samples as f64;
            let step = step_size / (t as f64).sqrt();
            weights.scaled_add(-step, &gradient);

            if weights.iter().any(|w| !w.is_finite()) {
                return Err(AppraiseError::Training(format!(
                    "gradient descent diverged at iteration {} (step_size {})",
                    t, step_size
                )));
            }
        }

        Ok(Self {
            weights: weights.to_vec(),
            intercept: y_mean,
            feature_means: means.to_vec(),
            feature_scales: scales.to_vec(),
        })
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let standardized = row
            .iter()
            .zip(self.feature_means.iter().zip(&self.feature_scales))
            .map(|(x, (mean, scale))| (x - mean) / scale);
        self.intercept
            + standardized
                .zip(&self.weights)
                .map(|(z, w)| z * w)
                .sum::<f64>()
    }

    /// Weights on the standardized features.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

#[derive(Debug, Clone)]
pub struct LinearRegressionStrategy {
    name: String,
    iterations: usize,
    step_size: f64,
}

impl LinearRegressionStrategy {
    pub fn new(name: impl Into<String>, iterations: usize, step_size: f64) -> Self {
        Self {
            name: name.into(),
            iterations,
            step_size,
        }
    }
}

impl TrainingStrategy for LinearRegressionStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn hyperparameters(&self) -> ModelType {
        ModelType::LinearRegression {
            iterations: self.iterations,
            step_size: self.step_size,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(AppraiseError::Training("iterations must be at least 1".to_string()));
        }
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(AppraiseError::Training(format!(
                "step_size must be a positive finite number, got {}",
                self.step_size
            )));
        }
        Ok(())
    }

    fn fit(&self, training_set: &TrainingSet, cancel: &CancellationToken) -> Result<FittedModel> {
        self.validate()?;
        let (rows, labels) = training_matrix(training_set)?;
        let n_features = rows[0].len();
        let model = LinearModel::fit(&rows, &labels, self.iterations, self.step_size, cancel)?;
        Ok(FittedModel::new(
            self.name.clone(),
            n_features,
            BackendModel::LinearRegression(model),
        ))
    }

    fn boxed_clone(&self) -> Box<dyn TrainingStrategy> {
        Box::new(self.clone())
    }
}
