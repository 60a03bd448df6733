use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec, ValueType};
use gbdt::gradient_boost::GBDT;

use crate::config::ModelType;
use crate::data_handling::TrainingSet;
use crate::error::{AppraiseError, Result};
use crate::models::fitted::{BackendModel, FittedModel};
use crate::models::strategy_trait::TrainingStrategy;
use crate::models::utils::training_matrix;
use crate::runtime::CancellationToken;

const LOSS: &str = "SquaredError";

/// Gradient-boosted regression trees (gbdt-rs, squared-error loss).
#[derive(Debug, Clone)]
pub struct GradientBoostedTreesStrategy {
    name: String,
    num_iterations: usize,
    max_depth: u16,
    learning_rate: f32,
}

impl GradientBoostedTreesStrategy {
    pub fn new(
        name: impl Into<String>,
        num_iterations: usize,
        max_depth: u16,
        learning_rate: f32,
    ) -> Self {
        Self {
            name: name.into(),
            num_iterations,
            max_depth,
            learning_rate,
        }
    }

    fn backend_config(&self, feature_size: usize) -> Config {
        let mut config = Config::new();
        config.set_feature_size(feature_size);
        config.set_shrinkage(self.learning_rate);
        config.set_max_depth(u32::from(self.max_depth));
        config.set_iterations(self.num_iterations);
        config.set_loss(LOSS);
        config.set_debug(false);
        config.set_training_optimization_level(2);
        config
    }
}

impl TrainingStrategy for GradientBoostedTreesStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn hyperparameters(&self) -> ModelType {
        ModelType::GradientBoostedTrees {
            num_iterations: self.num_iterations,
            max_depth: self.max_depth,
            learning_rate: self.learning_rate,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.num_iterations == 0 {
            return Err(AppraiseError::Training("num_iterations must be at least 1".to_string()));
        }
        if self.max_depth == 0 {
            return Err(AppraiseError::Training("max_depth must be at least 1".to_string()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(AppraiseError::Training(format!(
                "learning_rate must be a positive finite number, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    fn fit(&self, training_set: &TrainingSet, cancel: &CancellationToken) -> Result<FittedModel> {
        self.validate()?;
        let (rows, labels) = training_matrix(training_set)?;
        let n_features = rows[0].len();

        let mut train_x: DataVec = rows
            .into_iter()
            .zip(labels)
            .map(|(row, label)| {
                let features = row.into_iter().map(|v| v as ValueType).collect();
                Data::new_training_data(features, 1.0, label as ValueType, None)
            })
            .collect();

        if cancel.is_cancelled() {
            return Err(AppraiseError::Timeout(format!("{} cancelled before fit", self.name)));
        }
        let mut gbdt = GBDT::new(&self.backend_config(n_features));
        gbdt.fit(&mut train_x);

        Ok(FittedModel::new(
            self.name.clone(),
            n_features,
            BackendModel::GradientBoostedTrees(gbdt),
        ))
    }

    fn boxed_clone(&self) -> Box<dyn TrainingStrategy> {
        Box::new(self.clone())
    }
}
