use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};

use crate::config::ModelType;
use crate::data_handling::TrainingSet;
use crate::error::{AppraiseError, Result};
use crate::models::fitted::{BackendModel, FittedModel, ForestRegressor};
use crate::models::strategy_trait::TrainingStrategy;
use crate::models::utils::{dense_matrix, training_matrix};
use crate::runtime::CancellationToken;

/// Bagged regression trees. Bootstrap sampling and feature subsetting are
/// driven by `seed`, so equal seeds give equal forests.
#[derive(Debug, Clone)]
pub struct RandomForestStrategy {
    name: String,
    num_trees: usize,
    max_depth: u16,
    seed: u64,
}

impl RandomForestStrategy {
    pub fn new(name: impl Into<String>, num_trees: usize, max_depth: u16, seed: u64) -> Self {
        Self {
            name: name.into(),
            num_trees,
            max_depth,
            seed,
        }
    }
}

impl TrainingStrategy for RandomForestStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn hyperparameters(&self) -> ModelType {
        ModelType::RandomForest {
            num_trees: self.num_trees,
            max_depth: self.max_depth,
            seed: self.seed,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.num_trees == 0 {
            return Err(AppraiseError::Training("num_trees must be at least 1".to_string()));
        }
        if self.max_depth == 0 {
            return Err(AppraiseError::Training("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }

    fn fit(&self, training_set: &TrainingSet, cancel: &CancellationToken) -> Result<FittedModel> {
        self.validate()?;
        let (rows, labels) = training_matrix(training_set)?;
        let n_features = rows[0].len();
        let x = dense_matrix(&rows).map_err(|e| {
            AppraiseError::Training(format!("failed to build feature matrix: {}", e))
        })?;

        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.num_trees)
            .with_max_depth(self.max_depth)
            .with_seed(self.seed);

        if cancel.is_cancelled() {
            return Err(AppraiseError::Timeout(format!("{} cancelled before fit", self.name)));
        }
        let forest: ForestRegressor = RandomForestRegressor::fit(&x, &labels, params)
            .map_err(|e| AppraiseError::Training(format!("random forest fit failed: {}", e)))?;

        Ok(FittedModel::new(
            self.name.clone(),
            n_features,
            BackendModel::RandomForest(forest),
        ))
    }

    fn boxed_clone(&self) -> Box<dyn TrainingStrategy> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_handling::LabeledRecord;

    fn training_set() -> TrainingSet {
        let records = (0..60)
            .map(|i| {
                let a = (i % 10) as f64;
                let b = (i / 10) as f64;
                LabeledRecord::new(vec![a, b], 10.0 * a + b)
            })
            .collect();
        TrainingSet::from_records(records)
    }

    #[test]
    fn same_seed_gives_same_predictions() {
        let strategy = RandomForestStrategy::new("RandomForest", 8, 4, 11);
        let set = training_set();
        let a = strategy.fit(&set, &CancellationToken::new()).unwrap();
        let b = strategy.fit(&set, &CancellationToken::new()).unwrap();
        let probe: [&[f64]; 3] = [&[1.0, 2.0], &[7.0, 0.0], &[4.5, 3.0]];
        assert_eq!(a.predict_batch(&probe).unwrap(), b.predict_batch(&probe).unwrap());
    }

    #[test]
    fn zero_trees_is_a_training_failure() {
        let strategy = RandomForestStrategy::new("RandomForest", 0, 4, 11);
        let err = strategy.fit(&training_set(), &CancellationToken::new()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::TrainingFailure);
    }
}
