use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};

use crate::config::{Impurity, ModelType};
use crate::data_handling::TrainingSet;
use crate::error::{AppraiseError, Result};
use crate::models::fitted::{BackendModel, FittedModel, TreeRegressor};
use crate::models::strategy_trait::TrainingStrategy;
use crate::models::utils::{dense_matrix, training_matrix};
use crate::runtime::CancellationToken;

/// Single regression tree (smartcore CART regressor).
#[derive(Debug, Clone)]
pub struct DecisionTreeStrategy {
    name: String,
    max_depth: u16,
    impurity: Impurity,
    min_samples_split: usize,
}

impl DecisionTreeStrategy {
    pub fn new(
        name: impl Into<String>,
        max_depth: u16,
        impurity: Impurity,
        min_samples_split: usize,
    ) -> Self {
        Self {
            name: name.into(),
            max_depth,
            impurity,
            min_samples_split,
        }
    }
}

impl TrainingStrategy for DecisionTreeStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn hyperparameters(&self) -> ModelType {
        ModelType::DecisionTree {
            max_depth: self.max_depth,
            impurity: self.impurity,
            min_samples_split: self.min_samples_split,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(AppraiseError::Training("max_depth must be at least 1".to_string()));
        }
        if self.min_samples_split < 2 {
            return Err(AppraiseError::Training(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
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

        // smartcore's regression tree always splits on variance reduction.
        let params = DecisionTreeRegressorParameters::default()
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split);

        if cancel.is_cancelled() {
            return Err(AppraiseError::Timeout(format!("{} cancelled before fit", self.name)));
        }
        let tree: TreeRegressor = DecisionTreeRegressor::fit(&x, &labels, params)
            .map_err(|e| AppraiseError::Training(format!("decision tree fit failed: {}", e)))?;

        Ok(FittedModel::new(
            self.name.clone(),
            n_features,
            BackendModel::DecisionTree(tree),
        ))
    }

    fn boxed_clone(&self) -> Box<dyn TrainingStrategy> {
        Box::new(self.clone())
    }
}
