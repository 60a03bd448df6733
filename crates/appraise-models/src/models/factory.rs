use crate::config::{ModelConfig, ModelType};
use crate::models::decision_tree::DecisionTreeStrategy;
use crate::models::gbdt::GradientBoostedTreesStrategy;
use crate::models::linear::LinearRegressionStrategy;
use crate::models::random_forest::RandomForestStrategy;
use crate::models::strategy_trait::TrainingStrategy;

/// Build a boxed training strategy from a `ModelConfig`.
pub fn build_strategy(config: &ModelConfig) -> Box<dyn TrainingStrategy> {
    let name = config.strategy_name();
    match config.model_type {
        ModelType::LinearRegression {
            iterations,
            step_size,
        } => Box::new(LinearRegressionStrategy::new(name, iterations, step_size)),
        ModelType::DecisionTree {
            max_depth,
            impurity,
            min_samples_split,
        } => Box::new(DecisionTreeStrategy::new(
            name,
            max_depth,
            impurity,
            min_samples_split,
        )),
        ModelType::RandomForest {
            num_trees,
            max_depth,
            seed,
        } => Box::new(RandomForestStrategy::new(name, num_trees, max_depth, seed)),
        ModelType::GradientBoostedTrees {
            num_iterations,
            max_depth,
            learning_rate,
        } => Box::new(GradientBoostedTreesStrategy::new(
            name,
            num_iterations,
            max_depth,
            learning_rate,
        )),
    }
}

/// Build every strategy of a run, in configured order.
pub fn build_strategies(configs: &[ModelConfig]) -> Vec<Box<dyn TrainingStrategy>> {
    configs.iter().map(build_strategy).collect()
}
