pub mod decision_tree;
pub mod factory;
pub mod fitted;
pub mod gbdt;
pub mod linear;
pub mod random_forest;
pub mod strategy_trait;
pub mod utils;

pub use decision_tree::DecisionTreeStrategy;
pub use fitted::{BackendModel, FittedModel};
pub use gbdt::GradientBoostedTreesStrategy;
pub use linear::{LinearModel, LinearRegressionStrategy};
pub use random_forest::RandomForestStrategy;
pub use strategy_trait::TrainingStrategy;
