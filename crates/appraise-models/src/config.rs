use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppraiseError, Result};
use crate::report::REPORT_FILE_NAME;

/// Impurity measure used to pick regression tree splits.
///
/// Regression trees only support variance reduction; the field exists so
/// configurations state it explicitly.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Impurity {
    #[default]
    Variance,
}

/// Supported model families and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelType {
    LinearRegression {
        #[serde(default = "default_linear_iterations")]
        iterations: usize,
        #[serde(default = "default_step_size")]
        step_size: f64,
    },
    DecisionTree {
        #[serde(default = "default_max_depth")]
        max_depth: u16,
        #[serde(default)]
        impurity: Impurity,
        #[serde(default = "default_min_samples_split")]
        min_samples_split: usize,
    },
    RandomForest {
        #[serde(default = "default_num_trees")]
        num_trees: usize,
        #[serde(default = "default_max_depth")]
        max_depth: u16,
        #[serde(default = "default_seed")]
        seed: u64,
    },
    GradientBoostedTrees {
        #[serde(default = "default_num_trees")]
        num_iterations: usize,
        #[serde(default = "default_max_depth")]
        max_depth: u16,
        #[serde(default = "default_learning_rate")]
        learning_rate: f32,
    },
}

fn default_linear_iterations() -> usize {
    100
}

fn default_step_size() -> f64 {
    0.5
}

fn default_max_depth() -> u16 {
    5
}

fn default_min_samples_split() -> usize {
    2
}

fn default_num_trees() -> usize {
    20
}

fn default_seed() -> u64 {
    11
}

fn default_learning_rate() -> f32 {
    0.1
}

impl ModelType {
    pub fn linear_regression() -> Self {
        ModelType::LinearRegression {
            iterations: default_linear_iterations(),
            step_size: default_step_size(),
        }
    }

    pub fn decision_tree() -> Self {
        ModelType::DecisionTree {
            max_depth: default_max_depth(),
            impurity: Impurity::Variance,
            min_samples_split: default_min_samples_split(),
        }
    }

    pub fn random_forest() -> Self {
        ModelType::RandomForest {
            num_trees: default_num_trees(),
            max_depth: default_max_depth(),
            seed: default_seed(),
        }
    }

    pub fn gradient_boosted_trees() -> Self {
        ModelType::GradientBoostedTrees {
            num_iterations: default_num_trees(),
            max_depth: default_max_depth(),
            learning_rate: default_learning_rate(),
        }
    }

    /// Canonical strategy name, also used as the artifact directory name.
    pub fn strategy_name(&self) -> &'static str {
        match self {
            ModelType::LinearRegression { .. } => "LinearRegression",
            ModelType::DecisionTree { .. } => "DecisionTree",
            ModelType::RandomForest { .. } => "RandomForest",
            ModelType::GradientBoostedTrees { .. } => "GradientBoostedTrees",
        }
    }
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::gradient_boosted_trees()
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "linear" | "linear_regression" | "lr" => Ok(ModelType::linear_regression()),
            "decision_tree" | "tree" | "dt" => Ok(ModelType::decision_tree()),
            "random_forest" | "forest" | "rf" => Ok(ModelType::random_forest()),
            "gradient_boosted_trees" | "gbt" | "gbdt" => Ok(ModelType::gradient_boosted_trees()),
            _ => Err(format!(
                "Unknown model type: {}. Expected one of: linear, decision_tree, random_forest, gbt",
                s
            )),
        }
    }
}

/// One configured strategy: a model family plus an optional display name.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Overrides the canonical strategy name (and so the artifact directory).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub model_type: ModelType,
}

impl ModelConfig {
    pub fn new(model_type: ModelType) -> Self {
        Self {
            name: None,
            model_type,
        }
    }

    pub fn named(name: impl Into<String>, model_type: ModelType) -> Self {
        Self {
            name: Some(name.into()),
            model_type,
        }
    }

    pub fn strategy_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.model_type.strategy_name().to_string())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(ModelType::default())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of records assigned to the training set; the rest is held out.
    pub train_ratio: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.8,
            seed: 11,
        }
    }
}

/// Bounded retry with exponential backoff, applied to model persistence.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 50,
        }
    }
}

/// Everything a training run needs, normally loaded from a JSON file.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct RunConfig {
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    pub split: SplitConfig,
    pub strategies: Vec<ModelConfig>,
    pub fit_timeout_secs: Option<u64>,
    pub num_threads: Option<usize>,
    pub retry: RetryPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_file: PathBuf::from("data/selected.csv"),
            output_dir: PathBuf::from("model"),
            split: SplitConfig::default(),
            strategies: vec![
                ModelConfig::new(ModelType::linear_regression()),
                ModelConfig::new(ModelType::decision_tree()),
                ModelConfig::new(ModelType::random_forest()),
                ModelConfig::new(ModelType::gradient_boosted_trees()),
            ],
            fit_timeout_secs: None,
            num_threads: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl RunConfig {
    /// Load a run configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            AppraiseError::Config(format!(
                "failed to read config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            AppraiseError::Config(format!(
                "failed to parse config {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    pub fn fit_timeout(&self) -> Option<Duration> {
        self.fit_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<()> {
        let ratio = self.split.train_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(AppraiseError::Config(format!(
                "train_ratio must lie strictly between 0 and 1, got {}",
                ratio
            )));
        }
        if self.strategies.is_empty() {
            return Err(AppraiseError::Config("no strategies configured".to_string()));
        }
        if self.num_threads == Some(0) {
            return Err(AppraiseError::Config("num_threads must be at least 1".to_string()));
        }
        if self.fit_timeout_secs == Some(0) {
            return Err(AppraiseError::Config(
                "fit_timeout_secs must be at least 1; omit it to disable the timeout".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppraiseError::Config("retry.max_attempts must be at least 1".to_string()));
        }
        ensure_unique_names(self.strategies.iter().map(|s| s.strategy_name()))
    }
}

/// Strategy names double as output directories next to the run report, so
/// they must be unique per run, also when compared case-insensitively.
pub(crate) fn ensure_unique_names<I>(names: I) -> Result<()>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    for name in names {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(AppraiseError::Config(format!(
                "strategy name '{}' cannot be used as an output directory",
                name
            )));
        }
        if name.eq_ignore_ascii_case(REPORT_FILE_NAME) {
            return Err(AppraiseError::Config(format!(
                "strategy name '{}' collides with the run report",
                name
            )));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(AppraiseError::Config(format!(
                "duplicate strategy name '{}'",
                name
            )));
        }
    }
    Ok(())
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelType::LinearRegression {
                iterations,
                step_size,
            } => write!(
                f,
                "LinearRegression(iterations={}, step_size={})",
                iterations, step_size
            ),
            ModelType::DecisionTree {
                max_depth,
                impurity,
                min_samples_split,
            } => write!(
                f,
                "DecisionTree(max_depth={}, impurity={:?}, min_samples_split={})",
                max_depth, impurity, min_samples_split
            ),
            ModelType::RandomForest {
                num_trees,
                max_depth,
                seed,
            } => write!(
                f,
                "RandomForest(num_trees={}, max_depth={}, seed={})",
                num_trees, max_depth, seed
            ),
            ModelType::GradientBoostedTrees {
                num_iterations,
                max_depth,
                learning_rate,
            } => write!(
                f,
                "GradientBoostedTrees(num_iterations={}, max_depth={}, learning_rate={})",
                num_iterations, max_depth, learning_rate
            ),
        }
    }
}
