use std::path::Path;
use std::time::Instant;

use crate::config::ModelType;
use crate::data_handling::{TestSet, TrainingSet};
use crate::error::{AppraiseError, Result};
use crate::evaluation::{self, EvaluationResult};
use crate::models::fitted::FittedModel;
use crate::persistence;
use crate::runtime::{self, CancellationToken, ExecutionOptions};

/// Shared contract of every model family.
///
/// Implementations only differ in hyper-parameters and in how `fit` calls
/// into the backend; evaluation and persistence are common to all of them
/// and live in the provided `execute`.
pub trait TrainingStrategy: Send + Sync {
    /// Strategy identity, also the artifact directory name.
    fn name(&self) -> &str;

    fn hyperparameters(&self) -> ModelType;

    /// Reject hyper-parameters the backend cannot fit with.
    fn validate(&self) -> Result<()>;

    /// Fit a model on `training_set`. Long-running fits should poll `cancel`.
    fn fit(&self, training_set: &TrainingSet, cancel: &CancellationToken) -> Result<FittedModel>;

    fn boxed_clone(&self) -> Box<dyn TrainingStrategy>;

    /// Fit, score against `test_set`, and persist the model to `output_path`.
    fn execute(
        &self,
        training_set: &TrainingSet,
        test_set: &TestSet,
        output_path: &Path,
        options: &ExecutionOptions,
    ) -> Result<EvaluationResult> {
        execute_strategy(self, training_set, test_set, output_path, options)
    }
}

pub(crate) fn execute_strategy<S>(
    strategy: &S,
    training_set: &TrainingSet,
    test_set: &TestSet,
    output_path: &Path,
    options: &ExecutionOptions,
) -> Result<EvaluationResult>
where
    S: TrainingStrategy + ?Sized,
{
    let started = Instant::now();
    let name = strategy.name();
    log::info!(
        "[appraise::{}] Start: {} on {} training / {} test records",
        name,
        strategy.hyperparameters(),
        training_set.len(),
        test_set.len()
    );

    strategy.validate()?;
    if training_set.is_empty() {
        return Err(AppraiseError::Training("training set is empty".to_string()));
    }
    if test_set.is_empty() {
        return Err(AppraiseError::Evaluation(
            "test set is empty; mean squared error is undefined".to_string(),
        ));
    }

    let model = runtime::fit_with_deadline(strategy, training_set, options)?;
    let score = evaluation::score(&model, test_set)?;
    log::info!(
        "[appraise::{}] Test Mean Squared Error = {:.6}, Root Mean Squared Error = {:.6}",
        name,
        score.mse,
        score.rmse
    );

    persistence::save_with_retry(&model, output_path, &options.retry)?;

    let elapsed = started.elapsed();
    log::info!(
        "[appraise::{}] Completed in {:.2?}; model written to {}",
        name,
        elapsed,
        output_path.display()
    );

    Ok(EvaluationResult {
        strategy: name.to_string(),
        model: model.kind().to_string(),
        score,
        artifact: output_path.to_path_buf(),
        elapsed_secs: elapsed.as_secs_f64(),
    })
}
