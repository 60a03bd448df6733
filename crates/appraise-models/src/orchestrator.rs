//! Drives a training run: one split, every strategy in parallel, one report.
use rayon::prelude::*;

use crate::config::{ensure_unique_names, RunConfig};
use crate::data_handling::Dataset;
use crate::error::Result;
use crate::io;
use crate::models::factory;
use crate::models::TrainingStrategy;
use crate::persistence;
use crate::report::{RunReport, StrategyOutcome, REPORT_FILE_NAME};
use crate::runtime::{CancellationToken, ComputeContext, ExecutionOptions};
use crate::stats;

pub struct Orchestrator {
    config: RunConfig,
    context: ComputeContext,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Validate `config` and acquire the compute context for the run.
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        let context = ComputeContext::acquire(config.num_threads)?;
        Ok(Self {
            config,
            context,
            cancel: CancellationToken::new(),
        })
    }

    /// Use `token` to abort pending and running fits from outside the run.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Split `dataset` once and run every strategy against the shared split.
    ///
    /// A failing strategy is recorded in the report and does not stop the
    /// others. Outcomes keep the order of `strategies`. The compute context is
    /// released before this returns, whatever the outcome.
    pub fn run(
        self,
        dataset: &Dataset,
        strategies: Vec<Box<dyn TrainingStrategy>>,
    ) -> Result<RunReport> {
        let Orchestrator {
            config,
            context,
            cancel,
        } = self;

        ensure_unique_names(strategies.iter().map(|s| s.name().to_string()))?;
        let (training_set, test_set) = dataset.split(config.split.train_ratio, config.split.seed)?;
        log::info!(
            "[appraise::orchestrator] Running {} strategies on {} training / {} test records \
             ({} threads)",
            strategies.len(),
            training_set.len(),
            test_set.len(),
            context.num_threads()
        );

        let options = ExecutionOptions {
            fit_timeout: config.fit_timeout(),
            cancel,
            retry: config.retry,
        };

        let outcomes: Vec<StrategyOutcome> = context.install(|| {
            strategies
                .par_iter()
                .map(|strategy| {
                    let name = strategy.name();
                    let path = persistence::model_path(&config.output_dir, name);
                    match strategy.execute(&training_set, &test_set, &path, &options) {
                        Ok(result) => StrategyOutcome::Succeeded(result),
                        Err(err) => {
                            log::error!(
                                "[appraise::{}] {} during run: {}",
                                name,
                                err.kind(),
                                err
                            );
                            StrategyOutcome::failed(name, &err)
                        }
                    }
                })
                .collect()
        });

        let report = RunReport::new(training_set.len(), test_set.len(), outcomes);
        report.log_summary();

        let report_path = config.output_dir.join(REPORT_FILE_NAME);
        match report.write_json(&report_path) {
            Ok(()) => log::info!(
                "[appraise::orchestrator] Report written to {}",
                report_path.display()
            ),
            Err(err) => log::warn!("[appraise::orchestrator] Could not write report: {}", err),
        }

        drop(context);
        Ok(report)
    }

    /// Run the strategies listed in the configuration.
    pub fn run_configured(self, dataset: &Dataset) -> Result<RunReport> {
        let strategies = factory::build_strategies(&self.config.strategies);
        self.run(dataset, strategies)
    }
}

/// Load the configured dataset, log its overview and run every configured
/// strategy. A dataset that fails to load aborts the run.
pub fn run_from_config(config: RunConfig) -> Result<RunReport> {
    config.validate()?;
    let dataset = io::read_dataset(&config.input_file)?;
    stats::log_dataset_overview(&dataset);
    Orchestrator::new(config)?.run_configured(&dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelConfig, ModelType};
    use crate::data_handling::LabeledRecord;
    use crate::error::ErrorKind;

    fn dataset() -> Dataset {
        let records = (0..120)
            .map(|i| {
                let a = (i % 12) as f64;
                let b = ((i * 5) % 7) as f64;
                LabeledRecord::new(vec![a, b], 4.0 * a - b + 10.0)
            })
            .collect();
        Dataset::from_records(records)
    }

    fn config(output_dir: &std::path::Path) -> RunConfig {
        RunConfig {
            output_dir: output_dir.to_path_buf(),
            num_threads: Some(2),
            ..RunConfig::default()
        }
    }

    #[test]
    fn duplicate_strategy_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(config(dir.path())).unwrap();
        let strategies = factory::build_strategies(&[
            ModelConfig::new(ModelType::decision_tree()),
            ModelConfig::new(ModelType::decision_tree()),
        ]);
        let err = orchestrator.run(&dataset(), strategies).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigFailure);
    }

    #[test]
    fn outcomes_follow_configured_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.strategies = vec![
            ModelConfig::new(ModelType::gradient_boosted_trees()),
            ModelConfig::new(ModelType::linear_regression()),
        ];
        let report = Orchestrator::new(cfg).unwrap().run_configured(&dataset()).unwrap();
        let names: Vec<&str> = report.outcomes.iter().map(|o| o.strategy()).collect();
        assert_eq!(names, vec!["GradientBoostedTrees", "LinearRegression"]);
        assert!(dir.path().join(REPORT_FILE_NAME).exists());
    }

    #[test]
    fn token_cancelled_through_the_orchestrator_stops_every_fit() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::new(config(dir.path())).unwrap();
        assert_eq!(orchestrator.config().num_threads, Some(2));
        orchestrator.cancellation_token().cancel();

        let report = orchestrator.run_configured(&dataset()).unwrap();
        assert_eq!(report.failed().len(), 4);
    }

    #[test]
    fn cancelled_run_reports_timeouts() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let report = Orchestrator::new(config(dir.path()))
            .unwrap()
            .with_cancellation(token)
            .run_configured(&dataset())
            .unwrap();
        assert!(report.succeeded().is_empty());
        for outcome in &report.outcomes {
            match outcome {
                StrategyOutcome::Failed { kind, .. } => {
                    assert_eq!(*kind, ErrorKind::TimeoutFailure)
                }
                other => panic!("unexpected outcome {:?}", other),
            }
        }
    }
}
