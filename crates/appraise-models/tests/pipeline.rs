//! End-to-end tests: CSV in, four strategies, artifacts and report out.

use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use appraise_models::config::{ModelConfig, ModelType, RetryPolicy, RunConfig};
use appraise_models::data_handling::{Dataset, TestSet, TrainingSet};
use appraise_models::evaluation;
use appraise_models::io::read_dataset;
use appraise_models::models::factory;
use appraise_models::models::{FittedModel, TrainingStrategy};
use appraise_models::orchestrator::{run_from_config, Orchestrator};
use appraise_models::persistence::{load_model, model_path};
use appraise_models::report::{RunReport, StrategyOutcome, REPORT_FILE_NAME};
use appraise_models::runtime::{CancellationToken, ExecutionOptions};
use appraise_models::{AppraiseError, ErrorKind, Result};

const STRATEGY_NAMES: [&str; 4] = [
    "LinearRegression",
    "DecisionTree",
    "RandomForest",
    "GradientBoostedTrees",
];

/// 1000 synthetic houses with 5 features and a noisy price label.
fn write_houses_csv(path: &Path) {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "sqft,bedrooms,age,lot,distance,price").unwrap();
    for _ in 0..1000 {
        let sqft: f64 = rng.gen_range(600.0..4000.0);
        let bedrooms = rng.gen_range(1..6) as f64;
        let age: f64 = rng.gen_range(0.0..80.0);
        let lot: f64 = rng.gen_range(0.05..2.0);
        let distance: f64 = rng.gen_range(0.5..40.0);
        let noise: f64 = rng.gen_range(-5000.0..5000.0);
        let price = 40_000.0 + 120.0 * sqft + 8_000.0 * bedrooms - 600.0 * age
            + 25_000.0 * lot
            - 1_500.0 * distance
            + noise;
        writeln!(
            file,
            "{:.2},{},{:.1},{:.3},{:.2},{:.2}",
            sqft, bedrooms, age, lot, distance, price
        )
        .unwrap();
    }
}

fn run_config(input: &Path, output: &Path) -> RunConfig {
    RunConfig {
        input_file: input.to_path_buf(),
        output_dir: output.to_path_buf(),
        num_threads: Some(4),
        ..RunConfig::default()
    }
}

fn rmse_of(report: &RunReport, name: &str) -> f64 {
    match report.outcome(name) {
        Some(StrategyOutcome::Succeeded(result)) => result.rmse(),
        other => panic!("{} did not succeed: {:?}", name, other),
    }
}

// ---------------------------------------------------------------------------
// Full run on 1000 records
// ---------------------------------------------------------------------------

#[test]
fn all_four_strategies_complete_and_write_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("houses.csv");
    write_houses_csv(&csv);
    let out = dir.path().join("model");

    let report = run_from_config(run_config(&csv, &out)).unwrap();

    assert_eq!(report.train_size + report.test_size, 1000);
    assert!(
        (740..=860).contains(&report.train_size),
        "train size {} is far from 800",
        report.train_size
    );
    assert_eq!(report.outcomes.len(), 4);
    assert!(report.failed().is_empty(), "failures: {:?}", report.failed());

    for name in STRATEGY_NAMES {
        let rmse = rmse_of(&report, name);
        assert!(rmse.is_finite() && rmse >= 0.0, "{} rmse {}", name, rmse);
        let artifact = model_path(&out, name);
        assert!(artifact.exists(), "missing artifact {}", artifact.display());
        assert_eq!(load_model(&artifact).unwrap().strategy(), name);
    }
    assert!(out.join(REPORT_FILE_NAME).exists());
}

#[test]
fn reloaded_artifacts_reproduce_the_reported_metric() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("houses.csv");
    write_houses_csv(&csv);
    let out = dir.path().join("model");
    let config = run_config(&csv, &out);

    let report = run_from_config(config.clone()).unwrap();
    let dataset = read_dataset(&csv).unwrap();
    let (_, test_set) = dataset.split(config.split.train_ratio, config.split.seed).unwrap();

    for name in STRATEGY_NAMES {
        let reloaded = load_model(&model_path(&out, name)).unwrap();
        let rescored = evaluation::score(&reloaded, &test_set).unwrap();
        let reported = rmse_of(&report, name);
        assert!(
            (rescored.rmse - reported).abs() <= 1e-9 * reported.max(1.0),
            "{}: reloaded rmse {} != reported {}",
            name,
            rescored.rmse,
            reported
        );
    }
}

#[test]
fn fresh_and_reloaded_models_predict_identically() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("houses.csv");
    write_houses_csv(&csv);
    let dataset = read_dataset(&csv).unwrap();
    let (train, test) = dataset.split(0.8, 11).unwrap();
    let rows: Vec<&[f64]> = test.iter().map(|r| r.features()).collect();

    for strategy in factory::build_strategies(&RunConfig::default().strategies) {
        let fitted = strategy.fit(&train, &CancellationToken::new()).unwrap();
        let path = model_path(dir.path(), strategy.name());
        appraise_models::persistence::save_model(&fitted, &path).unwrap();
        let reloaded = load_model(&path).unwrap();

        let fresh = fitted.predict_batch(&rows).unwrap();
        let again = reloaded.predict_batch(&rows).unwrap();
        for (a, b) in fresh.iter().zip(&again) {
            assert!(
                (a - b).abs() <= 1e-9 * a.abs().max(1.0),
                "{}: {} vs {}",
                strategy.name(),
                a,
                b
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Failure isolation and independence
// ---------------------------------------------------------------------------

#[test]
fn corrupted_hyperparameters_fail_only_that_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("houses.csv");
    write_houses_csv(&csv);
    let mut config = run_config(&csv, &dir.path().join("model"));
    config.strategies[0] = ModelConfig::new(ModelType::LinearRegression {
        iterations: 100,
        step_size: -1.0,
    });

    let report = run_from_config(config).unwrap();
    assert_eq!(report.succeeded().len(), 3);
    match report.outcome("LinearRegression").unwrap() {
        StrategyOutcome::Failed { kind, message, .. } => {
            assert_eq!(*kind, ErrorKind::TrainingFailure);
            assert!(message.contains("step_size"));
        }
        other => panic!("expected a failure, got {:?}", other),
    }
    for name in &STRATEGY_NAMES[1..] {
        assert!(rmse_of(&report, name).is_finite());
    }
}

#[test]
fn blocked_artifact_directory_fails_only_that_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("houses.csv");
    write_houses_csv(&csv);
    let out = dir.path().join("model");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join("RandomForest"), "not a directory").unwrap();

    let mut config = run_config(&csv, &out);
    config.retry = RetryPolicy {
        max_attempts: 2,
        initial_backoff_ms: 1,
    };
    let report = run_from_config(config).unwrap();

    match report.outcome("RandomForest").unwrap() {
        StrategyOutcome::Failed { kind, message, .. } => {
            assert_eq!(*kind, ErrorKind::PersistenceFailure);
            assert!(message.contains("gave up after 2 attempt(s)"), "{}", message);
        }
        other => panic!("expected a persistence failure, got {:?}", other),
    }
    assert_eq!(report.succeeded().len(), 3);
    for name in ["LinearRegression", "DecisionTree", "GradientBoostedTrees"] {
        assert!(model_path(&out, name).exists(), "missing artifact for {}", name);
    }
    assert!(out.join(REPORT_FILE_NAME).is_file());
}

#[test]
fn removing_a_strategy_leaves_the_others_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("houses.csv");
    write_houses_csv(&csv);

    let full = run_from_config(run_config(&csv, &dir.path().join("all"))).unwrap();

    let mut reduced_config = run_config(&csv, &dir.path().join("reduced"));
    reduced_config
        .strategies
        .retain(|s| s.strategy_name() != "DecisionTree");
    let reduced = run_from_config(reduced_config).unwrap();

    assert!(reduced.outcome("DecisionTree").is_none());
    for name in ["LinearRegression", "RandomForest", "GradientBoostedTrees"] {
        let a = rmse_of(&full, name);
        let b = rmse_of(&reduced, name);
        assert!((a - b).abs() <= 1e-12 * a.max(1.0), "{}: {} vs {}", name, a, b);
    }
}

#[test]
fn missing_input_file_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_from_config(run_config(
        &dir.path().join("nope.csv"),
        &dir.path().join("model"),
    ))
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LoadFailure);
}

// ---------------------------------------------------------------------------
// Timeouts, cancellation and backend panics
// ---------------------------------------------------------------------------

/// Sleeps in small steps until cancelled, or panics when asked to.
#[derive(Clone)]
struct SlowStrategy {
    name: String,
    panic: bool,
}

impl TrainingStrategy for SlowStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn hyperparameters(&self) -> ModelType {
        ModelType::linear_regression()
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn fit(&self, _training_set: &TrainingSet, cancel: &CancellationToken) -> Result<FittedModel> {
        if self.panic {
            panic!("backend exploded");
        }
        for _ in 0..400 {
            if cancel.is_cancelled() {
                return Err(AppraiseError::Timeout("observed cancellation".to_string()));
            }
            thread::sleep(Duration::from_millis(10));
        }
        Err(AppraiseError::Training("slow strategy was never cancelled".to_string()))
    }

    fn boxed_clone(&self) -> Box<dyn TrainingStrategy> {
        Box::new(self.clone())
    }
}

fn small_dataset() -> Dataset {
    let records = (0..50)
        .map(|i| appraise_models::data_handling::LabeledRecord::new(vec![i as f64], 2.0 * i as f64))
        .collect();
    Dataset::from_records(records)
}

#[test]
fn fit_exceeding_the_timeout_reports_timeout_failure() {
    let dir = tempfile::tempdir().unwrap();
    let (train, test) = small_dataset().split(0.8, 11).unwrap();
    let strategy = SlowStrategy {
        name: "Slow".to_string(),
        panic: false,
    };
    let options = ExecutionOptions {
        fit_timeout: Some(Duration::from_millis(100)),
        ..ExecutionOptions::default()
    };

    let started = std::time::Instant::now();
    let err = strategy
        .execute(&train, &test, &model_path(dir.path(), "Slow"), &options)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TimeoutFailure);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(!model_path(dir.path(), "Slow").exists());
}

#[test]
fn timeout_in_one_strategy_does_not_block_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig {
        output_dir: dir.path().to_path_buf(),
        fit_timeout_secs: Some(1),
        num_threads: Some(2),
        ..RunConfig::default()
    };
    let mut strategies = factory::build_strategies(&[ModelConfig::new(ModelType::decision_tree())]);
    strategies.push(Box::new(SlowStrategy {
        name: "Slow".to_string(),
        panic: false,
    }));

    let report = Orchestrator::new(config).unwrap().run(&small_dataset(), strategies).unwrap();
    assert!(rmse_of(&report, "DecisionTree").is_finite());
    match report.outcome("Slow").unwrap() {
        StrategyOutcome::Failed { kind, .. } => assert_eq!(*kind, ErrorKind::TimeoutFailure),
        other => panic!("expected a timeout, got {:?}", other),
    }
}

#[test]
fn panicking_backend_becomes_a_training_failure() {
    let dir = tempfile::tempdir().unwrap();
    let (train, test): (TrainingSet, TestSet) = small_dataset().split(0.8, 11).unwrap();
    let strategy = SlowStrategy {
        name: "Panics".to_string(),
        panic: true,
    };
    let err = strategy
        .execute(&train, &test, &model_path(dir.path(), "Panics"), &ExecutionOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TrainingFailure);
    assert!(err.to_string().contains("backend exploded"));
}
