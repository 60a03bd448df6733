//! Integration tests for CLI argument handling, util helpers and the
//! predict command.

use std::io::Write;
use std::path::{Path, PathBuf};

use appraise_cli::cli::build_cli;
use appraise_cli::inspect::run_stats;
use appraise_cli::predict::{run_prediction, write_predictions};
use appraise_cli::train::input::run_config_from_arguments;
use appraise_cli::train::trainer::run_training;
use appraise_cli::util::{delimiter_for, validate_tsv_or_csv_file};
use appraise_models::config::RunConfig;

fn write_dataset(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "rooms,area,price").unwrap();
    for i in 0..60 {
        let rooms = (i % 5 + 1) as f64;
        let area = 40.0 + (i * 3 % 50) as f64;
        writeln!(f, "{},{},{}", rooms, area, 10_000.0 * rooms + 900.0 * area).unwrap();
    }
    path
}

fn train_matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["appraise", "train"];
    argv.extend_from_slice(args);
    let matches = build_cli().try_get_matches_from(argv).unwrap();
    matches.subcommand_matches("train").unwrap().clone()
}

// ---------------------------------------------------------------------------
// validate_tsv_or_csv_file
// ---------------------------------------------------------------------------

#[test]
fn validate_csv_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    std::fs::File::create(&path).unwrap();
    assert!(validate_tsv_or_csv_file(path.to_str().unwrap()).is_ok());
}

#[test]
fn validate_wrong_extension_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    std::fs::File::create(&path).unwrap();
    assert!(validate_tsv_or_csv_file(path.to_str().unwrap()).is_err());
}

#[test]
fn validate_nonexistent_file_errors() {
    assert!(validate_tsv_or_csv_file("/nonexistent/path/data.tsv").is_err());
}

#[test]
fn delimiter_follows_extension() {
    assert_eq!(delimiter_for(Path::new("out.TSV")), b'\t');
    assert_eq!(delimiter_for(Path::new("out.csv")), b',');
}

// ---------------------------------------------------------------------------
// train overrides
// ---------------------------------------------------------------------------

#[test]
fn overrides_replace_config_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_dataset(dir.path(), "houses.csv");
    let config_path = dir.path().join("run.json");
    std::fs::write(
        &config_path,
        r#"{
            "split": {"train_ratio": 0.7, "seed": 3},
            "strategies": [{"model": "decision_tree", "max_depth": 4}]
        }"#,
    )
    .unwrap();

    let matches = train_matches(&[
        config_path.to_str().unwrap(),
        "--input",
        data.to_str().unwrap(),
        "--seed",
        "11",
        "--timeout",
        "30",
        "-m",
        "rf",
        "-m",
        "linear",
    ]);
    let config = run_config_from_arguments(Some(&config_path), &matches).unwrap();

    assert_eq!(config.input_file, data);
    assert_eq!(config.split.seed, 11);
    assert_eq!(config.split.train_ratio, 0.7);
    assert_eq!(config.fit_timeout_secs, Some(30));
    let names: Vec<String> = config.strategies.iter().map(|s| s.strategy_name()).collect();
    assert_eq!(names, vec!["RandomForest", "LinearRegression"]);
}

#[test]
fn unknown_model_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_dataset(dir.path(), "houses.csv");
    let matches = train_matches(&["--input", data.to_str().unwrap(), "--model", "svm"]);
    assert!(run_config_from_arguments(None, &matches).is_err());
}

#[test]
fn invalid_ratio_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_dataset(dir.path(), "houses.csv");
    let matches = train_matches(&["--input", data.to_str().unwrap(), "--train-ratio", "1.5"]);
    assert!(run_config_from_arguments(None, &matches).is_err());
}

// ---------------------------------------------------------------------------
// train, stats and predict end to end
// ---------------------------------------------------------------------------

#[test]
fn trained_model_can_be_scored_by_predict() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_dataset(dir.path(), "houses.csv");
    let out = dir.path().join("model");
    let config = RunConfig {
        input_file: data.clone(),
        output_dir: out.clone(),
        num_threads: Some(2),
        ..RunConfig::default()
    };

    let report = run_training(config).unwrap();
    assert_eq!(report.succeeded().len(), 4);

    let run = run_prediction(&out.join("DecisionTree").join("model.json"), &data).unwrap();
    assert_eq!(run.strategy, "DecisionTree");
    assert_eq!(run.predictions.len(), 60);
    assert!(run.score.mse.is_finite() && run.score.mse >= 0.0);

    let output = dir.path().join("predictions.tsv");
    write_predictions(&run, &output).unwrap();
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("label\tprediction"));
    assert_eq!(text.lines().count(), 61);
}

#[test]
fn stats_summarizes_feature_columns() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_dataset(dir.path(), "houses.csv");
    let summary = run_stats(&data).unwrap();
    assert_eq!(summary.count, 60);
    assert_eq!(summary.columns.len(), 2);
    assert_eq!(summary.columns[0].name, "rooms");
}
