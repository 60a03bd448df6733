use anyhow::Result;
use log::LevelFilter;
use std::path::{Path, PathBuf};

use appraise_cli::cli::build_cli;
use appraise_cli::inspect::run_stats;
use appraise_cli::predict::{run_prediction, write_predictions};
use appraise_cli::train::input::run_config_from_arguments;
use appraise_cli::train::trainer;
use appraise_cli::util::validate_tsv_or_csv_file;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("APPRAISE_LOG", "error,appraise=info"))
        .init();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("train", train_matches)) => {
            let config_path: Option<&PathBuf> = train_matches.get_one("config");
            match config_path {
                Some(path) => log::info!("[appraise::train] Training from config: {:?}", path),
                None => log::info!("[appraise::train] No config provided; using defaults."),
            }

            let config = run_config_from_arguments(config_path, train_matches)?;
            match trainer::run_training(config) {
                Ok(_) => Ok(()),
                Err(e) => {
                    log::error!("Training failed: {:#}", e);
                    std::process::exit(1)
                }
            }
        }
        Some(("stats", stats_matches)) => {
            let data: &String = stats_matches
                .get_one("data")
                .ok_or_else(|| anyhow::anyhow!("missing dataset path"))?;
            validate_tsv_or_csv_file(data)?;
            let summary = run_stats(Path::new(data))?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Some(("predict", predict_matches)) => {
            let model_path: &PathBuf = predict_matches
                .get_one("model_path")
                .ok_or_else(|| anyhow::anyhow!("missing model path"))?;
            let data: &String = predict_matches
                .get_one("data")
                .ok_or_else(|| anyhow::anyhow!("missing dataset path"))?;
            validate_tsv_or_csv_file(data)?;

            let run = run_prediction(model_path, Path::new(data))?;
            if let Some(output) = predict_matches.get_one::<PathBuf>("output_file") {
                write_predictions(&run, output)?;
            }
            eprintln!(
                "[appraise::predict] {}: MSE = {:.6}, RMSE = {:.6} over {} records",
                run.strategy, run.score.mse, run.score.rmse, run.score.n_samples
            );
            Ok(())
        }
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}
