use anyhow::{Context, Result};
use clap::ArgMatches;
use std::path::PathBuf;
use std::str::FromStr;

use appraise_models::config::{ModelConfig, ModelType, RunConfig};

use crate::util::validate_tsv_or_csv_file;

/// Build the run configuration from an optional JSON file plus command line
/// overrides.
pub fn run_config_from_arguments(
    config_path: Option<&PathBuf>,
    matches: &ArgMatches,
) -> Result<RunConfig> {
    let mut config = match config_path {
        Some(path) => RunConfig::from_json_file(path)
            .with_context(|| format!("Failed to load run configuration: {:?}", path))?,
        None => RunConfig::default(),
    };

    // Apply CLI overrides
    if let Some(input) = matches.get_one::<String>("input") {
        validate_tsv_or_csv_file(input)?;
        config.input_file = PathBuf::from(input);
    } else {
        validate_tsv_or_csv_file(&config.input_file.to_string_lossy())?;
    }

    if let Some(output_dir) = matches.get_one::<PathBuf>("output_dir") {
        config.output_dir = output_dir.clone();
    }

    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.split.seed = *seed;
    }

    if let Some(ratio) = matches.get_one::<f64>("train_ratio") {
        config.split.train_ratio = *ratio;
    }

    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config.fit_timeout_secs = Some(*timeout);
    }

    if let Some(threads) = matches.get_one::<usize>("threads") {
        config.num_threads = Some(*threads);
    }

    if let Some(models) = matches.get_many::<String>("model") {
        config.strategies = models
            .map(|m| ModelType::from_str(m).map(ModelConfig::new))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(anyhow::Error::msg)?;
    }

    config.validate().context("Invalid run configuration")?;
    Ok(config)
}
