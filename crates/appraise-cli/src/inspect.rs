use anyhow::{Context, Result};
use std::path::Path;

use appraise_models::io::read_dataset;
use appraise_models::stats::{self, DatasetSummary};

/// Load `path`, log its overview and return the per-column summary.
pub fn run_stats(path: &Path) -> Result<DatasetSummary> {
    let dataset =
        read_dataset(path).with_context(|| format!("Failed to load dataset: {:?}", path))?;
    stats::log_dataset_overview(&dataset);
    Ok(stats::summarize(&dataset))
}
