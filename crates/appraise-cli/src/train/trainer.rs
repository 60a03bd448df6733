use anyhow::{Context, Result};

use appraise_models::config::RunConfig;
use appraise_models::orchestrator;
use appraise_models::report::RunReport;

/// Run every configured strategy. Fails when no strategy produced a model.
pub fn run_training(config: RunConfig) -> Result<RunReport> {
    let output_dir = config.output_dir.clone();
    let report = orchestrator::run_from_config(config).context("Training run aborted")?;

    if report.succeeded().is_empty() {
        anyhow::bail!(
            "All {} strategies failed; see {:?} for details",
            report.outcomes.len(),
            output_dir.join(appraise_models::report::REPORT_FILE_NAME)
        );
    }
    if let Some(best) = report.best() {
        log::info!(
            "[appraise::train] Best strategy: {} (RMSE = {:.6})",
            best.strategy,
            best.rmse()
        );
    }
    Ok(report)
}
