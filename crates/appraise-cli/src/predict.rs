use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use appraise_models::data_handling::Dataset;
use appraise_models::evaluation::{self, Score};
use appraise_models::io::read_dataset;
use appraise_models::persistence::load_model;

use crate::util::delimiter_for;

/// Predictions of a reloaded model on a labeled dataset.
#[derive(Debug)]
pub struct PredictionRun {
    pub strategy: String,
    pub labels: Vec<f64>,
    pub predictions: Vec<f64>,
    pub score: Score,
}

pub fn run_prediction(model_path: &Path, data_path: &Path) -> Result<PredictionRun> {
    let model = load_model(model_path)
        .with_context(|| format!("Failed to load model: {:?}", model_path))?;
    let dataset: Dataset = read_dataset(data_path)
        .with_context(|| format!("Failed to load dataset: {:?}", data_path))?;

    let rows: Vec<&[f64]> = dataset.records().iter().map(|r| r.features()).collect();
    let predictions = model.predict_batch(&rows)?;
    let labels: Vec<f64> = dataset.records().iter().map(|r| r.label()).collect();
    let mse = evaluation::mean_squared_error(&labels, &predictions)?;

    log::info!(
        "[appraise::predict] {} on {} records: MSE = {:.6}, RMSE = {:.6}",
        model.strategy(),
        labels.len(),
        mse,
        mse.sqrt()
    );

    Ok(PredictionRun {
        strategy: model.strategy().to_string(),
        score: Score::from_mse(mse, labels.len()),
        labels,
        predictions,
    })
}

/// Write `label,prediction` rows, delimited by the output file's extension.
pub fn write_predictions(run: &PredictionRun, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {:?}", output_path))?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter_for(output_path))
        .from_writer(BufWriter::new(file));

    writer.write_record(["label", "prediction"])?;
    for (label, prediction) in run.labels.iter().zip(&run.predictions) {
        writer.write_record([label.to_string(), prediction.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}
