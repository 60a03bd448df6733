//! Delimited-text dataset reader.
//!
//! The file carries a header row; every following row is one record whose
//! last column is the label and whose preceding columns are the features.
//! Any malformed row fails the whole load.
use std::path::Path;

use csv::StringRecord;

use crate::data_handling::{Dataset, LabeledRecord};
use crate::error::{AppraiseError, Result};

#[derive(Debug, Clone, Default)]
pub struct CsvReaderConfig {
    /// Field delimiter. When `None`, `.tsv` files use a tab and everything
    /// else a comma.
    pub delimiter: Option<u8>,
}

/// Read a labeled dataset with the default configuration.
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    read_dataset_with_config(path, &CsvReaderConfig::default())
}

pub fn read_dataset_with_config<P: AsRef<Path>>(
    path: P,
    config: &CsvReaderConfig,
) -> Result<Dataset> {
    let path = path.as_ref();
    let delimiter = config.delimiter.unwrap_or_else(|| infer_delimiter(path));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| AppraiseError::load(path, e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| AppraiseError::load(path, format!("failed to read header row: {}", e)))?
        .clone();

    if headers.len() < 2 {
        return Err(AppraiseError::load(
            path,
            format!(
                "expected at least one feature column and a label column, found {} column(s)",
                headers.len()
            ),
        ));
    }

    let n_columns = headers.len();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row.map_err(|e| AppraiseError::load(path, e.to_string()))?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        if row.len() != n_columns {
            return Err(AppraiseError::load(
                path,
                format!(
                    "line {}: expected {} fields, found {}",
                    line,
                    n_columns,
                    row.len()
                ),
            ));
        }

        let values = parse_row(&row, &headers, line).map_err(|msg| AppraiseError::load(path, msg))?;
        let (label, features) = values
            .split_last()
            .ok_or_else(|| AppraiseError::load(path, format!("line {}: empty row", line)))?;
        records.push(LabeledRecord::new(features.to_vec(), *label));
    }

    if records.is_empty() {
        return Err(AppraiseError::load(path, "file contains no data rows"));
    }

    let mut names: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let label_name = names.pop().unwrap_or_default();

    log::info!(
        "[appraise::io] Loaded {} records with {} features from {}",
        records.len(),
        names.len(),
        path.display()
    );

    Ok(Dataset::new(names, label_name, records))
}

fn parse_row(
    row: &StringRecord,
    headers: &StringRecord,
    line: u64,
) -> std::result::Result<Vec<f64>, String> {
    row.iter()
        .enumerate()
        .map(|(col, field)| {
            let value = field.parse::<f64>().map_err(|_| {
                format!(
                    "line {}: column '{}' holds non-numeric value '{}'",
                    line,
                    headers.get(col).unwrap_or("?"),
                    field
                )
            })?;
            if !value.is_finite() {
                return Err(format!(
                    "line {}: column '{}' holds non-finite value '{}'",
                    line,
                    headers.get(col).unwrap_or("?"),
                    field
                ));
            }
            Ok(value)
        })
        .collect()
}

fn infer_delimiter(path: &Path) -> u8 {
    let is_tsv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("tsv"))
        .unwrap_or(false);
    if is_tsv {
        b'\t'
    } else {
        b','
    }
}
