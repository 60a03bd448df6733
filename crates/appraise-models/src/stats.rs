use std::fmt;

use serde::Serialize;
use statrs::statistics::Statistics;

use crate::data_handling::Dataset;

/// Column-wise summary of one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub mean: f64,
    /// Unbiased sample variance; NaN for a single record.
    pub variance: f64,
    pub num_nonzeros: usize,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub count: usize,
    pub columns: Vec<ColumnSummary>,
}

/// Summarize every feature column of `dataset` (the label is excluded).
pub fn summarize(dataset: &Dataset) -> DatasetSummary {
    let columns = dataset
        .feature_names()
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let values = dataset.feature_column(col);
            ColumnSummary {
                name: name.clone(),
                mean: values.iter().mean(),
                variance: values.iter().variance(),
                num_nonzeros: values.iter().filter(|v| **v != 0.0).count(),
                min: Statistics::min(values.iter()),
                max: Statistics::max(values.iter()),
            }
        })
        .collect();

    DatasetSummary {
        count: dataset.len(),
        columns,
    }
}

/// Pearson correlation matrix across feature columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }

    pub fn dim(&self) -> usize {
        self.names.len()
    }
}

/// Pairwise Pearson correlation of the feature columns.
///
/// The diagonal is always 1. A column with zero variance has undefined
/// correlation with every other column; those entries are NaN and a warning
/// names the column.
pub fn correlation_matrix(dataset: &Dataset) -> CorrelationMatrix {
    let n = dataset.n_features();
    let columns: Vec<Vec<f64>> = (0..n).map(|col| dataset.feature_column(col)).collect();
    let std_devs: Vec<f64> = columns.iter().map(|c| c.iter().std_dev()).collect();

    for (name, std_dev) in dataset.feature_names().iter().zip(&std_devs) {
        if !(*std_dev > 0.0) && n > 1 {
            log::warn!(
                "[appraise::stats] Column '{}' has zero variance; its correlations are NaN",
                name
            );
        }
    }

    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let denom = std_devs[i] * std_devs[j];
            let r = if i == j {
                1.0
            } else if !(denom > 0.0) {
                f64::NAN
            } else {
                let cov = columns[i].iter().covariance(columns[j].iter());
                (cov / denom).clamp(-1.0, 1.0)
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        names: dataset.feature_names().to_vec(),
        values,
    }
}

/// Log the descriptive statistics and the correlation matrix of the raw
/// feature data. Called once per run, before any training.
pub fn log_dataset_overview(dataset: &Dataset) {
    let summary = summarize(dataset);

    log::info!("[appraise::stats] Records: {}", summary.count);
    log::info!(
        "[appraise::stats] Summary Mean: [{}]",
        join_columns(&summary.columns, |c| format!("{:.4}", c.mean))
    );
    log::info!(
        "[appraise::stats] Summary Variance: [{}]",
        join_columns(&summary.columns, |c| format!("{:.4}", c.variance))
    );
    log::info!(
        "[appraise::stats] Summary Non-zero: [{}]",
        join_columns(&summary.columns, |c| c.num_nonzeros.to_string())
    );
    log::info!(
        "[appraise::stats] Correlation Matrix:\n{}",
        correlation_matrix(dataset)
    );
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, row) in self.values.iter().enumerate() {
            let cells: Vec<String> = row.iter().map(|v| format!("{:>8.4}", v)).collect();
            write!(f, "{:<16} {}", truncate(&self.names[i], 16), cells.join(" "))?;
            if i + 1 < self.values.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

fn join_columns<F>(columns: &[ColumnSummary], f: F) -> String
where
    F: Fn(&ColumnSummary) -> String,
{
    columns.iter().map(f).collect::<Vec<_>>().join(", ")
}

fn truncate(name: &str, width: usize) -> String {
    name.chars().take(width).collect()
}
