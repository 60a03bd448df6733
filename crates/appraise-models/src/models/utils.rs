use smartcore::error::Failed;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::data_handling::TrainingSet;
use crate::error::{AppraiseError, Result};

/// Row-major features and labels of a training set, after checking that it
/// is non-empty, rectangular and finite.
pub fn training_matrix(training_set: &TrainingSet) -> Result<(Vec<Vec<f64>>, Vec<f64>)> {
    let first = training_set
        .get(0)
        .ok_or_else(|| AppraiseError::Training("training set is empty".to_string()))?;
    let n_features = first.n_features();
    if n_features == 0 {
        return Err(AppraiseError::Training("training records carry no features".to_string()));
    }

    let mut rows = Vec::with_capacity(training_set.len());
    let mut labels = Vec::with_capacity(training_set.len());
    for (i, record) in training_set.iter().enumerate() {
        if record.n_features() != n_features {
            return Err(AppraiseError::Training(format!(
                "inconsistent feature vector length: record {} has {} features, expected {}",
                i,
                record.n_features(),
                n_features
            )));
        }
        if !record.label().is_finite() || record.features().iter().any(|v| !v.is_finite()) {
            return Err(AppraiseError::Training(format!(
                "record {} contains a non-finite value",
                i
            )));
        }
        rows.push(record.features().to_vec());
        labels.push(record.label());
    }
    Ok((rows, labels))
}

pub fn dense_matrix(rows: &Vec<Vec<f64>>) -> std::result::Result<DenseMatrix<f64>, Failed> {
    DenseMatrix::from_2d_vec(rows)
}
