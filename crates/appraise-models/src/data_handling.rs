//! Labeled records, the immutable dataset and its seeded train/test split.
//!
//! Records are stored once behind an `Arc<[LabeledRecord]>`; the training and
//! test sets are index views over that shared storage, so every strategy in a
//! run reads the same data without copying or mutating it.
use std::ops::Deref;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{AppraiseError, Result};

/// Ordered numeric attributes of one record, excluding the label.
pub type FeatureVector = Box<[f64]>;

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    features: FeatureVector,
    label: f64,
}

impl LabeledRecord {
    pub fn new(features: Vec<f64>, label: f64) -> Self {
        Self {
            features: features.into_boxed_slice(),
            label,
        }
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    pub fn label(&self) -> f64 {
        self.label
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    feature_names: Vec<String>,
    label_name: String,
    records: Arc<[LabeledRecord]>,
}

impl Dataset {
    pub fn new(
        feature_names: Vec<String>,
        label_name: String,
        records: Vec<LabeledRecord>,
    ) -> Self {
        Self {
            feature_names,
            label_name,
            records: records.into(),
        }
    }

    /// Build a dataset with generated column names (`f0`, `f1`, ..., `label`).
    pub fn from_records(records: Vec<LabeledRecord>) -> Self {
        let n_features = records.first().map(|r| r.n_features()).unwrap_or(0);
        let feature_names = (0..n_features).map(|i| format!("f{}", i)).collect();
        Self::new(feature_names, "label".to_string(), records)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    pub fn records(&self) -> &[LabeledRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// All values of feature column `col`, in record order.
    pub fn feature_column(&self, col: usize) -> Vec<f64> {
        self.records.iter().map(|r| r.features()[col]).collect()
    }

    /// Split into a training and a test set.
    ///
    /// Each record draws one uniform value from a ChaCha8 stream seeded with
    /// `seed` and goes to the training side when the draw is below
    /// `train_ratio`. Both sides keep the original record order.
    pub fn split(&self, train_ratio: f64, seed: u64) -> Result<(TrainingSet, TestSet)> {
        if !(train_ratio > 0.0 && train_ratio < 1.0) {
            return Err(AppraiseError::Config(format!(
                "train_ratio must lie strictly between 0 and 1, got {}",
                train_ratio
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut train_idx = Vec::with_capacity((self.len() as f64 * train_ratio) as usize + 1);
        let mut test_idx = Vec::new();

        for i in 0..self.len() {
            if rng.gen::<f64>() < train_ratio {
                train_idx.push(i);
            } else {
                test_idx.push(i);
            }
        }

        log::debug!(
            "[appraise::data] split {} records into {} train / {} test (ratio {}, seed {})",
            self.len(),
            train_idx.len(),
            test_idx.len(),
            train_ratio,
            seed
        );

        Ok((
            TrainingSet(Partition::new(Arc::clone(&self.records), train_idx)),
            TestSet(Partition::new(Arc::clone(&self.records), test_idx)),
        ))
    }
}

/// A read-only view over a subset of a dataset's records.
#[derive(Debug, Clone)]
pub struct Partition {
    records: Arc<[LabeledRecord]>,
    indices: Arc<[usize]>,
}

impl Partition {
    fn new(records: Arc<[LabeledRecord]>, indices: Vec<usize>) -> Self {
        Self {
            records,
            indices: indices.into(),
        }
    }

    fn owned(records: Vec<LabeledRecord>) -> Self {
        let indices: Vec<usize> = (0..records.len()).collect();
        Self::new(records.into(), indices)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Positions of this partition's records in the parent dataset.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn get(&self, i: usize) -> Option<&LabeledRecord> {
        self.indices.get(i).map(|&idx| &self.records[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabeledRecord> + '_ {
        self.indices.iter().map(move |&idx| &self.records[idx])
    }

    pub fn labels(&self) -> Vec<f64> {
        self.iter().map(|r| r.label()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct TrainingSet(Partition);

impl TrainingSet {
    pub fn from_records(records: Vec<LabeledRecord>) -> Self {
        TrainingSet(Partition::owned(records))
    }
}

impl Deref for TrainingSet {
    type Target = Partition;

    fn deref(&self) -> &Partition {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct TestSet(Partition);

impl TestSet {
    pub fn from_records(records: Vec<LabeledRecord>) -> Self {
        TestSet(Partition::owned(records))
    }
}

impl Deref for TestSet {
    type Target = Partition;

    fn deref(&self) -> &Partition {
        &self.0
    }
}
