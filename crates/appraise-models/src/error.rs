use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppraiseError>;

/// Failure category, used to group errors in run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    LoadFailure,
    ConfigFailure,
    TrainingFailure,
    PredictionFailure,
    EvaluationFailure,
    PersistenceFailure,
    TimeoutFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ErrorKind::LoadFailure => "LoadFailure",
            ErrorKind::ConfigFailure => "ConfigFailure",
            ErrorKind::TrainingFailure => "TrainingFailure",
            ErrorKind::PredictionFailure => "PredictionFailure",
            ErrorKind::EvaluationFailure => "EvaluationFailure",
            ErrorKind::PersistenceFailure => "PersistenceFailure",
            ErrorKind::TimeoutFailure => "TimeoutFailure",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AppraiseError {
    #[error("failed to load dataset from {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("training failed: {0}")]
    Training(String),

    #[error("prediction failed: model expects {expected} features, record has {actual}")]
    Prediction { expected: usize, actual: usize },

    #[error("evaluation failed: {0}")]
    Evaluation(String),

    #[error("failed to persist model at {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },

    #[error("fit aborted: {0}")]
    Timeout(String),
}

impl AppraiseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppraiseError::Load { .. } => ErrorKind::LoadFailure,
            AppraiseError::Config(_) => ErrorKind::ConfigFailure,
            AppraiseError::Training(_) => ErrorKind::TrainingFailure,
            AppraiseError::Prediction { .. } => ErrorKind::PredictionFailure,
            AppraiseError::Evaluation(_) => ErrorKind::EvaluationFailure,
            AppraiseError::Persistence { .. } => ErrorKind::PersistenceFailure,
            AppraiseError::Timeout(_) => ErrorKind::TimeoutFailure,
        }
    }

    pub(crate) fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        AppraiseError::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn persistence(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        AppraiseError::Persistence {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
