//! Model artifacts on disk.
//!
//! Each strategy writes `<output_dir>/<strategy>/model.json`. The file is
//! written to a temporary sibling first and renamed into place, so a reader
//! never sees a half-written artifact.
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;

use crate::config::RetryPolicy;
use crate::error::{AppraiseError, ErrorKind, Result};
use crate::models::FittedModel;

pub const MODEL_FILE_NAME: &str = "model.json";

/// Artifact path of strategy `name` under `output_dir`.
pub fn model_path(output_dir: &Path, name: &str) -> PathBuf {
    output_dir.join(name).join(MODEL_FILE_NAME)
}

pub fn save_model(model: &FittedModel, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AppraiseError::persistence(path, e))?;
    }

    let tmp = path.with_extension("json.tmp");
    let file = File::create(&tmp).map_err(|e| AppraiseError::persistence(&tmp, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, model).map_err(|e| AppraiseError::persistence(&tmp, e))?;
    writer.flush().map_err(|e| AppraiseError::persistence(&tmp, e))?;
    drop(writer);

    fs::rename(&tmp, path).map_err(|e| AppraiseError::persistence(path, e))?;
    log::debug!("[appraise::persistence] wrote {}", path.display());
    Ok(())
}

pub fn load_model(path: &Path) -> Result<FittedModel> {
    let file = File::open(path).map_err(|e| AppraiseError::persistence(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| AppraiseError::persistence(path, e))
}

/// Run `op` until it succeeds, fails with something other than a
/// persistence error, or `policy.max_attempts` is used up. An exhausted
/// persistence error reports how many attempts were made.
pub fn with_retry<T, F>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.kind() == ErrorKind::PersistenceFailure && attempt < max_attempts => {
                let delay = policy.backoff(attempt);
                log::warn!(
                    "[appraise::persistence] {} attempt {}/{} failed: {}; retrying in {:?}",
                    label,
                    attempt,
                    max_attempts,
                    err,
                    delay
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(AppraiseError::Persistence { path, message }) => {
                return Err(AppraiseError::Persistence {
                    path,
                    message: format!("{} (gave up after {} attempt(s))", message, attempt),
                })
            }
            Err(err) => return Err(err),
        }
    }
}

pub fn save_with_retry(model: &FittedModel, path: &Path, policy: &RetryPolicy) -> Result<()> {
    with_retry(policy, model.strategy(), || save_model(model, path))
}
