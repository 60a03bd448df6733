//! Execution resources shared by a training run.
//!
//! `ComputeContext` owns the worker pool that runs strategies in parallel. It
//! is acquired once per run and released when dropped, so every exit path
//! (including early errors) tears it down exactly once.
//!
//! Each fit runs on a dedicated thread and is awaited with an optional
//! deadline. On expiry or cancellation the caller gets a timeout error
//! immediately; the worker's cancellation token is flipped and its eventual
//! result is discarded.
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::RetryPolicy;
use crate::data_handling::TrainingSet;
use crate::error::{AppraiseError, Result};
use crate::models::{FittedModel, TrainingStrategy};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Cooperative cancellation flag.
///
/// A child token reports cancelled when it or any of its ancestors has been
/// cancelled; cancelling a child leaves its ancestors untouched.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    ancestors: Vec<Arc<AtomicBool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.ancestors.iter().any(|a| a.load(Ordering::SeqCst))
    }

    pub fn child(&self) -> Self {
        let mut ancestors = self.ancestors.clone();
        ancestors.push(Arc::clone(&self.flag));
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            ancestors,
        }
    }
}

/// Per-invocation knobs for `TrainingStrategy::execute`.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    pub fit_timeout: Option<Duration>,
    pub cancel: CancellationToken,
    pub retry: RetryPolicy,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            fit_timeout: None,
            cancel: CancellationToken::new(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Worker pool shared by all strategies of a run.
pub struct ComputeContext {
    pool: rayon::ThreadPool,
}

impl ComputeContext {
    /// Start the pool. `None` lets rayon pick one thread per core.
    pub fn acquire(num_threads: Option<usize>) -> Result<Self> {
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("appraise-worker-{}", i));
        if let Some(n) = num_threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| AppraiseError::Config(format!("failed to start compute pool: {}", e)))?;

        log::info!(
            "[appraise::runtime] Acquired compute context with {} worker threads",
            pool.current_num_threads()
        );
        Ok(Self { pool })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` inside the pool so rayon parallel iterators use its workers.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

impl Drop for ComputeContext {
    fn drop(&mut self) {
        log::info!(
            "[appraise::runtime] Released compute context ({} worker threads)",
            self.pool.current_num_threads()
        );
    }
}

/// Fit `strategy` on a dedicated thread, bounded by `options.fit_timeout` and
/// `options.cancel`.
pub fn fit_with_deadline<S>(
    strategy: &S,
    training_set: &TrainingSet,
    options: &ExecutionOptions,
) -> Result<FittedModel>
where
    S: TrainingStrategy + ?Sized,
{
    let name = strategy.name().to_string();
    if options.cancel.is_cancelled() {
        return Err(AppraiseError::Timeout(format!(
            "{} cancelled before fitting started",
            name
        )));
    }

    let token = options.cancel.child();
    let worker_token = token.clone();
    let worker = strategy.boxed_clone();
    let worker_set = training_set.clone();
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name(format!("fit-{}", name))
        .spawn(move || {
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| worker.fit(&worker_set, &worker_token)));
            // The receiver is gone when the fit was abandoned.
            let _ = tx.send(outcome);
        })
        .map_err(|e| AppraiseError::Training(format!("failed to spawn fit worker: {}", e)))?;

    let started = Instant::now();
    loop {
        let wait = match options.fit_timeout {
            Some(limit) => {
                let elapsed = started.elapsed();
                if elapsed >= limit {
                    token.cancel();
                    return Err(AppraiseError::Timeout(format!(
                        "{} exceeded the fit timeout of {:?}",
                        name, limit
                    )));
                }
                (limit - elapsed).min(POLL_INTERVAL)
            }
            None => POLL_INTERVAL,
        };

        match rx.recv_timeout(wait) {
            Ok(Ok(result)) => return result,
            Ok(Err(payload)) => {
                return Err(AppraiseError::Training(format!(
                    "{} backend panicked: {}",
                    name,
                    panic_message(payload.as_ref())
                )))
            }
            Err(RecvTimeoutError::Timeout) => {
                if options.cancel.is_cancelled() {
                    token.cancel();
                    return Err(AppraiseError::Timeout(format!("{} cancelled during fit", name)));
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(AppraiseError::Training(format!(
                    "{} fit worker exited without a result",
                    name
                )))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
