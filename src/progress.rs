//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressObserver`] for monitoring a batch run and
//! [`CancellationToken`] for cooperative cancellation at job boundaries.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use relevel::{
//!     BatchDriver, FfmpegTool, NormalizeConfig, ProgressObserver, ProgressUpdate,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressObserver for PrintProgress {
//!     fn on_progress(&self, update: &ProgressUpdate<'_>) {
//!         println!(
//!             "[{}/{}] {} {}",
//!             update.index,
//!             update.total,
//!             update.job.source().display(),
//!             update.job.status(),
//!         );
//!     }
//! }
//!
//! let driver = BatchDriver::new(FfmpegTool::from_environment(), NormalizeConfig::new())
//!     .with_observer(Arc::new(PrintProgress));
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use crate::job::Job;

/// A snapshot of batch progress, delivered once per resolved job.
///
/// This is the only per-item observable output of the driver.
#[derive(Debug)]
pub struct ProgressUpdate<'a> {
    /// 1-based position of the job in the batch.
    pub index: usize,
    /// Total number of jobs in the batch.
    pub total: usize,
    /// The job that just resolved, including its terminal status.
    pub job: &'a Job,
    /// Size of the source file in megabytes, when it could be read.
    pub input_megabytes: Option<f64>,
    /// Wall-clock time spent on this job.
    pub elapsed: Duration,
}

/// Trait for receiving progress updates during a batch run.
///
/// Implementations must be [`Send`] and [`Sync`]; observers are shared
/// behind an [`Arc`].
///
/// Observers are **infallible** — they observe but cannot halt the run. Use
/// [`CancellationToken`] for cooperative cancellation.
pub trait ProgressObserver: Send + Sync {
    /// Called after each job reaches its terminal state.
    fn on_progress(&self, update: &ProgressUpdate<'_>);
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no observer is configured.
pub(crate) struct NoOpProgress;

impl ProgressObserver for NoOpProgress {
    fn on_progress(&self, _update: &ProgressUpdate<'_>) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to request
/// cancellation. The driver checks
/// [`is_cancelled`](CancellationToken::is_cancelled) only at job boundaries
/// — an in-flight tool invocation is never interrupted, so no corrupt
/// partial output is left behind by cancellation itself.
///
/// # Example
///
/// ```
/// use relevel::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// // From another thread (or a signal handler, etc.):
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// All clones of this token will observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
