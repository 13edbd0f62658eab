//! Job bookkeeping and run-level statistics.
//!
//! A [`Job`] tracks one file through the batch: created `Pending` by
//! discovery, resolved exactly once by the driver to `Succeeded` or
//! `Failed`, and retained in memory for the final [`RunSummary`].

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One file's normalization task.
#[derive(Debug, Clone)]
pub struct Job {
    source: PathBuf,
    output: PathBuf,
    status: JobStatus,
}

impl Job {
    /// Create a pending job for `source`, writing to `output`.
    pub fn new(source: PathBuf, output: PathBuf) -> Self {
        Self {
            source,
            output,
            status: JobStatus::Pending,
        }
    }

    /// The source file to be normalized.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The derived output path (prefixed sibling of the source).
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Current status.
    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    /// Whether the job has reached a terminal state.
    pub fn is_resolved(&self) -> bool {
        !matches!(self.status, JobStatus::Pending)
    }

    /// Move the job to its terminal state. Called exactly once, by the
    /// driver.
    pub(crate) fn resolve(&mut self, status: JobStatus) {
        debug_assert!(!self.is_resolved(), "job resolved twice");
        self.status = status;
    }
}

/// Lifecycle state of a [`Job`].
///
/// `Pending → Succeeded` or `Pending → Failed`; terminal states are final,
/// there are no retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Discovered but not yet attempted.
    Pending,
    /// The output file was written.
    Succeeded,
    /// The job did not produce an output file.
    Failed(FailureReason),
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Why a job failed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FailureReason {
    /// A file already exists at the output path; the tool was never
    /// invoked, preventing a silent overwrite.
    OutputAlreadyExists,
    /// The external tool ran and reported an error.
    Tool {
        /// Diagnostic text from the tool.
        detail: String,
    },
    /// The tool could not be launched for this file, or cleanup I/O failed.
    Io {
        /// Underlying I/O diagnostic.
        detail: String,
    },
    /// The run was cancelled before this job started.
    Cancelled,
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FailureReason::OutputAlreadyExists => write!(f, "output file already exists"),
            FailureReason::Tool { detail } => write!(f, "{detail}"),
            FailureReason::Io { detail } => write!(f, "{detail}"),
            FailureReason::Cancelled => write!(f, "cancelled before start"),
        }
    }
}

/// A failed job as carried by the [`RunSummary`].
#[derive(Debug, Clone)]
pub struct FailedJob {
    /// Source path of the failed job.
    pub source: PathBuf,
    /// Why it failed.
    pub reason: FailureReason,
}

/// Aggregate statistics for one driver run.
///
/// Created empty at run start, incremented after each job resolves, and
/// consumed by the reporting step at run end.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of jobs discovered for the run.
    pub total: usize,
    /// Jobs that produced an output file.
    pub succeeded: usize,
    /// Jobs that did not.
    pub failed: usize,
    /// Failed jobs with their reasons, in batch order.
    pub failures: Vec<FailedJob>,
    /// Megabytes of source data handed to the tool.
    pub input_megabytes: f64,
    /// Megabytes of output written by successful jobs.
    pub output_megabytes: f64,
    /// Wall-clock duration of the whole run.
    pub elapsed: Duration,
}

impl RunSummary {
    /// Fold a resolved job into the counters.
    pub(crate) fn record(&mut self, job: &Job) {
        match job.status() {
            JobStatus::Succeeded => self.succeeded += 1,
            JobStatus::Failed(reason) => {
                self.failed += 1;
                self.failures.push(FailedJob {
                    source: job.source().to_path_buf(),
                    reason: reason.clone(),
                });
            }
            JobStatus::Pending => debug_assert!(false, "recording an unresolved job"),
        }
    }

    /// Whether every job in the run succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.succeeded == self.total
    }
}
