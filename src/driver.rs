//! Batch driver: strictly sequential job execution with failure isolation.
//!
//! [`BatchDriver`] consumes the jobs produced by [`discover`](crate::discover),
//! one at a time, with exactly one tool invocation in flight. A failed job
//! never aborts the run; its reason is recorded and the driver moves on.
//! Only environment problems — the tool cannot be invoked at all — are
//! fatal, and those are detected before the first job.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use relevel::{BatchDriver, FfmpegTool, NormalizeConfig, discover};
//!
//! let config = NormalizeConfig::new().with_recursion(true);
//! let mut discovery = discover(Path::new("/media/movies"), &config)?;
//!
//! let driver = BatchDriver::new(FfmpegTool::from_environment(), config);
//! let summary = driver.run(&mut discovery.jobs)?;
//! println!("{} of {} succeeded", summary.succeeded, summary.total);
//! # Ok::<(), relevel::RelevelError>(())
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::NormalizeConfig;
use crate::error::RelevelError;
use crate::job::{FailureReason, Job, JobStatus, RunSummary};
use crate::progress::{CancellationToken, NoOpProgress, ProgressObserver, ProgressUpdate};
use crate::tool::{MediaTool, ToolError};
use crate::utilities::file_size_megabytes;

/// Sequences normalization jobs against an external media tool.
pub struct BatchDriver<T: MediaTool> {
    tool: T,
    config: NormalizeConfig,
    observer: Arc<dyn ProgressObserver>,
    cancellation: CancellationToken,
}

impl<T: MediaTool> BatchDriver<T> {
    /// Create a driver over `tool` with the given run configuration.
    pub fn new(tool: T, config: NormalizeConfig) -> Self {
        Self {
            tool,
            config,
            observer: Arc::new(NoOpProgress),
            cancellation: CancellationToken::new(),
        }
    }

    /// Receive a progress update after each job resolves.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Honor `token` at job boundaries: jobs not yet started when the token
    /// fires resolve as [`FailureReason::Cancelled`] without invoking the
    /// tool.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Run every job to a terminal state and return the aggregated summary.
    ///
    /// Per job, in order: the output path is checked (an existing file
    /// fails the job without invoking the tool), the tool is invoked and
    /// blocked on, the outcome is recorded, any partial output of a failed
    /// invocation is deleted, and one progress update is emitted. After the
    /// loop no job is left `Pending`.
    ///
    /// # Errors
    ///
    /// Returns [`RelevelError::ToolUnavailable`] when the pre-flight probe
    /// fails; in that case no job has been attempted and all jobs remain
    /// `Pending`.
    pub fn run(&self, jobs: &mut [Job]) -> Result<RunSummary, RelevelError> {
        self.tool
            .probe()
            .map_err(|error| RelevelError::ToolUnavailable {
                reason: error.to_string(),
            })?;

        let run_started = Instant::now();
        let total = jobs.len();
        let mut summary = RunSummary {
            total,
            ..RunSummary::default()
        };

        log::info!("Processing {total} file(s)");

        for (index, job) in jobs.iter_mut().enumerate() {
            let job_started = Instant::now();
            let input_megabytes = file_size_megabytes(job.source()).ok();

            if self.cancellation.is_cancelled() {
                job.resolve(JobStatus::Failed(FailureReason::Cancelled));
            } else if job.output().exists() {
                log::debug!(
                    "Skipping {}: output {} already exists",
                    job.source().display(),
                    job.output().display(),
                );
                job.resolve(JobStatus::Failed(FailureReason::OutputAlreadyExists));
            } else {
                if let Some(megabytes) = input_megabytes {
                    summary.input_megabytes += megabytes;
                }
                match self.tool.normalize(job.source(), job.output(), &self.config) {
                    Ok(()) => {
                        summary.output_megabytes +=
                            file_size_megabytes(job.output()).unwrap_or(0.0);
                        job.resolve(JobStatus::Succeeded);
                    }
                    Err(error) => {
                        remove_partial_output(job.output());
                        job.resolve(JobStatus::Failed(failure_from_tool(error)));
                    }
                }
            }

            summary.record(job);
            log::debug!(
                "[{}/{}] {} {}",
                index + 1,
                total,
                job.source().display(),
                job.status(),
            );
            self.observer.on_progress(&ProgressUpdate {
                index: index + 1,
                total,
                job,
                input_megabytes,
                elapsed: job_started.elapsed(),
            });
        }

        summary.elapsed = run_started.elapsed();
        log::info!(
            "Run finished: {} succeeded, {} failed of {}",
            summary.succeeded,
            summary.failed,
            summary.total,
        );
        Ok(summary)
    }
}

fn failure_from_tool(error: ToolError) -> FailureReason {
    match error {
        ToolError::Launch { .. } => FailureReason::Io {
            detail: error.to_string(),
        },
        ToolError::Exited { .. } => FailureReason::Tool {
            detail: error.to_string(),
        },
    }
}

/// Delete whatever a failed invocation left at `path`.
///
/// The tool is not trusted to be atomic with respect to the output file;
/// a missing file is the normal case and not an error.
fn remove_partial_output(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("Removed partial output {}", path.display()),
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => log::warn!(
            "Failed to remove partial output {}: {error}",
            path.display(),
        ),
    }
}
