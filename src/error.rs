//! Error types for the `relevel` crate.
//!
//! This module defines [`RelevelError`], the error type for failures that
//! abort a run before any job is attempted. Per-file failures are not errors
//! in this sense — they are recorded as
//! [`FailureReason`](crate::job::FailureReason) values on the jobs themselves
//! and never propagate past the driver loop.

use std::{io::Error as IoError, path::PathBuf};

use thiserror::Error;

/// Fatal environment errors.
///
/// Every variant here means the run could not start (or could not have
/// started): the root directory is unusable or the external media tool
/// cannot be invoked at all. Anything that goes wrong with a single file is
/// captured per-job instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RelevelError {
    /// The root directory does not exist, is not a directory, or cannot be
    /// read.
    #[error("Invalid root directory {path}: {reason}")]
    InvalidRoot {
        /// Path that was passed to [`crate::discover`].
        path: PathBuf,
        /// Underlying reason the directory is unusable.
        reason: String,
    },

    /// The external media tool could not be invoked at all.
    ///
    /// Raised by the driver's pre-flight probe, before the first job.
    #[error("Media tool unavailable: {reason}")]
    ToolUnavailable {
        /// Diagnostic from the failed probe, including the program name.
        reason: String,
    },

    /// An I/O error occurred outside the scope of any single job.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}
