//! # relevel
//!
//! Batch-normalize audio loudness in video files — video streams copied,
//! audio re-encoded to broadcast targets via FFmpeg.
//!
//! `relevel` walks a directory tree for video files, invokes the external
//! `ffmpeg` binary once per file to normalize the audio track to a
//! configurable LUFS/LRA/true-peak triple, and writes a prefixed sibling
//! file with the video (and subtitle) streams copied bit-for-bit. The
//! loudness analysis and encoding are entirely FFmpeg's job; this crate
//! owns discovery, sequencing, per-job outcome tracking, and run-level
//! statistics with strict failure isolation.
//!
//! ## Quick Start
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
//!
//! println!(
//!     "{} of {} file(s) normalized, {} failed",
//!     summary.succeeded, summary.total, summary.failed,
//! );
//! # Ok::<(), relevel::RelevelError>(())
//! ```
//!
//! ## Guarantees
//!
//! - **Deterministic discovery** — candidates are sorted lexically by full
//!   path; an unreadable subdirectory is a warning, not a failure.
//! - **No silent overwrite** — a job whose output path already exists fails
//!   without invoking the tool.
//! - **Failure isolation** — one file's failure never stops the batch; the
//!   reason is recorded and the run continues.
//! - **No partial outputs** — when an invocation fails, whatever it wrote
//!   is deleted.
//! - **Strictly sequential** — exactly one tool invocation in flight;
//!   cancellation is honored only at job boundaries.
//!
//! ## Requirements
//!
//! The `ffmpeg` binary must be installed and reachable on the search path
//! (or pointed to via the `FFMPEG` environment variable or
//! [`FfmpegTool::with_program`]).

pub mod config;
pub mod discover;
pub mod driver;
pub mod error;
pub mod job;
pub mod progress;
pub mod tool;
pub mod utilities;

pub use config::{DEFAULT_OUTPUT_PREFIX, DEFAULT_VIDEO_EXTENSIONS, NormalizeConfig};
pub use discover::{Discovery, DiscoveryWarning, discover};
pub use driver::BatchDriver;
pub use error::RelevelError;
pub use job::{FailedJob, FailureReason, Job, JobStatus, RunSummary};
pub use progress::{CancellationToken, ProgressObserver, ProgressUpdate};
pub use tool::{DEFAULT_FFMPEG_PROGRAM, FFMPEG_ENV_VAR, FfmpegTool, MediaTool, ToolError};
