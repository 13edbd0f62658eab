//! External media tool invocation.
//!
//! The driver never talks to FFmpeg directly; it goes through the narrow
//! [`MediaTool`] trait so sequencing and failure isolation can be tested
//! with a scripted implementation. [`FfmpegTool`] is the production
//! implementation: it spawns the `ffmpeg` binary, stream-copies the video
//! and subtitle tracks, and re-encodes the audio track through the
//! `loudnorm` filter.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use relevel::{FfmpegTool, MediaTool, NormalizeConfig};
//!
//! let tool = FfmpegTool::from_environment();
//! tool.probe()?;
//! tool.normalize(
//!     Path::new("episode.mkv"),
//!     Path::new("normalized_episode.mkv"),
//!     &NormalizeConfig::new(),
//! )?;
//! # Ok::<(), relevel::ToolError>(())
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::config::NormalizeConfig;

/// Program name used when no override is configured.
pub const DEFAULT_FFMPEG_PROGRAM: &str = "ffmpeg";

/// Environment variable consulted for an ffmpeg binary override.
pub const FFMPEG_ENV_VAR: &str = "FFMPEG";

/// How many trailing diagnostic lines of tool output are kept on failure.
const DIAGNOSTIC_TAIL_LINES: usize = 12;

/// Errors reported across the media tool boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ToolError {
    /// The tool binary could not be spawned at all.
    #[error("failed to launch `{program}`: {reason}")]
    Launch {
        /// The program that was invoked.
        program: String,
        /// Underlying spawn error.
        reason: String,
    },

    /// The tool ran but exited unsuccessfully.
    #[error("tool {status}: {diagnostic}")]
    Exited {
        /// Exit status description (code or signal).
        status: String,
        /// Trailing lines of the tool's stderr.
        diagnostic: String,
    },
}

/// Narrow interface to the external media framework.
///
/// The contract: copy the video (and subtitle) streams without re-encoding,
/// re-encode the audio stream to the codec/bitrate in the config, apply
/// loudness normalization to the configured LUFS/LRA/true-peak triple, and
/// signal success or failure per invocation. Cleanup of a partial output
/// file after an abnormal exit is the caller's responsibility, not the
/// tool's.
pub trait MediaTool {
    /// Check that the tool can be invoked at all.
    ///
    /// Called once per run, before the first job; failure here is a fatal
    /// environment error.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Launch`] when the binary cannot be spawned.
    fn probe(&self) -> Result<(), ToolError>;

    /// Normalize `source` into `output` under `config`, blocking until the
    /// invocation completes.
    ///
    /// The driver guards against an existing `output` before calling this.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Launch`] when the binary cannot be spawned and
    /// [`ToolError::Exited`] when it exits unsuccessfully.
    fn normalize(
        &self,
        source: &Path,
        output: &Path,
        config: &NormalizeConfig,
    ) -> Result<(), ToolError>;
}

impl<T: MediaTool + ?Sized> MediaTool for &T {
    fn probe(&self) -> Result<(), ToolError> {
        (**self).probe()
    }

    fn normalize(
        &self,
        source: &Path,
        output: &Path,
        config: &NormalizeConfig,
    ) -> Result<(), ToolError> {
        (**self).normalize(source, output, config)
    }
}

/// FFmpeg-backed [`MediaTool`] implementation.
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    program: PathBuf,
}

impl FfmpegTool {
    /// Use the binary named by the `FFMPEG` environment variable, falling
    /// back to `ffmpeg` on the search path.
    pub fn from_environment() -> Self {
        match std::env::var_os(FFMPEG_ENV_VAR) {
            Some(program) if !program.is_empty() => Self {
                program: PathBuf::from(program),
            },
            _ => Self {
                program: PathBuf::from(DEFAULT_FFMPEG_PROGRAM),
            },
        }
    }

    /// Use an explicit binary path.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The configured binary.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn launch_error(&self, error: &std::io::Error) -> ToolError {
        ToolError::Launch {
            program: self.program.display().to_string(),
            reason: error.to_string(),
        }
    }

    /// Argument vector for one normalization invocation.
    ///
    /// `-map 0` keeps every stream; video and subtitles are stream-copied
    /// while the audio is re-encoded to AAC with the `loudnorm` filter.
    /// `-nostdin` keeps ffmpeg away from the terminal the CLI may be
    /// prompting on.
    fn normalize_arguments(
        source: &Path,
        output: &Path,
        config: &NormalizeConfig,
    ) -> Vec<OsString> {
        let mut arguments: Vec<OsString> = vec![
            "-hwaccel".into(),
            "auto".into(),
            "-hide_banner".into(),
            "-nostdin".into(),
            "-i".into(),
            source.as_os_str().to_os_string(),
            "-map".into(),
            "0".into(),
            "-threads".into(),
            "auto".into(),
            "-c:v".into(),
            "copy".into(),
            "-c:s".into(),
            "copy".into(),
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            format!("{}k", config.audio_bitrate_kbps).into(),
            "-af".into(),
            config.loudnorm_filter().into(),
            "-y".into(),
        ];
        arguments.push(output.as_os_str().to_os_string());
        arguments
    }
}

impl MediaTool for FfmpegTool {
    fn probe(&self) -> Result<(), ToolError> {
        let status = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|error| self.launch_error(&error))?;

        if status.success() {
            Ok(())
        } else {
            Err(ToolError::Exited {
                status: status.to_string(),
                diagnostic: "version probe failed".to_string(),
            })
        }
    }

    fn normalize(
        &self,
        source: &Path,
        output: &Path,
        config: &NormalizeConfig,
    ) -> Result<(), ToolError> {
        let arguments = Self::normalize_arguments(source, output, config);
        log::debug!(
            "Running {} with arguments {:?}",
            self.program.display(),
            arguments,
        );

        let captured = Command::new(&self.program)
            .args(&arguments)
            .stdin(Stdio::null())
            .output()
            .map_err(|error| self.launch_error(&error))?;

        if captured.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&captured.stderr);
        Err(ToolError::Exited {
            status: captured.status.to_string(),
            diagnostic: diagnostic_tail(&stderr, DIAGNOSTIC_TAIL_LINES),
        })
    }
}

/// Keep the last `lines` non-empty lines of `text`, joined with `; `.
///
/// FFmpeg prints the actual cause at the very end of a long stderr stream;
/// the tail is what's worth carrying on a failed job.
fn diagnostic_tail(text: &str, lines: usize) -> String {
    let kept: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let start = kept.len().saturating_sub(lines);
    kept[start..].join("; ")
}
