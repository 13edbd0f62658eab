//! File discovery.
//!
//! [`discover`] walks a root directory for files whose extension is in the
//! configured set and turns each match into a pending [`Job`]. Results are
//! sorted lexically by full path so a run is reproducible. An unreadable
//! subdirectory is recorded as a [`DiscoveryWarning`] and skipped — partial
//! results are still returned.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use relevel::{NormalizeConfig, discover};
//!
//! let config = NormalizeConfig::new().with_recursion(true);
//! let discovery = discover(Path::new("/media/movies"), &config)?;
//! println!("found {} candidate file(s)", discovery.jobs.len());
//! # Ok::<(), relevel::RelevelError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::NormalizeConfig;
use crate::error::RelevelError;
use crate::job::Job;

/// Result of a discovery pass: ordered jobs plus non-fatal warnings.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Pending jobs, sorted lexically by source path.
    pub jobs: Vec<Job>,
    /// Subtrees that could not be read and were skipped.
    pub warnings: Vec<DiscoveryWarning>,
}

/// A directory entry that could not be read during traversal.
///
/// Warnings reduce the discovered set but never fail the run.
#[derive(Debug, Clone)]
pub struct DiscoveryWarning {
    /// The unreadable path, when the walker could name it.
    pub path: Option<PathBuf>,
    /// Underlying cause.
    pub detail: String,
}

impl Display for DiscoveryWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.path {
            Some(path) => write!(f, "skipped {}: {}", path.display(), self.detail),
            None => write!(f, "skipped unreadable entry: {}", self.detail),
        }
    }
}

/// Walk `root` for video files eligible under `config`.
///
/// Only regular files count; matching is by case-insensitive extension.
/// Without [`recurse_subdirectories`](NormalizeConfig::recurse_subdirectories)
/// the walk never descends below the top level; with it, depth is unbounded.
///
/// # Errors
///
/// Returns [`RelevelError::InvalidRoot`] if `root` does not exist or is not
/// a directory. Unreadable entries below a valid root are warnings, not
/// errors.
pub fn discover(root: &Path, config: &NormalizeConfig) -> Result<Discovery, RelevelError> {
    let metadata = fs::metadata(root).map_err(|error| RelevelError::InvalidRoot {
        path: root.to_path_buf(),
        reason: error.to_string(),
    })?;
    if !metadata.is_dir() {
        return Err(RelevelError::InvalidRoot {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let max_depth = if config.recurse_subdirectories {
        usize::MAX
    } else {
        1
    };

    let mut discovery = Discovery::default();
    for entry in WalkDir::new(root).min_depth(1).max_depth(max_depth) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && config.matches_extension(entry.path()) {
                    let source = entry.into_path();
                    let output = config.output_path_for(&source);
                    discovery.jobs.push(Job::new(source, output));
                }
            }
            Err(error) => {
                log::warn!("Skipping unreadable entry during discovery: {error}");
                discovery.warnings.push(DiscoveryWarning {
                    path: error.path().map(Path::to_path_buf),
                    detail: error.to_string(),
                });
            }
        }
    }

    discovery.jobs.sort_by(|a, b| a.source().cmp(b.source()));

    log::debug!(
        "Discovered {} candidate file(s) under {} ({} warning(s))",
        discovery.jobs.len(),
        root.display(),
        discovery.warnings.len(),
    );

    Ok(discovery)
}
