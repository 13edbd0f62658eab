//! Small shared helpers.

use std::io;
use std::path::Path;
use std::time::Duration;

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Size of the file at `path` in megabytes.
pub fn file_size_megabytes(path: &Path) -> io::Result<f64> {
    Ok(std::fs::metadata(path)?.len() as f64 / BYTES_PER_MEGABYTE)
}

/// Render a duration as `H:MM:SS`, whole seconds.
pub fn format_hms(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
