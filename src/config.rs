//! Run configuration.
//!
//! [`NormalizeConfig`] is a builder that carries the loudness targets, the
//! audio encoding settings, and the discovery options for one batch run. It
//! is constructed once at startup and read-only thereafter.
//!
//! # Example
//!
//! ```
//! use relevel::NormalizeConfig;
//!
//! let config = NormalizeConfig::new()
//!     .with_target_loudness(-16.0)
//!     .with_audio_bitrate(256)
//!     .with_recursion(true);
//!
//! assert_eq!(config.loudnorm_filter(), "loudnorm=I=-16:LRA=11:TP=-1.5");
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// File extensions recognized as video containers, lowercase, without the
/// leading dot.
pub const DEFAULT_VIDEO_EXTENSIONS: [&str; 6] = ["avi", "flv", "mkv", "mov", "mp4", "wmv"];

/// Prefix prepended to output file names.
pub const DEFAULT_OUTPUT_PREFIX: &str = "normalized_";

/// Immutable configuration for one batch run.
///
/// Defaults target broadcast loudness: -14 LUFS integrated, LRA 11,
/// true peak -1.5 dBFS, AAC audio at 192 kbit/s.
#[derive(Debug, Clone)]
pub struct NormalizeConfig {
    /// Integrated loudness target in LUFS.
    pub target_loudness_lufs: f64,
    /// Loudness range target (LRA).
    pub loudness_range: f64,
    /// Maximum true peak in dBFS.
    pub true_peak_dbfs: f64,
    /// Audio bitrate in kbit/s for the re-encoded track.
    pub audio_bitrate_kbps: u32,
    /// Prefix prepended to the source file name to form the output name.
    pub output_prefix: String,
    /// When `true`, discovery descends into subdirectories without a depth
    /// limit.
    pub recurse_subdirectories: bool,
    /// Extensions eligible for processing, stored lowercase without the
    /// leading dot.
    pub allowed_extensions: BTreeSet<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            target_loudness_lufs: -14.0,
            loudness_range: 11.0,
            true_peak_dbfs: -1.5,
            audio_bitrate_kbps: 192,
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            recurse_subdirectories: false,
            allowed_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|extension| (*extension).to_string())
                .collect(),
        }
    }
}

impl NormalizeConfig {
    /// Create a configuration with the default broadcast targets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the integrated loudness target in LUFS.
    #[must_use]
    pub fn with_target_loudness(mut self, lufs: f64) -> Self {
        self.target_loudness_lufs = lufs;
        self
    }

    /// Set the loudness range target (LRA).
    #[must_use]
    pub fn with_loudness_range(mut self, range: f64) -> Self {
        self.loudness_range = range;
        self
    }

    /// Set the maximum true peak in dBFS.
    #[must_use]
    pub fn with_true_peak(mut self, dbfs: f64) -> Self {
        self.true_peak_dbfs = dbfs;
        self
    }

    /// Set the audio bitrate in kbit/s.
    #[must_use]
    pub fn with_audio_bitrate(mut self, kbps: u32) -> Self {
        self.audio_bitrate_kbps = kbps;
        self
    }

    /// Set the output file name prefix.
    #[must_use]
    pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = prefix.into();
        self
    }

    /// Enable or disable descending into subdirectories.
    #[must_use]
    pub fn with_recursion(mut self, recurse: bool) -> Self {
        self.recurse_subdirectories = recurse;
        self
    }

    /// Replace the set of eligible extensions.
    ///
    /// Entries are normalized: lowercased, leading dot stripped, so
    /// `".MKV"` and `"mkv"` are equivalent.
    #[must_use]
    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = extensions
            .into_iter()
            .map(|extension| {
                extension
                    .as_ref()
                    .trim_start_matches('.')
                    .to_ascii_lowercase()
            })
            .collect();
        self
    }

    /// Whether `path` carries an eligible extension (case-insensitive).
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| {
                self.allowed_extensions
                    .contains(&extension.to_ascii_lowercase())
            })
    }

    /// The FFmpeg `loudnorm` filter string for these targets.
    ///
    /// With the defaults this is `loudnorm=I=-14:LRA=11:TP=-1.5`, the EBU
    /// R128 normalization the original workflow applied.
    pub fn loudnorm_filter(&self) -> String {
        format!(
            "loudnorm=I={}:LRA={}:TP={}",
            self.target_loudness_lufs, self.loudness_range, self.true_peak_dbfs,
        )
    }

    /// Derive the output path for a source file: same directory, same
    /// extension, file name prefixed with
    /// [`output_prefix`](NormalizeConfig::output_prefix).
    ///
    /// The prefix guarantees the output path is always distinct from the
    /// source path.
    pub fn output_path_for(&self, source: &Path) -> PathBuf {
        let name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        source.with_file_name(format!("{}{name}", self.output_prefix))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::NormalizeConfig;

    #[test]
    fn default_filter_matches_broadcast_targets() {
        let config = NormalizeConfig::new();
        assert_eq!(config.loudnorm_filter(), "loudnorm=I=-14:LRA=11:TP=-1.5");
    }

    #[test]
    fn filter_renders_custom_targets() {
        let config = NormalizeConfig::new()
            .with_target_loudness(-16.0)
            .with_true_peak(-2.0);
        assert_eq!(config.loudnorm_filter(), "loudnorm=I=-16:LRA=11:TP=-2");
    }

    #[test]
    fn output_path_is_prefixed_sibling() {
        let config = NormalizeConfig::new();
        let output = config.output_path_for(Path::new("/media/show/episode.mkv"));
        assert_eq!(output, Path::new("/media/show/normalized_episode.mkv"));
    }

    #[test]
    fn extension_matching_ignores_case() {
        let config = NormalizeConfig::new();
        assert!(config.matches_extension(Path::new("a.MP4")));
        assert!(config.matches_extension(Path::new("b.MkV")));
        assert!(!config.matches_extension(Path::new("c.txt")));
        assert!(!config.matches_extension(Path::new("no_extension")));
    }

    #[test]
    fn custom_extensions_are_normalized() {
        let config = NormalizeConfig::new().with_allowed_extensions([".WebM", "ts"]);
        assert!(config.matches_extension(Path::new("clip.webm")));
        assert!(config.matches_extension(Path::new("clip.TS")));
        assert!(!config.matches_extension(Path::new("clip.mp4")));
    }
}
