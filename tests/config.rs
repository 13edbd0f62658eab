//! NormalizeConfig builder tests.

use std::path::Path;

use relevel::{DEFAULT_OUTPUT_PREFIX, DEFAULT_VIDEO_EXTENSIONS, NormalizeConfig};

// ── Defaults ───────────────────────────────────────────────────────

#[test]
fn defaults_match_broadcast_targets() {
    let config = NormalizeConfig::new();
    assert_eq!(config.target_loudness_lufs, -14.0);
    assert_eq!(config.loudness_range, 11.0);
    assert_eq!(config.true_peak_dbfs, -1.5);
    assert_eq!(config.audio_bitrate_kbps, 192);
    assert_eq!(config.output_prefix, DEFAULT_OUTPUT_PREFIX);
    assert!(!config.recurse_subdirectories);
}

#[test]
fn default_extension_set_covers_common_containers() {
    let config = NormalizeConfig::new();
    for extension in DEFAULT_VIDEO_EXTENSIONS {
        let name = format!("clip.{extension}");
        assert!(
            config.matches_extension(Path::new(&name)),
            "{extension} should match",
        );
    }
}

// ── Builder ────────────────────────────────────────────────────────

#[test]
fn builder_overrides_compose() {
    let config = NormalizeConfig::new()
        .with_target_loudness(-23.0)
        .with_loudness_range(7.0)
        .with_true_peak(-2.0)
        .with_audio_bitrate(320)
        .with_output_prefix("loud_")
        .with_recursion(true);

    assert_eq!(config.target_loudness_lufs, -23.0);
    assert_eq!(config.loudness_range, 7.0);
    assert_eq!(config.true_peak_dbfs, -2.0);
    assert_eq!(config.audio_bitrate_kbps, 320);
    assert_eq!(config.output_prefix, "loud_");
    assert!(config.recurse_subdirectories);
}

#[test]
fn filter_string_reflects_overrides() {
    let config = NormalizeConfig::new()
        .with_target_loudness(-23.0)
        .with_loudness_range(7.0)
        .with_true_peak(-2.0);
    assert_eq!(config.loudnorm_filter(), "loudnorm=I=-23:LRA=7:TP=-2");
}

#[test]
fn fractional_targets_render_in_filter() {
    let config = NormalizeConfig::new().with_target_loudness(-14.5);
    assert_eq!(config.loudnorm_filter(), "loudnorm=I=-14.5:LRA=11:TP=-1.5");
}

// ── Output path derivation ─────────────────────────────────────────

#[test]
fn output_path_keeps_directory_and_extension() {
    let config = NormalizeConfig::new();
    let output = config.output_path_for(Path::new("/media/show/pilot.avi"));
    assert_eq!(output, Path::new("/media/show/normalized_pilot.avi"));
}

#[test]
fn custom_prefix_applies_to_output_path() {
    let config = NormalizeConfig::new().with_output_prefix("out_");
    let output = config.output_path_for(Path::new("dir/clip.mp4"));
    assert_eq!(output, Path::new("dir/out_clip.mp4"));
}

#[test]
fn output_path_always_differs_from_source() {
    let config = NormalizeConfig::new();
    let source = Path::new("a.mp4");
    assert_ne!(config.output_path_for(source), source);
}
