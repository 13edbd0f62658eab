//! Batch driver integration tests.
//!
//! The driver is exercised against a scripted in-memory media tool, so no
//! FFmpeg binary is required. The scripted tool writes real files into
//! temp directories to exercise the overwrite guard and partial-output
//! cleanup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use relevel::{
    BatchDriver, CancellationToken, FailureReason, JobStatus, MediaTool, NormalizeConfig,
    ProgressObserver, ProgressUpdate, RelevelError, ToolError, discover,
};
use tempfile::TempDir;

/// Scripted tool: succeeds by writing the output file; fails (optionally
/// leaving a partial file behind) for sources whose file name is listed in
/// `fail_names`. Every invocation is recorded.
#[derive(Default)]
struct ScriptedTool {
    fail_names: Vec<String>,
    leave_partial: bool,
    probe_fails: bool,
    invocations: Mutex<Vec<PathBuf>>,
}

impl ScriptedTool {
    fn failing_on(names: &[&str]) -> Self {
        Self {
            fail_names: names.iter().map(|name| (*name).to_string()).collect(),
            ..Self::default()
        }
    }

    fn invoked_sources(&self) -> Vec<PathBuf> {
        self.invocations.lock().expect("poisoned").clone()
    }
}

impl MediaTool for ScriptedTool {
    fn probe(&self) -> Result<(), ToolError> {
        if self.probe_fails {
            return Err(ToolError::Launch {
                program: "ffmpeg".to_string(),
                reason: "No such file or directory".to_string(),
            });
        }
        Ok(())
    }

    fn normalize(
        &self,
        source: &Path,
        output: &Path,
        _config: &NormalizeConfig,
    ) -> Result<(), ToolError> {
        self.invocations
            .lock()
            .expect("poisoned")
            .push(source.to_path_buf());

        let name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail_names.contains(&name) {
            if self.leave_partial {
                fs::write(output, b"partial garbage").expect("Failed to write partial");
            }
            return Err(ToolError::Exited {
                status: "exit status: 1".to_string(),
                diagnostic: "simulated encoder failure".to_string(),
            });
        }

        fs::write(output, b"normalized bytes").expect("Failed to write output");
        Ok(())
    }
}

/// Records one entry per progress update.
#[derive(Default)]
struct RecordingObserver {
    updates: Mutex<Vec<(usize, usize, PathBuf, bool)>>,
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&self, update: &ProgressUpdate<'_>) {
        self.updates.lock().expect("poisoned").push((
            update.index,
            update.total,
            update.job.source().to_path_buf(),
            matches!(update.job.status(), JobStatus::Succeeded),
        ));
    }
}

fn make_tree(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for file in files {
        let path = dir.path().join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&path, b"source bytes").expect("Failed to write file");
    }
    dir
}

fn discover_jobs(dir: &TempDir, config: &NormalizeConfig) -> Vec<relevel::Job> {
    discover(dir.path(), config)
        .expect("Discovery failed")
        .jobs
}

// ── Terminal states ────────────────────────────────────────────────

#[test]
fn every_job_reaches_a_terminal_state() {
    let dir = make_tree(&["a.mp4", "b.mp4", "c.mp4"]);
    let config = NormalizeConfig::new();
    let mut jobs = discover_jobs(&dir, &config);

    let tool = ScriptedTool::failing_on(&["b.mp4"]);
    let summary = BatchDriver::new(&tool, config)
        .run(&mut jobs)
        .expect("Run failed");

    assert!(jobs.iter().all(relevel::Job::is_resolved));
    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded + summary.failed, 3);
}

#[test]
fn successful_jobs_write_outputs() {
    let dir = make_tree(&["a.mp4"]);
    let config = NormalizeConfig::new();
    let mut jobs = discover_jobs(&dir, &config);

    let tool = ScriptedTool::default();
    let summary = BatchDriver::new(&tool, config)
        .run(&mut jobs)
        .expect("Run failed");

    assert!(summary.all_succeeded());
    assert!(dir.path().join("normalized_a.mp4").exists());
    assert!(summary.output_megabytes > 0.0);
}

// ── Failure isolation ──────────────────────────────────────────────

#[test]
fn a_failed_job_never_stops_the_batch() {
    let dir = make_tree(&["a.mp4", "b.mp4", "c.mp4", "d.mp4", "e.mp4"]);
    let config = NormalizeConfig::new();
    let mut jobs = discover_jobs(&dir, &config);

    // Third of five fails; the remaining two must still be attempted.
    let tool = ScriptedTool::failing_on(&["c.mp4"]);
    let summary = BatchDriver::new(&tool, config)
        .run(&mut jobs)
        .expect("Run failed");

    assert_eq!(tool.invoked_sources().len(), 5);
    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].source, dir.path().join("c.mp4"));
    assert!(matches!(
        summary.failures[0].reason,
        FailureReason::Tool { .. },
    ));
}

// ── Overwrite guard ────────────────────────────────────────────────

#[test]
fn existing_output_fails_without_invoking_the_tool() {
    let dir = make_tree(&["a.mp4", "b.mp4"]);
    fs::write(dir.path().join("normalized_a.mp4"), b"older output")
        .expect("Failed to pre-create output");
    let config = NormalizeConfig::new();
    let mut jobs = discover_jobs(&dir, &config);

    let tool = ScriptedTool::default();
    let summary = BatchDriver::new(&tool, config)
        .run(&mut jobs)
        .expect("Run failed");

    // Only b.mp4 reached the tool.
    assert_eq!(tool.invoked_sources(), vec![dir.path().join("b.mp4")]);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert!(matches!(
        summary.failures[0].reason,
        FailureReason::OutputAlreadyExists,
    ));
    // The pre-existing file was not touched.
    let contents = fs::read(dir.path().join("normalized_a.mp4")).expect("Failed to read");
    assert_eq!(contents, b"older output");
}

#[test]
fn second_run_reports_output_already_exists() {
    let dir = make_tree(&["a.mp4", "sub/b.mkv"]);
    let config = NormalizeConfig::new().with_recursion(true);

    let tool = ScriptedTool::default();

    let mut first_run = discover_jobs(&dir, &config);
    let first_sources: Vec<PathBuf> = first_run
        .iter()
        .map(|job| job.source().to_path_buf())
        .collect();
    let first = BatchDriver::new(&tool, config.clone())
        .run(&mut first_run)
        .expect("First run failed");
    assert!(first.all_succeeded());

    // Re-discover without removing outputs: every file processed on the
    // first run must fail the second, nothing is silently overwritten.
    let mut second_run = discover_jobs(&dir, &config);
    BatchDriver::new(&tool, config)
        .run(&mut second_run)
        .expect("Second run failed");

    for source in &first_sources {
        let job = second_run
            .iter()
            .find(|job| job.source() == source)
            .expect("First-run source missing from second discovery");
        assert_eq!(
            *job.status(),
            JobStatus::Failed(FailureReason::OutputAlreadyExists),
            "expected {} to be guarded",
            source.display(),
        );
    }
}

// ── Partial-output cleanup ─────────────────────────────────────────

#[test]
fn failed_invocation_leaves_no_partial_output() {
    let dir = make_tree(&["a.mp4"]);
    let config = NormalizeConfig::new();
    let mut jobs = discover_jobs(&dir, &config);

    let tool = ScriptedTool {
        fail_names: vec!["a.mp4".to_string()],
        leave_partial: true,
        ..ScriptedTool::default()
    };
    let summary = BatchDriver::new(&tool, config)
        .run(&mut jobs)
        .expect("Run failed");

    assert_eq!(summary.failed, 1);
    assert!(
        !dir.path().join("normalized_a.mp4").exists(),
        "partial output must be deleted",
    );
}

// ── Fatal environment errors ───────────────────────────────────────

#[test]
fn probe_failure_aborts_before_any_job() {
    let dir = make_tree(&["a.mp4", "b.mp4"]);
    let config = NormalizeConfig::new();
    let mut jobs = discover_jobs(&dir, &config);

    let tool = ScriptedTool {
        probe_fails: true,
        ..ScriptedTool::default()
    };
    let result = BatchDriver::new(&tool, config).run(&mut jobs);

    match result {
        Err(RelevelError::ToolUnavailable { reason }) => {
            assert!(reason.contains("ffmpeg"));
        }
        other => panic!("Expected ToolUnavailable, got: {other:?}"),
    }
    assert!(tool.invoked_sources().is_empty());
    assert!(jobs.iter().all(|job| !job.is_resolved()));
}

// ── Cancellation ───────────────────────────────────────────────────

#[test]
fn cancellation_resolves_remaining_jobs_without_invocation() {
    let dir = make_tree(&["a.mp4", "b.mp4", "c.mp4"]);
    let config = NormalizeConfig::new();
    let mut jobs = discover_jobs(&dir, &config);

    let token = CancellationToken::new();
    token.cancel();

    let tool = ScriptedTool::default();
    let summary = BatchDriver::new(&tool, config)
        .with_cancellation(token)
        .run(&mut jobs)
        .expect("Run failed");

    assert!(tool.invoked_sources().is_empty());
    assert_eq!(summary.failed, 3);
    assert!(
        jobs.iter().all(|job| matches!(
            job.status(),
            JobStatus::Failed(FailureReason::Cancelled),
        )),
        "cancelled jobs must not stay pending",
    );
}

// ── Progress reporting ─────────────────────────────────────────────

#[test]
fn observer_receives_one_update_per_job_in_order() {
    let dir = make_tree(&["a.mp4", "b.mp4", "c.mp4"]);
    let config = NormalizeConfig::new();
    let mut jobs = discover_jobs(&dir, &config);

    let tool = ScriptedTool::failing_on(&["b.mp4"]);
    let observer = Arc::new(RecordingObserver::default());
    BatchDriver::new(&tool, config)
        .with_observer(observer.clone())
        .run(&mut jobs)
        .expect("Run failed");

    let updates = observer.updates.lock().expect("poisoned").clone();
    assert_eq!(updates.len(), 3);
    for (position, (index, total, _, _)) in updates.iter().enumerate() {
        assert_eq!(*index, position + 1);
        assert_eq!(*total, 3);
    }
    assert!(updates[0].3, "a.mp4 should succeed");
    assert!(!updates[1].3, "b.mp4 should fail");
    assert!(updates[2].3, "c.mp4 should succeed");
}

#[test]
fn summary_accumulates_input_size_for_attempted_jobs() {
    let dir = make_tree(&["a.mp4", "b.mp4"]);
    let config = NormalizeConfig::new();
    let mut jobs = discover_jobs(&dir, &config);

    let tool = ScriptedTool::default();
    let summary = BatchDriver::new(&tool, config)
        .run(&mut jobs)
        .expect("Run failed");

    assert!(summary.input_megabytes > 0.0);
    assert!(summary.elapsed.as_nanos() > 0);
}
