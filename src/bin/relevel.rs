use std::io::{self, Write as _};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use relevel::{
    BatchDriver, FfmpegTool, JobStatus, NormalizeConfig, ProgressObserver, ProgressUpdate,
    RunSummary, discover, utilities::format_hms,
};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  relevel /media/movies --recurse\n  relevel /media/movies --target-loudness -16 --audio-bitrate 256\n  relevel /media/movies --progress --verbose\n  relevel --completions zsh > _relevel\n\nRun without a directory argument to be prompted interactively.";

#[derive(Debug, Parser)]
#[command(
    name = "relevel",
    version,
    about = "Normalize audio loudness across a directory of video files, copying video streams untouched",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Directory to scan for video files. Prompts interactively when
    /// omitted.
    directory: Option<PathBuf>,

    /// Also process files in nested subdirectories.
    #[arg(short, long)]
    recurse: bool,

    /// Integrated loudness target in LUFS.
    #[arg(long, default_value_t = -14.0, allow_hyphen_values = true)]
    target_loudness: f64,

    /// Loudness range target (LRA).
    #[arg(long, default_value_t = 11.0)]
    loudness_range: f64,

    /// Maximum true peak in dBFS.
    #[arg(long, default_value_t = -1.5, allow_hyphen_values = true)]
    true_peak: f64,

    /// Audio bitrate in kbit/s.
    #[arg(long, default_value_t = 192)]
    audio_bitrate: u32,

    /// Prefix for output file names.
    #[arg(long, default_value = "normalized_")]
    prefix: String,

    /// Path to the ffmpeg binary (falls back to $FFMPEG, then `ffmpeg`).
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,

    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Generate a shell completion script and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

/// Per-file progress lines, routed around the progress bar when one is
/// active, and to stderr when stdout is reserved for JSON.
struct TerminalProgress {
    bar: Option<ProgressBar>,
    to_stderr: bool,
}

impl TerminalProgress {
    fn emit(&self, line: &str) {
        if let Some(bar) = &self.bar {
            bar.println(line);
            bar.inc(1);
        } else if self.to_stderr {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}

impl ProgressObserver for TerminalProgress {
    fn on_progress(&self, update: &ProgressUpdate<'_>) {
        let name = update.job.source().display();
        let size = update
            .input_megabytes
            .map(|megabytes| format!("{megabytes:.2} MB"))
            .unwrap_or_else(|| "size unknown".to_string());

        let line = match update.job.status() {
            JobStatus::Succeeded => format!(
                "[{}/{}] {} {} ({}, {})",
                update.index,
                update.total,
                "ok".green().bold(),
                name,
                size,
                format_hms(update.elapsed),
            ),
            JobStatus::Failed(reason) => format!(
                "[{}/{}] {} {}: {}",
                update.index,
                update.total,
                "failed".red().bold(),
                name,
                reason,
            ),
            JobStatus::Pending => return,
        };
        self.emit(&line);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn prompt(question: &str) -> io::Result<String> {
    print!("{question} ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

fn parse_yes_no(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    )
}

fn summary_json(summary: &RunSummary) -> serde_json::Value {
    json!({
        "total": summary.total,
        "succeeded": summary.succeeded,
        "failed": summary.failed,
        "input_megabytes": summary.input_megabytes,
        "output_megabytes": summary.output_megabytes,
        "elapsed_seconds": summary.elapsed.as_secs_f64(),
        "failures": summary.failures.iter().map(|failure| json!({
            "source": failure.source.display().to_string(),
            "reason": failure.reason.to_string(),
        })).collect::<Vec<_>>(),
    })
}

fn print_summary(summary: &RunSummary) {
    println!();
    if summary.all_succeeded() {
        println!(
            "{} {}",
            "success:".green().bold(),
            format!(
                "{} of {} file(s) normalized in {}",
                summary.succeeded,
                summary.total,
                format_hms(summary.elapsed),
            )
            .green(),
        );
    } else {
        println!(
            "{} of {} file(s) normalized, {} failed ({})",
            summary.succeeded,
            summary.total,
            summary.failed,
            format_hms(summary.elapsed),
        );
        for failure in &summary.failures {
            println!(
                "  {} {}: {}",
                "failed".red().bold(),
                failure.source.display(),
                failure.reason,
            );
        }
    }
    if summary.output_megabytes > 0.0 {
        println!(
            "Read {:.2} MB, wrote {:.2} MB",
            summary.input_megabytes, summary.output_megabytes,
        );
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "relevel", &mut io::stdout());
        return Ok(());
    }

    let (directory, recurse) = match cli.directory.clone() {
        Some(directory) => (directory, cli.recurse),
        None => {
            let directory =
                PathBuf::from(prompt("Enter the directory path containing videos:")?);
            let recurse =
                cli.recurse || parse_yes_no(&prompt("Process subdirectories? (y/n):")?);
            (directory, recurse)
        }
    };
    let directory = std::fs::canonicalize(&directory).unwrap_or(directory);

    let config = NormalizeConfig::new()
        .with_target_loudness(cli.target_loudness)
        .with_loudness_range(cli.loudness_range)
        .with_true_peak(cli.true_peak)
        .with_audio_bitrate(cli.audio_bitrate)
        .with_output_prefix(cli.prefix.clone())
        .with_recursion(recurse);

    println!("Scanning directory: {}", directory.display());
    let mut discovery = discover(&directory, &config)?;
    for warning in &discovery.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }

    let total = discovery.jobs.len();
    println!("Found {total} video file(s)");
    if total == 0 {
        return Ok(());
    }

    let tool = match cli.ffmpeg.clone() {
        Some(program) => FfmpegTool::with_program(program),
        None => FfmpegTool::from_environment(),
    };

    let progress_bar = if cli.progress {
        let bar = ProgressBar::new(total as u64);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Some(bar)
    } else {
        None
    };

    let observer = Arc::new(TerminalProgress {
        bar: progress_bar.clone(),
        to_stderr: cli.json,
    });

    let driver = BatchDriver::new(tool, config).with_observer(observer);
    let summary = driver.run(&mut discovery.jobs)?;

    if let Some(bar) = progress_bar {
        bar.finish_with_message("done");
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary_json(&summary))?);
    } else {
        print_summary(&summary);
    }

    // Per-file failures are reflected in the summary, not the exit code.
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
