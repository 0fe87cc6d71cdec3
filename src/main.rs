//! AutoEngage - queue-driven like/comment automation.
//!
//! Main entry point for the autoengage CLI.

mod config;
mod sim;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use autoengage_engine::{AutomationEngine, export};
use autoengage_protocols::{
    ExportFormat, ExportPayload, RunPhase, RunSettings, StartRequest, Summary, UrlStatus,
};
use autoengage_state::{AutomationState, FileStateStore, StateStore};

use crate::config::{AppConfig, ConfigLoader};
use crate::sim::{CliNotifier, SimPageActuator, SimTabController};

#[derive(Parser)]
#[command(name = "autoengage")]
#[command(about = "Queue-driven like/comment automation with durable state")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for durable state and debug logs
    #[arg(short, long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the automation over a list of post URLs
    Run {
        /// Post URLs to process, in order
        urls: Vec<String>,

        /// File with one URL per line (# starts a comment)
        #[arg(long)]
        urls_file: Option<PathBuf>,

        /// Comment text to post
        #[arg(long)]
        comment: Option<String>,

        /// Minimum delay between URLs, in seconds
        #[arg(long)]
        min_delay: Option<u64>,

        /// Maximum delay between URLs, in seconds
        #[arg(long)]
        max_delay: Option<u64>,

        /// Per-URL watchdog timeout, in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Retries allowed after the first attempt
        #[arg(long)]
        max_retries: Option<u32>,

        /// Simulate actions without performing them
        #[arg(long)]
        dry_run: bool,

        /// Do not like posts
        #[arg(long)]
        no_like: bool,

        /// Do not comment on posts
        #[arg(long)]
        no_comment: bool,
    },

    /// Show the persisted automation state
    Status,

    /// Export the activity log as CSV or JSON
    Export {
        /// Output format (csv, json)
        #[arg(long, default_value = "csv")]
        format: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Get the .autoengage directory path.
fn autoengage_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".autoengage"))
        .unwrap_or_else(|| PathBuf::from(".autoengage"))
}

/// Pick the state directory: flag, then config file, then the default.
fn resolve_state_dir(flag: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    if let Some(dir) = flag {
        return dir;
    }
    if let Some(dir) = &config.state_dir {
        return PathBuf::from(ConfigLoader::expand_path(dir));
    }
    autoengage_dir()
}

/// Initialize tracing with console and file output.
///
/// Log files are written to `<state-dir>/debug/` with daily rotation.
fn init_tracing(state_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = state_dir.join("debug");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("autoengage")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer guard alive for the program duration
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(_guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        // Console layer (human-readable, with colors)
        .with(fmt::layer().with_target(true).with_ansi(true))
        // File layer (no colors)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let app_config = match &cli.config {
        Some(path) => ConfigLoader::load(path)?,
        None => AppConfig::default(),
    };
    let state_dir = resolve_state_dir(cli.state_dir, &app_config);

    init_tracing(&state_dir)?;

    match cli.command {
        Commands::Run {
            urls,
            urls_file,
            comment,
            min_delay,
            max_delay,
            timeout,
            max_retries,
            dry_run,
            no_like,
            no_comment,
        } => {
            let urls = collect_urls(urls, urls_file.as_deref())?;

            let mut settings = app_config.run.clone();
            if let Some(comment) = comment {
                settings.comment = comment;
            }
            if let Some(min) = min_delay {
                settings.min_delay_secs = min;
            }
            if let Some(max) = max_delay {
                settings.max_delay_secs = max;
            }
            if let Some(timeout) = timeout {
                settings.url_timeout_secs = timeout;
            }
            if let Some(retries) = max_retries {
                settings.max_retries = retries;
            }
            if dry_run {
                settings.dry_run = true;
            }
            if no_like {
                settings.enable_like = false;
            }
            if no_comment {
                settings.enable_comment = false;
            }

            run_automation(&state_dir, &app_config, urls, settings).await
        }
        Commands::Status => show_status(&state_dir).await,
        Commands::Export { format, output } => {
            export_activity_log(&state_dir, &format, output).await
        }
    }
}

/// Merge URLs given on the command line with an optional URL file.
fn collect_urls(
    mut urls: Vec<String>,
    urls_file: Option<&Path>,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    if let Some(path) = urls_file {
        let content = std::fs::read_to_string(path)?;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            urls.push(line.to_string());
        }
    }
    Ok(urls)
}

/// Drive a full automation run in the foreground.
async fn run_automation(
    state_dir: &Path,
    config: &AppConfig,
    urls: Vec<String>,
    settings: RunSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting AutoEngage v{}", env!("CARGO_PKG_VERSION"));
    info!("State directory: {}", state_dir.display());

    let store = Arc::new(FileStateStore::new(state_dir).await?);
    let tabs = Arc::new(SimTabController::new(&config.simulator));
    let actuator = Arc::new(SimPageActuator::new(config.simulator.clone()));
    let (notifier, mut completed) = CliNotifier::new();

    let (engine, handle) = AutomationEngine::new(
        config.engine.clone(),
        store,
        tabs.clone(),
        actuator,
        Arc::new(notifier),
    );
    tabs.attach(handle.clone());
    let engine_task = engine.spawn();

    handle.start(StartRequest { urls, settings }).await?;

    // The start transition has run once this status call returns; an idle
    // phase here means the request was rejected (the log line has the cause).
    let state = handle.status().await?;
    if state.phase == RunPhase::Idle {
        handle.shutdown().await?;
        let _ = engine_task.await;
        return Err("automation did not start".into());
    }

    tokio::select! {
        summary = completed.recv() => {
            if let Some(summary) = summary {
                print_summary(&summary);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, stopping");
            handle.stop().await?;
        }
    }

    handle.shutdown().await?;
    let _ = engine_task.await;
    Ok(())
}

/// Print the persisted automation state.
async fn show_status(state_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStateStore::new(state_dir).await?;
    let Some(state) = store.load().await? else {
        println!("No saved automation state at {}", state_dir.display());
        return Ok(());
    };
    print_status(&state);
    Ok(())
}

/// Export the persisted activity log as CSV or JSON.
async fn export_activity_log(
    state_dir: &Path,
    format: &str,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let format: ExportFormat = format.parse()?;

    let store = FileStateStore::new(state_dir).await?;
    let Some(state) = store.load().await? else {
        return Err(format!("no saved automation state at {}", state_dir.display()).into());
    };

    let payload = ExportPayload {
        statistics: state.statistics,
        logs: state.activity_log.to_vec(),
    };
    let rendered = export::render(format, &payload, Utc::now());

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered)?;
            info!("Activity log exported to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn print_status(state: &AutomationState) {
    println!("AutoEngage Status");
    println!("=================");
    println!("Phase:    {}", state.phase);
    println!("Progress: {}/{}", state.current_index, state.urls.len());
    if let Some(started) = state.started_at {
        println!(
            "Started:  {}",
            started.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }

    if !state.urls.is_empty() {
        println!();
        println!("URLs:");
        for (index, url) in state.urls.iter().enumerate() {
            let status = &state.url_statuses[index];
            println!(
                "  {:>3}. {:<10} {}{}",
                index + 1,
                status.phase.to_string(),
                url,
                describe(status)
            );
        }
    }

    let stats = &state.statistics;
    println!();
    println!("Statistics");
    println!("----------");
    println!("Processed: {}", stats.processed);
    println!("Failed:    {}", stats.failed);
    println!("Skipped:   {}", stats.skipped);
    println!("Likes:     {}", stats.liked);
    println!("Comments:  {}", stats.commented);
}

/// Parenthesized detail for one URL line of the status report.
fn describe(status: &UrlStatus) -> String {
    let mut parts = Vec::new();
    if status.attempts > 0 {
        parts.push(format!("attempts: {}", status.attempts));
    }
    if status.liked {
        parts.push("liked".to_string());
    }
    if status.commented {
        parts.push("commented".to_string());
    }
    if status.skipped {
        parts.push("skipped".to_string());
    }
    if let Some(error) = &status.error {
        parts.push(error.code.to_string());
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("  ({})", parts.join(", "))
    }
}

fn print_summary(summary: &Summary) {
    println!();
    println!("Automation Summary");
    println!("==================");
    println!("Total URLs:   {}", summary.total);
    println!("Processed:    {}", summary.processed);
    println!("Failed:       {}", summary.failed);
    println!("Skipped:      {}", summary.skipped);
    println!("Likes:        {}", summary.liked);
    println!("Comments:     {}", summary.commented);
    println!("Success rate: {}%", summary.success_rate);
    println!("Duration:     {}s", summary.completion_time_seconds);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_arguments() {
        let cli = Cli::parse_from([
            "autoengage",
            "run",
            "https://example.com/post/1",
            "--comment",
            "Great post!",
            "--min-delay",
            "2",
            "--max-delay",
            "4",
            "--dry-run",
        ]);
        match cli.command {
            Commands::Run {
                urls,
                comment,
                min_delay,
                max_delay,
                dry_run,
                no_like,
                ..
            } => {
                assert_eq!(urls, ["https://example.com/post/1"]);
                assert_eq!(comment.as_deref(), Some("Great post!"));
                assert_eq!(min_delay, Some(2));
                assert_eq!(max_delay, Some(4));
                assert!(dry_run);
                assert!(!no_like);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_parse_export_defaults_to_csv() {
        let cli = Cli::parse_from(["autoengage", "export"]);
        match cli.command {
            Commands::Export { format, output } => {
                assert_eq!(format, "csv");
                assert!(output.is_none());
            }
            _ => panic!("expected export command"),
        }
    }

    #[test]
    fn test_collect_urls_merges_file_entries() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "https://example.com/post/2").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "# skipped comment line").unwrap();
        writeln!(file, "  https://example.com/post/3  ").unwrap();

        let urls = collect_urls(
            vec!["https://example.com/post/1".to_string()],
            Some(file.path()),
        )
        .unwrap();
        assert_eq!(
            urls,
            [
                "https://example.com/post/1",
                "https://example.com/post/2",
                "https://example.com/post/3",
            ]
        );
    }

    #[test]
    fn test_state_dir_precedence() {
        let config = AppConfig {
            state_dir: Some("/tmp/from-config".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_state_dir(Some(PathBuf::from("/tmp/from-flag")), &config),
            PathBuf::from("/tmp/from-flag")
        );
        assert_eq!(
            resolve_state_dir(None, &config),
            PathBuf::from("/tmp/from-config")
        );

        let empty = AppConfig::default();
        assert!(resolve_state_dir(None, &empty).ends_with(".autoengage"));
    }
}
