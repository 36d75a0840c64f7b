//! Structured logging for events and tracing initialization
//!
//! Events arriving from the ops crate are turned into tracing records with
//! structured fields, at the level the event itself reports.

use migsweep_config::Config;
use migsweep_events::{AppEvent, GeneralEvent, SweepEvent};
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,migsweep=info";
const DEBUG_FILTER: &str = "info,migsweep=debug";

/// Initialize tracing/logging
///
/// Normal runs log to stderr with `warn,migsweep=info`. With `--debug` (or
/// `RUST_LOG` set) records are written as JSON to a timestamped file in the
/// log directory. JSON output mode never writes logs to the console.
pub fn init_tracing(json_mode: bool, debug_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_flag;

    if debug_enabled {
        match open_log_file() {
            Ok((file, path)) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(filter_or(DEBUG_FILTER))
                    .init();
                if !json_mode {
                    eprintln!("Debug logging enabled: {}", path.display());
                }
                return;
            }
            Err(e) if !json_mode => {
                eprintln!("Warning: Failed to create log file: {e}");
            }
            Err(_) => {}
        }
    }

    if json_mode {
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter_or(DEFAULT_FILTER))
            .init();
    }
}

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn open_log_file() -> std::io::Result<(std::fs::File, std::path::PathBuf)> {
    let log_dir = Config::logs_dir();
    std::fs::create_dir_all(&log_dir)?;
    let path = log_dir.join(format!(
        "migsweep-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));
    let file = std::fs::File::create(&path)?;
    Ok((file, path))
}

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    let source = event.log_target();
    match event {
        AppEvent::Sweep(SweepEvent::RepositoryFinished {
            repository,
            outcome,
            detail,
        }) => {
            if event.log_level() == tracing::Level::ERROR {
                error!(
                    source,
                    repository = %repository,
                    outcome = %outcome,
                    detail = ?detail,
                    "Repository failed"
                );
            } else {
                info!(
                    source,
                    repository = %repository,
                    outcome = %outcome,
                    detail = ?detail,
                    "Repository finished"
                );
            }
        }
        AppEvent::Sweep(SweepEvent::FileDeleted { fork, path, reason }) => {
            debug!(source, fork = %fork, path = %path, reason = %reason, "File deleted");
        }
        AppEvent::Sweep(SweepEvent::DeletionFailed {
            fork,
            path,
            failure,
        }) => {
            warn!(
                source,
                fork = %fork,
                path = %path,
                retryable = failure.retryable,
                code = ?failure.code,
                message = %failure.message,
                hint = ?failure.hint,
                "Deletion failed"
            );
        }
        AppEvent::Sweep(SweepEvent::PullRequestOpened {
            repository,
            pull_request,
        }) => {
            info!(
                source,
                repository = %repository,
                number = pull_request.number,
                url = %pull_request.url,
                "Pull request opened"
            );
        }
        AppEvent::Sweep(SweepEvent::RunCompleted {
            total,
            cleaned,
            errors,
        }) => {
            info!(source, total, cleaned, errors, "Run completed");
        }
        AppEvent::General(GeneralEvent::Warning { message, context }) => {
            warn!(source, message = %message, context = ?context, "Warning");
        }
        AppEvent::General(GeneralEvent::DebugLog { message, context }) => {
            debug!(source, message = %message, context = ?context, "Debug log");
        }
        _ => match event.log_level() {
            tracing::Level::ERROR => error!(source, event = ?event, "Application event"),
            tracing::Level::WARN => warn!(source, event = ?event, "Application event"),
            tracing::Level::INFO => info!(source, event = ?event, "Application event"),
            tracing::Level::DEBUG => debug!(source, event = ?event, "Application event"),
            tracing::Level::TRACE => trace!(source, event = ?event, "Application event"),
        },
    }
}
