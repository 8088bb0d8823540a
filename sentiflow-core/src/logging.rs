//! Tracing setup for the stage processes.
//!
//! Two layers: human-readable events on stderr, and JSON events in a per-run
//! file under `<log_dir>/<MM_DD_YYYY>/<HH_MM_SS>.log`.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Keeps the file writer alive; dropping it flushes pending log lines.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
    pub log_file: Option<PathBuf>,
}

/// Map `-v`/`-q` flags to a filter directive.
pub fn level_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Path of the log file for a run started at `now`.
pub fn log_file_path(log_dir: &Path, now: DateTime<Local>) -> PathBuf {
    log_dir
        .join(now.format("%m_%d_%Y").to_string())
        .join(format!("{}.log", now.format("%H_%M_%S")))
}

/// Install the global subscriber.
///
/// `log_dir = None` disables the file layer. A log directory that cannot be
/// created also disables it rather than failing the stage.
pub fn init_logging(verbose: u8, quiet: bool, log_dir: Option<&Path>) -> LogGuard {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(level_filter(verbose, quiet)));

    let mut guard = None;
    let mut log_file = None;
    let json_layer = log_dir.and_then(|dir| {
        let path = log_file_path(dir, Local::now());
        let parent = path.parent()?;
        std::fs::create_dir_all(parent).ok()?;
        let file_name = path.file_name()?.to_os_string();
        let appender = tracing_appender::rolling::never(parent, file_name);
        let (non_blocking, worker) = tracing_appender::non_blocking(appender);
        guard = Some(worker);
        log_file = Some(path);
        Some(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new("debug")),
        )
    });

    // A second init (tests, repeated calls) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init();

    LogGuard {
        _file: guard,
        log_file,
    }
}
