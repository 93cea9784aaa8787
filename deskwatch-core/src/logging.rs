//! Logging infrastructure for deskwatch
//!
//! The tracker runs headless, so logs go to daily-rotated files under
//! `~/.local/state/deskwatch/` rather than stdout. `RUST_LOG` overrides the
//! configured level, and rotated files beyond `max_files` are pruned at
//! startup.

use crate::config::{Config, LoggingConfig};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Guard that keeps the logging worker alive; dropping it flushes any
/// pending writes.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Initialize file logging per the config. Returns a guard the caller must
/// hold for the lifetime of the process.
pub fn init(config: &LoggingConfig) -> crate::error::Result<LoggingGuard> {
    let log_dir = Config::state_dir();
    std::fs::create_dir_all(&log_dir)?;
    prune_rotated_logs(&log_dir, config.max_files);

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "deskwatch.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG wins over the configured level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    tracing::info!(
        log_dir = %log_dir.display(),
        level = %config.level,
        "logging initialized"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Delete the oldest rotated log files so at most `max_files` remain.
/// Rotated names sort chronologically (`deskwatch.log.YYYY-MM-DD`).
fn prune_rotated_logs(log_dir: &Path, max_files: usize) {
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return;
    };

    let mut logs: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("deskwatch.log"))
        })
        .collect();

    if logs.len() <= max_files {
        return;
    }

    logs.sort();
    let excess = logs.len() - max_files;
    for path in logs.into_iter().take(excess) {
        if let Err(e) = std::fs::remove_file(&path) {
            eprintln!("failed to prune old log {}: {e}", path.display());
        }
    }
}

/// Initialize logging for tests (logs to the test writer)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Returns the log file path
pub fn log_file_path() -> PathBuf {
    Config::log_path()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_path() {
        let path = log_file_path();
        assert!(path.ends_with("deskwatch.log"));
    }

    #[test]
    fn test_prune_keeps_newest_logs() {
        let dir = TempDir::new().unwrap();
        for day in ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"] {
            std::fs::write(dir.path().join(format!("deskwatch.log.{day}")), "x").unwrap();
        }
        std::fs::write(dir.path().join("unrelated.txt"), "x").unwrap();

        prune_rotated_logs(dir.path(), 2);

        let mut remaining: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(
            remaining,
            vec![
                "deskwatch.log.2024-01-03",
                "deskwatch.log.2024-01-04",
                "unrelated.txt"
            ]
        );
    }
}
