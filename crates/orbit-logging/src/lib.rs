use anyhow::Context;
use orbit_contracts::{AppError, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{Builder as RollingBuilder, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_DIR_NAME: &str = "logs";
const LOG_FILE_PREFIX: &str = "orbit";
const LOG_FILE_SUFFIX: &str = "log";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_LEVEL_ENV: &str = "ORBIT_LOG_LEVEL";
const DEFAULT_KEEP_DAYS: u64 = 7;
const MAX_LOG_TEXT_LEN: usize = 256;

#[derive(Debug, Clone)]
pub struct LoggingGuard {
    log_dir: PathBuf,
    level: String,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn level(&self) -> &str {
        &self.level
    }
}

fn worker_guard_slot() -> &'static Mutex<Option<WorkerGuard>> {
    static SLOT: OnceLock<Mutex<Option<WorkerGuard>>> = OnceLock::new();
    SLOT.get_or_init(|| Mutex::new(None))
}

/// Installs the global subscriber: JSON lines to `<app_data>/logs/orbit.*.log`
/// and, in debug builds, a compact console layer. Expired files are removed
/// first. A second call keeps the subscriber that is already installed.
pub fn init_logging(app_data_dir: &Path) -> Result<LoggingGuard, AppError> {
    let log_dir = app_data_dir.join(LOG_DIR_NAME);
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("create log dir: {}", log_dir.display()))
        .with_code("log_dir_create_failed", "Failed to create log directory")
        .with_ctx("logDir", log_dir.display().to_string())?;

    let removed = cleanup_expired_logs(&log_dir, DEFAULT_KEEP_DAYS)?;
    let level = resolve_log_level();
    if tracing::dispatcher::has_been_set() {
        return Ok(LoggingGuard { log_dir, level });
    }

    let file_writer = open_file_writer(&log_dir)?;
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_current_span(false)
        .with_span_list(false);
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new(&level))
        .with(file_layer);
    #[cfg(debug_assertions)]
    let subscriber = subscriber.with(
        tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(true)
            .with_target(true),
    );

    subscriber
        .try_init()
        .with_context(|| format!("init log subscriber: level={level}"))
        .with_code("log_subscriber_init_failed", "Failed to initialize logging")
        .with_ctx("logLevel", level.clone())?;

    if removed > 0 {
        tracing::info!(event = "expired_logs_removed", removed);
    }
    Ok(LoggingGuard { log_dir, level })
}

fn open_file_writer(log_dir: &Path) -> Result<NonBlocking, AppError> {
    let file_appender = RollingBuilder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(log_dir)
        .with_context(|| format!("create log appender: {}", log_dir.display()))
        .with_code("log_appender_create_failed", "Failed to create log writer")
        .with_ctx("logDir", log_dir.display().to_string())?;
    let (writer, worker_guard) = tracing_appender::non_blocking(file_appender);

    // The writer thread stops when this guard drops.
    let mut slot = match worker_guard_slot().lock() {
        Ok(slot) => slot,
        Err(poisoned) => poisoned.into_inner(),
    };
    *slot = Some(worker_guard);
    Ok(writer)
}

/// `ORBIT_LOG_LEVEL` when valid, else `debug` in debug builds and `info`
/// in release.
pub fn resolve_log_level() -> String {
    let from_env = std::env::var(LOG_LEVEL_ENV).ok();
    parse_log_level(from_env.as_deref()).unwrap_or_else(|| {
        let fallback = if cfg!(debug_assertions) { "debug" } else { "info" };
        fallback.to_string()
    })
}

fn parse_log_level(value: Option<&str>) -> Option<String> {
    let level = value?.trim().to_ascii_lowercase();
    LOG_LEVELS.contains(&level.as_str()).then_some(level)
}

/// Deletes this app's rolled log files older than `keep_days`. Other files
/// in the directory are left alone.
pub fn cleanup_expired_logs(log_dir: &Path, keep_days: u64) -> Result<usize, AppError> {
    let keep_duration = Duration::from_secs(keep_days.saturating_mul(24 * 60 * 60));
    cleanup_expired_logs_with_duration(log_dir, keep_duration, SystemTime::now())
}

fn is_own_log_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            name.starts_with(&format!("{LOG_FILE_PREFIX}."))
                && name.ends_with(&format!(".{LOG_FILE_SUFFIX}"))
        })
}

fn cleanup_expired_logs_with_duration(
    log_dir: &Path,
    keep_duration: Duration,
    now: SystemTime,
) -> Result<usize, AppError> {
    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(error) => {
            return Err(AppError::new(
                "log_cleanup_read_dir_failed",
                "Failed to read log directory",
            )
            .with_source(error)
            .with_context("logDir", log_dir.display().to_string()));
        }
    };

    let expired = entries
        .flatten()
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        .filter(|entry| is_own_log_file(&entry.path()))
        .filter(|entry| {
            entry
                .metadata()
                .and_then(|meta| meta.modified())
                .is_ok_and(|modified_at| {
                    now.duration_since(modified_at).unwrap_or_default() > keep_duration
                })
        })
        .map(|entry| entry.path())
        .collect::<Vec<_>>();

    for path in &expired {
        fs::remove_file(path)
            .with_context(|| format!("remove expired log: {}", path.display()))
            .with_code("log_cleanup_remove_failed", "Failed to remove expired log")
            .with_ctx("logPath", path.display().to_string())?;
    }
    Ok(expired.len())
}

/// Flattens text to one bounded line before it reaches a log record.
pub fn sanitize_for_log(value: &str) -> String {
    let single_line = value.replace(['\r', '\n'], " ");
    let trimmed = single_line.trim();
    if trimmed.chars().count() <= MAX_LOG_TEXT_LEN {
        return trimmed.to_string();
    }
    let mut truncated: String = trimmed.chars().take(MAX_LOG_TEXT_LEN).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
#[path = "../tests/logging/logging_tests.rs"]
mod tests;
