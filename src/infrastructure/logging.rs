use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::DomainError;

const LOG_TARGET: &str = "gemini_tts_batch";

fn default_filter(level: &str) -> String {
    format!("{}={},warn", LOG_TARGET, level)
}

/// Initialize console logging plus optional daily-rotated JSON log files.
///
/// Returns a guard that must be kept alive for the duration of the host
/// session; dropping it flushes pending file output. If the host already
/// installed a global subscriber, that subscriber stays in place.
pub fn init_logging(
    logs_dir: &Path,
    level: &str,
    file_logging: bool,
    max_files: usize,
) -> Result<Option<WorkerGuard>, DomainError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::NONE)
        .with_filter(env_filter);

    if !file_logging {
        let _ = tracing_subscriber::registry().with(console_layer).try_init();
        tracing::info!(level = level, "Logging initialized (console only)");
        return Ok(None);
    }

    fs::create_dir_all(logs_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_TARGET)
        .filename_suffix("log")
        .max_log_files(max_files.max(1))
        .build(logs_dir)
        .map_err(|e| DomainError::Io(format!("Failed to create log file appender: {}", e)))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(EnvFilter::new(default_filter(level)));

    if tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
    {
        tracing::info!(
            logs_dir = ?logs_dir,
            level = level,
            max_files = max_files,
            "Logging initialized with file output"
        );
    }

    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter("debug"), "gemini_tts_batch=debug,warn");
    }

    #[test]
    fn test_file_logging_creates_dir() {
        let temp_dir = env::temp_dir().join("gemini_tts_batch_log_test");
        let _ = fs::remove_dir_all(&temp_dir);

        // A global subscriber may already exist in the test binary; init must
        // still succeed and hand back the file writer guard.
        let guard = init_logging(&temp_dir, "info", true, 3).unwrap();
        assert!(guard.is_some());
        assert!(temp_dir.exists());

        drop(guard);
        let _ = fs::remove_dir_all(&temp_dir);
    }
}
