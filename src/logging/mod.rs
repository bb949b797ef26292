//! Application logging
//!
//! Installs the tracing subscriber: formatted output on stderr and,
//! optionally, a log file per day in the config directory.

use crate::core::config_file::ConfigFile;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "linesetter=info";

/// Get the path to the logs directory
pub fn logs_dir() -> PathBuf {
    ConfigFile::logs_dir()
}

/// Log files are named `linesetter.log.<date>`, one per day
pub const LOG_FILE_PREFIX: &str = "linesetter.log";

fn file_appender(logs_dir: &Path) -> RollingFileAppender {
    rolling::daily(logs_dir, LOG_FILE_PREFIX)
}

/// Install the global subscriber.
///
/// `filter` uses `RUST_LOG` syntax and defaults to [`DEFAULT_LOG_FILTER`].
/// When logging to a file the returned guard flushes it on drop and must be
/// held until exit.
pub fn init_logging(filter: Option<&str>, log_to_file: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = filter.unwrap_or(DEFAULT_LOG_FILTER);
    let env_filter =
        EnvFilter::try_new(filter).with_context(|| format!("invalid log filter '{filter}'"))?;
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    if !log_to_file {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .try_init()?;
        return Ok(None);
    }

    let logs_dir = logs_dir();
    fs::create_dir_all(&logs_dir)
        .with_context(|| format!("failed to create logs directory {}", logs_dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file_appender(&logs_dir));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()?;
    tracing::info!("Logging to {}", logs_dir.join(LOG_FILE_PREFIX).display());
    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_log_file_rolls_daily() {
        let dir = tempfile::tempdir().unwrap();
        let mut appender = file_appender(dir.path());
        appender.write_all(b"hello\n").unwrap();
        appender.flush().unwrap();

        let expected = format!("{}.{}", LOG_FILE_PREFIX, chrono::Utc::now().format("%Y-%m-%d"));
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![expected.clone()]);
        assert_eq!(fs::read_to_string(dir.path().join(expected)).unwrap(), "hello\n");
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        assert!(init_logging(Some("linesetter=[bad"), false).is_err());
    }
}
