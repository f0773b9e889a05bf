//! Tracing subscriber setup.
//!
//! The filter comes from `PLV_LOG`, then `RUST_LOG`, then
//! [`LoggingConfig::filter`]. When `log_dir` is set, a second layer writes
//! plain-text logs to a daily-rotated file.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{PlvError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable checked before `RUST_LOG`
pub const LOG_ENV_VAR: &str = "PLV_LOG";

/// Log file name prefix inside `log_dir`
pub const LOG_FILE_PREFIX: &str = "plv.log";

/// Resolve the filter directive from the environment or the config.
pub fn filter_directive(config: &LoggingConfig) -> String {
    std::env::var(LOG_ENV_VAR)
        .or_else(|_| std::env::var(EnvFilter::DEFAULT_ENV))
        .unwrap_or_else(|_| config.filter.clone())
}

/// Install the global subscriber.
///
/// Returns the file writer's guard when file logging is enabled; keep it
/// alive until shutdown or buffered lines are lost.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(filter_directive(config))
        .map_err(|e| PlvError::Logging(format!("Invalid log filter: {}", e)))?;

    let console = match config.format {
        LogFormat::Full => fmt::layer().with_ansi(config.ansi).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_ansi(config.ansi).boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
    };

    let (file, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| PlvError::Logging(e.to_string()))?;

    Ok(guard)
}
