//! Logging setup
//!
//! Hook invocations speak JSON over stdout, so logs go to a daily rolling
//! file under `.orchestration/logs` instead. The filter comes from
//! `INTENT_GATE_LOG` (default `info`).

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "INTENT_GATE_LOG";

/// Log file name prefix (a date suffix is added per day)
const LOG_FILE_PREFIX: &str = "intent-gate.log";

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global subscriber writing to `log_dir`
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes buffered lines. Calling this twice is harmless: the second
/// install fails silently and the first subscriber stays.
pub fn init_logging(log_dir: impl AsRef<Path>, format: LogFormat) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir.as_ref())?;

    let appender = tracing_appender::rolling::daily(log_dir.as_ref(), LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }

    Ok(guard)
}
