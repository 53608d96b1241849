// Logger initialization

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "medisia=info";
const LOG_FILE_PREFIX: &str = "medisia.log";

/// Where log records go
#[derive(Debug, Clone)]
pub enum LogTarget {
    /// Human-readable output on stderr (headless commands)
    Stderr,
    /// Daily rolling file in the given directory. Used while the TUI owns
    /// the terminal.
    File(PathBuf),
}

/// Install the global tracing subscriber.
///
/// For [`LogTarget::File`] the returned guard flushes buffered records on
/// drop and must be held until the program exits.
pub fn init_logging(target: LogTarget) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
            Ok(None)
        }
        LogTarget::File(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .try_init()?;
            Ok(Some(guard))
        }
    }
}
