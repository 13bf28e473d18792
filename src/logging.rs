//! Tracing setup. The UI owns the terminal, so events go to the systemd
//! journal when one is reachable and to rotating files otherwise.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives for the subscriber, e.g. `warn` or `mememanager::assets=trace`.
pub const LOG_ENV: &str = "MEMEMANAGER_LOG";

const DEFAULT_DIRECTIVES: &str = "info";
const LOG_FILE_PREFIX: &str = "mememanager.log";

/// Kept until exit so the background writer flushes what it buffered.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mememanager")
        .join("logs")
}

/// Non-blocking writer over files in `dir` that roll over daily.
fn file_writer(dir: &Path) -> Result<NonBlocking> {
    fs::create_dir_all(dir)?;
    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(dir, LOG_FILE_PREFIX));
    let _ = FILE_GUARD.set(guard);
    Ok(writer)
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(log_dir: Option<PathBuf>) -> Result<()> {
    let filter = filter_from(std::env::var(LOG_ENV).ok().as_deref());

    #[cfg(target_os = "linux")]
    {
        if let Ok(journal) = tracing_journald::layer() {
            tracing_subscriber::registry().with(filter).with(journal).try_init()?;
            tracing::debug!("sending events to the journal");
            return Ok(());
        }
    }

    let dir = log_dir.unwrap_or_else(default_log_dir);
    let writer = file_writer(&dir)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()?;

    tracing::debug!(dir = %dir.display(), "writing events to log files");
    Ok(())
}
