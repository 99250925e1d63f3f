use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "geo-chat.log";

/// Route `tracing` output to `<dir>/geo-chat.log`.
///
/// `RUST_LOG` wins over the default level. The returned guard flushes the
/// writer when dropped and must outlive the TUI.
pub fn init(dir: &Path, verbose: bool) -> Result<(WorkerGuard, PathBuf)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let default_level = if verbose { "debug" } else { "info" };
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_owned());
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid tracing filter `{directives}`"))?;

    let appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))?;

    let path = dir.join(LOG_FILE);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %path.display(),
        log_filter = %directives,
        "tracing enabled"
    );
    Ok((guard, path))
}
