//! File-backed tracing setup.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};
use weda_core::config::paths;

/// Initializes the global tracing subscriber.
///
/// Log lines go to `logs/weda.log` under the weda home directory so stdout
/// stays reserved for command output. The returned guard flushes buffered
/// lines on drop and must live for the rest of the process.
///
/// # Errors
/// Returns an error if the logs directory cannot be created or a subscriber
/// is already installed.
pub fn init() -> Result<WorkerGuard> {
    let logs_dir = paths::logs_dir();
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("create logs dir {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::never(&logs_dir, "weda.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(writer);

    // RUST_LOG=
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    let subscriber = Registry::default().with(fmt_layer).with(env_filter);
    tracing::subscriber::set_global_default(subscriber).context("set tracing subscriber")?;

    Ok(guard)
}
