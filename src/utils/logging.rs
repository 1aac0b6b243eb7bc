use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::{format::FmtSpan, writer::MakeWriterExt};

pub const CLI_PREFIX: &str = "cli";
pub const HOST_PREFIX: &str = "host";

/// Enables logging into daily rotated files inside `logs_path`. Console output always goes to
/// stderr, because stdout of the host is the channel the browser reads messages from.
pub fn enable_logging(
    prefix: &str,
    logs_path: &Path,
    log_level: Option<LevelFilter>,
    show_console: bool,
) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(prefix)
        .build(logs_path)?;

    let stderr = std::io::stderr.with_filter(move |_| show_console);

    let level = log_level
        .map(|v| v.to_string())
        .unwrap_or_else(|| std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!(
            "{}={level}",
            env!("CARGO_PKG_NAME").replace("-", "_"),
        )))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stderr.and(appender))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger {e}"))?;
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
