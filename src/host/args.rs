use std::{path::PathBuf, time::Duration};

use clap::Parser;
use tracing::level_filters::LevelFilter;

use super::{
    protocol::MessageFraming, HostConfig, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_IDLE_THRESHOLD,
};

/// Arguments of `tabtally-host`. Browsers start the host with the extension origin (chromium)
/// or the manifest path and extension id (firefox) as positional arguments.
#[derive(Parser, Debug)]
#[command(name = "tabtally-host", version, about = "Native messaging host tracking time spent on websites")]
pub struct HostArgs {
    #[arg(help = "Arguments passed by the browser when launching the host")]
    pub launch_args: Vec<String>,
    /// Passed by chromium on Windows.
    #[arg(long = "parent-window")]
    pub parent_window: Option<i64>,
    #[arg(long)]
    pub dir: Option<PathBuf>,
    #[command(flatten)]
    pub options: HostOptions,
    /// This option is for debugging purposes only. Logs are mirrored to stderr.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct HostOptions {
    #[arg(long, default_value_t = MessageFraming::Native, help = "How messages are delimited on stdin/stdout")]
    pub framing: MessageFraming,
    #[arg(
        long = "idle-threshold",
        default_value_t = DEFAULT_IDLE_THRESHOLD.as_secs(),
        help = "Seconds without input after which the user is considered idle"
    )]
    pub idle_threshold_secs: u64,
    #[arg(
        long = "heartbeat",
        default_value_t = DEFAULT_HEARTBEAT_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds between forced saves of the current segment"
    )]
    pub heartbeat_secs: u64,
}

impl HostOptions {
    pub fn config(&self) -> HostConfig {
        HostConfig {
            framing: self.framing,
            idle_threshold: Duration::from_secs(self.idle_threshold_secs),
            heartbeat_interval: Duration::from_secs(self.heartbeat_secs),
        }
    }
}
