pub mod clear;
pub mod favicon;
pub mod output;
pub mod stats;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clear::process_clear_command;
use stats::{process_stats_command, StatsCommand};
use tracing::level_filters::LevelFilter;

use crate::{
    host::{args::HostOptions, start_host},
    utils::{
        dir::application_path_or_default,
        logging::{enable_logging, CLI_PREFIX, HOST_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Tabtally", version, long_about = None)]
#[command(about = "Tracks and shows time spent on websites", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Display time spent per website")]
    Stats {
        #[command(flatten)]
        command: StatsCommand,
    },
    #[command(about = "Remove all recorded usage")]
    Clear {
        #[arg(long, short, help = "Don't ask for confirmation")]
        yes: bool,
    },
    #[command(
        about = "Run the native messaging host directly in current console. Used for debugging"
    )]
    Serve {
        #[command(flatten)]
        options: HostOptions,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let app_dir = application_path_or_default(args.dir)?;
    let prefix = match args.commands {
        Commands::Serve { .. } => HOST_PREFIX,
        Commands::Stats { .. } | Commands::Clear { .. } => CLI_PREFIX,
    };
    enable_logging(prefix, &app_dir.join("logs"), logging_level, args.log)?;

    match args.commands {
        Commands::Stats { command } => process_stats_command(command, &app_dir).await,
        Commands::Clear { yes } => process_clear_command(yes, &app_dir).await,
        Commands::Serve { options } => start_host(app_dir, options.config()).await,
    }
}
