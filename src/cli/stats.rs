use std::{io::IsTerminal, path::Path};

use anyhow::Result;
use clap::Parser;
use url::Url;

use crate::{
    host::{storage::daily_storage::JsonDailyStorage, RECORDS_DIR},
    utils::clock::{Clock, DefaultClock},
};

use super::{
    favicon::{FaviconService, DEFAULT_FAVICON_SERVICE},
    output::{
        load_stats,
        render::{render_stats, RenderOptions},
        StatsView,
    },
};

#[derive(Debug, Parser)]
pub struct StatsCommand {
    #[arg(long, short, default_value_t = StatsView::Daily, help = "Show today or the last 7 days")]
    pub view: StatsView,
    #[arg(long, short, help = "Show every domain instead of the top 5")]
    pub all: bool,
    #[arg(long, help = "Print a favicon url next to every domain")]
    pub favicons: bool,
    #[arg(long = "favicon-service", default_value = DEFAULT_FAVICON_SERVICE, help = "Service used to look up favicons")]
    pub favicon_service: Url,
}

/// Command to process `stats` command. Prints usage per domain for the chosen view.
pub async fn process_stats_command(
    StatsCommand {
        view,
        all,
        favicons,
        favicon_service,
    }: StatsCommand,
    app_dir: &Path,
) -> Result<()> {
    let options = RenderOptions {
        expanded: all,
        colored: std::io::stdout().is_terminal(),
        favicons: favicons.then(|| FaviconService::new(favicon_service)),
    };
    print_stats(app_dir, view, &options).await
}

pub async fn print_stats(app_dir: &Path, view: StatsView, options: &RenderOptions) -> Result<()> {
    let storage = JsonDailyStorage::new(app_dir.join(RECORDS_DIR))?;
    let stats = load_stats(&storage, view, DefaultClock.today()).await?;
    print!("{}", render_stats(&stats, view, options));
    Ok(())
}
