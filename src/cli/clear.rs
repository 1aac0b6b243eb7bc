use std::{io::IsTerminal, path::Path};

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

use crate::host::{
    storage::daily_storage::{DailyStorage, JsonDailyStorage},
    RECORDS_DIR,
};

use super::{
    output::{render::RenderOptions, StatsView},
    stats::print_stats,
};

const CONFIRMATION_PROMPT: &str =
    "Are you sure you want to clear all usage data? This cannot be undone. [y/N] ";

/// Wipes every record, after asking for confirmation unless `assume_yes` is set.
pub async fn process_clear_command(assume_yes: bool, app_dir: &Path) -> Result<()> {
    if !assume_yes {
        let confirmed = confirm(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
        if !confirmed {
            println!("Nothing was removed.");
            return Ok(());
        }
    }

    let storage = JsonDailyStorage::new(app_dir.join(RECORDS_DIR))?;
    storage.clear().await?;
    info!("Cleared all records");

    let options = RenderOptions {
        expanded: false,
        colored: std::io::stdout().is_terminal(),
        favicons: None,
    };
    print_stats(app_dir, StatsView::Daily, &options).await
}

/// Asks the confirmation question. Only an explicit yes counts.
async fn confirm(
    mut input: impl AsyncBufRead + Unpin,
    mut output: impl AsyncWrite + Unpin,
) -> Result<bool> {
    output.write_all(CONFIRMATION_PROMPT.as_bytes()).await?;
    output.flush().await?;

    let mut answer = String::new();
    input.read_line(&mut answer).await?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}
