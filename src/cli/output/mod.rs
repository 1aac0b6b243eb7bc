pub mod analysis;
pub mod render;

use std::fmt::Display;

use analysis::{merge_records, UsageStats};
use anyhow::Result;
use chrono::NaiveDate;
use clap::ValueEnum;
use tracing::debug;

use crate::{host::storage::daily_storage::DailyStorage, utils::time::trailing_days};

/// Number of days covered by [StatsView::Weekly], today included.
const WEEK_DAYS: u64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatsView {
    Daily,
    Weekly,
}

impl Display for StatsView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsView::Daily => write!(f, "daily"),
            StatsView::Weekly => write!(f, "weekly"),
        }
    }
}

/// Days a view covers, starting with `today`.
pub fn view_dates(view: StatsView, today: NaiveDate) -> Vec<NaiveDate> {
    match view {
        StatsView::Daily => vec![today],
        StatsView::Weekly => trailing_days(today, WEEK_DAYS),
    }
}

/// Loads usage of every domain in the `view` ending `today`.
pub async fn load_stats(
    storage: &impl DailyStorage,
    view: StatsView,
    today: NaiveDate,
) -> Result<UsageStats> {
    let dates = view_dates(view, today);
    let records = storage.get(&dates).await?;
    debug!("Loaded {} of {} days for {view} view", records.len(), dates.len());
    Ok(merge_records(&dates, &records))
}
