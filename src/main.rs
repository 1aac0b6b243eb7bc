use anyhow::Result;
use tabtally::{cli::run_cli, utils::runtime::block_on_detached};
use tracing::error;

fn main() -> Result<()> {
    block_on_detached(run_cli())?.inspect_err(|e| {
        error!("Error running cli {e:?}");
    })
}
