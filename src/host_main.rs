use anyhow::Result;
use clap::Parser;
use tabtally::{
    host::{args::HostArgs, start_host},
    utils::{
        dir::application_path_or_default,
        logging::{enable_logging, HOST_PREFIX},
        runtime::block_on_detached,
    },
};
use tracing::{error, info};

fn main() -> Result<()> {
    let args = HostArgs::parse();
    let app_dir = application_path_or_default(args.dir.clone())?;
    enable_logging(HOST_PREFIX, &app_dir.join("logs"), args.log, args.log_console)?;
    info!(
        "Launched with {:?}, parent window {:?}",
        args.launch_args, args.parent_window
    );

    block_on_detached(start_host(app_dir, args.options.config()))?
        .inspect_err(|e| error!("Host stopped with an error {e:?}"))
}
