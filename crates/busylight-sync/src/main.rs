//! busylight-sync: show the busy state of your time-tracking apps on a USB busylight.

use std::path::PathBuf;

use clap::Parser;

use busylight_sync_lib::shutdown::Shutdown;

mod cli;

#[derive(Parser)]
#[command(
    name = "busylight-sync",
    version,
    about = "Keep a USB busylight in sync with the busy state of your time-tracking apps"
)]
struct Args {
    /// Output as JSON (for poll, config, devices)
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (default: <config dir>/busylight-sync/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    // One-shot commands keep the default Ctrl+C behaviour and die immediately.
    let shutdown = Shutdown::new();
    if args.command.watches_shutdown() {
        let handler_shutdown = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || handler_shutdown.trigger()) {
            log::warn!("cannot install Ctrl+C handler: {e}");
        }
    }

    let opts = cli::GlobalOpts {
        json: args.json,
        config: args.config,
    };
    if let Err(e) = cli::run(args.command, &opts, &shutdown) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
