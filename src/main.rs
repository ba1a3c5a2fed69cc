//! # Spectro Service Daemon
//!
//! Launches the spectroscopic data service over the configuration
//! document.
//!
//! ## Usage
//!
//! ```bash
//! # Async (event-loop) server, the default
//! specserver --host 0.0.0.0 --port 6999 --config /etc/spec/config.json
//!
//! # Thread-backed server
//! specserver --sync --port 6999
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use specserver::config::Config;
use specserver::service::{self, AppState};

/// Spectroscopic data service daemon
#[derive(Parser)]
#[command(name = "specserver")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run the thread-backed server instead of the async server
    #[arg(short, long)]
    sync: bool,

    /// Listener host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Listener port
    #[arg(long, default_value_t = 6999)]
    port: u16,

    /// Configuration document; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Service profile to run under
    #[arg(long, default_value = "default")]
    profile: String,

    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => {
            Config::load(path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => Config::builtin(),
    };
    let state = AppState::new(config, &args.profile)?;

    // --sync keeps request handling on one thread with a blocking pool
    // behind it; the default spreads the event loop across cores.
    let runtime = if args.sync {
        log::info!("starting thread-backed server");
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?
    } else {
        log::info!("starting async server");
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
    };
    runtime.block_on(service::serve(state, &args.host, args.port))
}
