#![cfg(not(tarpaulin_include))]

use algocanvas::app;
use algocanvas::config::ServerConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "website", about = "Serve the AlgoCanvas API.")]
struct Args {
    /// Listen address (defaults to $ALGOCANVAS_ADDR or 127.0.0.1:3000).
    #[arg(long)]
    addr: Option<String>,

    /// Saved-visualization directory (defaults to $ALGOCANVAS_DATA_DIR or ./saved).
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

/// Main entry point for the web application
///
/// Reads configuration from the environment, applies any command-line
/// overrides and serves the API until the process is stopped.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig::from_env().with_overrides(args.addr, args.data_dir);

    app::run(config).await
}
