#![cfg(not(tarpaulin_include))]

use clap::Parser;
use swreq::app;
use swreq::config::ServerConfig;

/// Entry point for the survey intake service
///
/// Reads the mail settings named by `--config`, makes sure the request
/// directory exists and serves the form until interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::parse();
    log::info!(
        "Saving requests under {} (mail settings: {})",
        config.save_dir,
        config.config
    );

    app::run(config).await
}
