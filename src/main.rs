mod auth;
mod builds;
mod cli;
mod config;
mod error;
mod output;
mod poll;
mod providers;
mod snapshot;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use error::BuildQueueError;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting build-queue");

    if let Err(e) = cli.execute().await {
        if matches!(
            e.downcast_ref::<BuildQueueError>(),
            Some(BuildQueueError::ConfigurationMissing)
        ) {
            eprintln!("{e}");
            eprintln!("{}", Cli::usage());
            std::process::exit(1);
        }
        return Err(e);
    }

    Ok(())
}
