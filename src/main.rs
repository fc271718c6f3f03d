mod ansi;
mod codec;
mod config;
mod error;
mod frame;
mod gate;
mod server;
mod session;

use clap::Parser;
use config::{Arguments, Configuration};
use server::DreamerServer;
use std::error::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let arguments = Arguments::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Configuration::load(&arguments.config_file)
        .inspect_err(|err| error!("{}: {}", arguments.config_file, err))?;

    info!("Configuration loaded: {} section(s)", config.sections.len());

    let server = DreamerServer::bind(&config).await?;
    server.listen().await?;

    Ok(())
}
