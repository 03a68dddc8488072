use chrono::Local;
use clap::Parser;
use squad_scrape::{cli::Cli, info_time, Result};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let start_time = Local::now();
    squad_scrape::cli::run(Cli::parse()).await?;
    info_time!(start_time, "Full program time:");

    Ok(())
}
