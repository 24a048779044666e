mod cli;
mod collector;
mod config;
mod dispatch;
mod error;
mod executor;
mod file_server;
mod plan;
mod probe;
mod report;
mod runner;
mod service;

pub mod prelude {
    pub use crate::error::*;
    pub use tracing::{debug, error, info, span, trace, warn};
}

use clap::Parser;
use dotenvy::dotenv;
use prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();
    info!(
        "{} v{}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION")
    );

    let cli = cli::Cli::parse();
    let config = config::BenchConfig::from_cli(cli)?;

    let report = runner::run(config).await?;
    report.emit();
    Ok(())
}
