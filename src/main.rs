use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{Args, Config};

mod api;
mod config;
mod download;
mod error;
mod logging;
mod pipeline;
mod recording;
mod timeframe;

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional; real environment variables take precedence
    let dotenv = dotenvy::dotenv();
    logging::init_logging();
    match dotenv {
        Err(err) if !err.not_found() => tracing::warn!("Ignoring .env file: {err}"),
        _ => {}
    }

    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = Config::from_args(args).context("Invalid configuration")?;
    tracing::info!("Downloading {} recordings from {}", config.channel_type, config.range);

    let report = pipeline::run(&config).await?;
    report.log_summary();

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
