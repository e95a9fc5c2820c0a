use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod logger;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = config::Cli::parse();

    match cli.command {
        config::Commands::Start => {
            commands::run::run(commands::run::RunOptions::new(cli.global, None)).await?;
        }
        config::Commands::Spm { service } => {
            commands::run::run(commands::run::RunOptions::new(cli.global, Some(service))).await?;
        }
    }

    Ok(())
}
