use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use swirl::cli::{commands, Cli};
use swirl::Resolver;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting swirl v{}", swirl::VERSION);

    let options = commands::load_options(&cli).context("Failed to load configuration")?;

    let command = match cli.command {
        Some(command) => command,
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            process::exit(1);
        }
    };

    let resolver = Resolver::new(&options).context("Failed to create resolver")?;
    commands::handle_command(&resolver, command).await?;

    Ok(())
}
