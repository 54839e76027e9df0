//! sitecache - offline cache manager CLI
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use sitecache::cli::{Cli, Commands};
use sitecache::config::ConfigManager;
use sitecache::error::SiteCacheResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SiteCacheResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("sitecache=warn"),
        1 => EnvFilter::new("sitecache=info"),
        _ => EnvFilter::new("sitecache=debug"),
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .init();
    }

    debug!("Using config {}", config_manager.path().display());

    // Dispatch to command
    match cli.command {
        Commands::Install => sitecache::cli::commands::install(&config).await,
        Commands::Activate => sitecache::cli::commands::activate(&config).await,
        Commands::Update => sitecache::cli::commands::update(&config).await,
        Commands::Fetch(args) => sitecache::cli::commands::fetch(args, &config).await,
        Commands::Status => sitecache::cli::commands::status(&config).await,
        Commands::Buckets(args) => sitecache::cli::commands::buckets(args, &config).await,
        Commands::Verify(args) => sitecache::cli::commands::verify(args, &config).await,
        Commands::Config(args) => {
            sitecache::cli::commands::config(args, &config_manager, &config).await
        }
    }
}
