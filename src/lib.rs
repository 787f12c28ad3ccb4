//! Catalog Scraper - paginated product-listing crawler
//!
//! Crawls a catalog page by page, extracts product records, merges them into
//! a persisted snapshot with change detection, and reports the number of new
//! or re-priced products. Runs once from the CLI or behind an HTTP trigger.

// Module declarations
pub mod application;
pub mod commands;
pub mod domain;
pub mod infrastructure;
pub mod server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::application::scrape_run::ScrapeRunUseCase;
use crate::domain::settings::ScrapeRequest;
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::{init_logging_with_config, log_system_info};

#[derive(Parser, Debug)]
#[command(name = "catalog-scraper", version, about = "Catalog product scraper")]
pub struct Cli {
    /// Config file path (extension optional)
    #[arg(long, global = true, env = "SCRAPER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one scrape locally and exit
    Scrape {
        /// Stop after this many pages
        #[arg(long)]
        limit: Option<i64>,

        /// Proxy URL forwarded to every request
        #[arg(long)]
        proxy: Option<String>,
    },
    /// Serve the HTTP trigger
    Serve,
}

/// Parse CLI arguments and dispatch
pub async fn run() -> Result<()> {
    run_with(Cli::parse()).await
}

pub async fn run_with(cli: Cli) -> Result<()> {
    let manager = cli.config.map_or_else(ConfigManager::default, ConfigManager::new);
    let config = manager.load_config().context("Failed to load configuration")?;

    init_logging_with_config(&config.logging)?;
    log_system_info();

    let use_case = Arc::new(ScrapeRunUseCase::from_config(Arc::new(config))?);

    match cli.command {
        Command::Scrape { limit, proxy } => {
            let response = commands::run_validated(&use_case, ScrapeRequest { limit, proxy }).await?;
            info!("{}", response.message);
            println!("{}", response.message);
            Ok(())
        }
        Command::Serve => server::serve(use_case).await,
    }
}
