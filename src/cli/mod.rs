// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Fact-check search CLI
#[derive(Parser, Debug)]
#[command(name = "factcheck-search")]
#[command(version = "1.0.0")]
#[command(about = "Resilient web search and page extraction", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the web with provider failover
    Search(commands::SearchArgs),

    /// Extract the main text of one or more pages
    Extract(commands::ExtractArgs),

    /// Show configured providers and their health
    Providers(commands::ProvidersArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    match cli.command {
        Commands::Search(args) => commands::search(args).await,
        Commands::Extract(args) => commands::extract(args).await,
        Commands::Providers(args) => commands::providers(args),
    }
}
