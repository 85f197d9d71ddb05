//! logleaf CLI - keep a reading list of stocked articles
//!
//! Imports Qiita stocks and lets you triage them from the terminal.

mod cli;
mod commands;
mod error;
#[cfg(test)]
mod tests;

use clap::Parser;
use logleaf_core::config::LogleafConfig;
use logleaf_core::services::NewLeaf;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::delete::run_delete;
use crate::commands::list::run_list;
use crate::commands::read::run_read;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("logleaf=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = LogleafConfig::from_env()?;
    if let Some(db_path) = cli.db_path {
        config = config.with_db_path(db_path);
    }

    match cli.command {
        Commands::Sync => run_sync(&config).await?,
        Commands::List(args) => run_list(&args, &config).await?,
        Commands::Add {
            url,
            note,
            platform,
            tags,
        } => {
            run_add(
                NewLeaf {
                    note,
                    url,
                    platform,
                    tags,
                },
                &config,
            )
            .await?;
        }
        Commands::Read { id } => run_read(&id, &config).await?,
        Commands::Delete { id } => run_delete(&id, &config).await?,
    }

    Ok(())
}
