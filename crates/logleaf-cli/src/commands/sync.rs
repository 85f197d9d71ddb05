use std::sync::Arc;

use logleaf_core::config::{ConfigError, LogleafConfig};
use logleaf_core::sync::{SyncEngine, SyncReport};
use tokio::time::Instant;

use crate::commands::common::open_store;
use crate::error::CliError;

pub async fn run_sync(config: &LogleafConfig) -> Result<(), CliError> {
    let client = match config.qiita_client() {
        Ok(client) => client,
        Err(logleaf_core::Error::Config(ConfigError::MissingVar(_))) => {
            return Err(CliError::SyncNotConfigured)
        }
        Err(error) => return Err(error.into()),
    };
    let store = Arc::new(open_store(config).await?);

    let engine = SyncEngine::new(Arc::new(client), store.clone(), config.sync_settings());
    let report = engine
        .run_until(Instant::now() + config.sync_timeout)
        .await?;

    if store.database().is_replicated() {
        store.database().sync().await?;
    }

    for line in format_sync_report(&report) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_sync_report(report: &SyncReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Synced {} new leaves ({} fetched, {} already stored, {} failed)",
        report.created,
        report.fetched,
        report.existing,
        report.failures.len()
    )];
    lines.extend(report.failures.iter().map(|failure| {
        format!(
            "  skipped {} ({}): {}",
            failure.item_id, failure.url, failure.error
        )
    }));
    lines
}
