use logleaf_core::config::LogleafConfig;
use logleaf_core::services::NewLeaf;

use crate::commands::common::open_service;
use crate::error::CliError;

pub async fn run_add(input: NewLeaf, config: &LogleafConfig) -> Result<(), CliError> {
    let service = open_service(config).await?;
    let leaf = service.add(input).await?;

    println!("{}", leaf.id());
    Ok(())
}
