use logleaf_core::config::LogleafConfig;

use crate::commands::common::{normalize_leaf_identifier, open_service};
use crate::error::CliError;

pub async fn run_read(id: &str, config: &LogleafConfig) -> Result<(), CliError> {
    let id = normalize_leaf_identifier(id)?;
    let service = open_service(config).await?;
    let leaf = service.mark_read(&id).await?;

    println!("{}", leaf.id());
    Ok(())
}
