use logleaf_core::config::LogleafConfig;

use crate::commands::common::{normalize_leaf_identifier, open_service};
use crate::error::CliError;

pub async fn run_delete(id: &str, config: &LogleafConfig) -> Result<(), CliError> {
    let id = normalize_leaf_identifier(id)?;
    let service = open_service(config).await?;
    service.delete(&id).await?;

    println!("{id}");
    Ok(())
}
