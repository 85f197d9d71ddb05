use chrono::Utc;
use logleaf_core::config::LogleafConfig;
use logleaf_core::db::ListOptions;

use crate::cli::ListArgs;
use crate::commands::common::{format_leaf_lines, leaf_to_list_item, open_service, LeafListItem};
use crate::error::CliError;

pub fn list_options(args: &ListArgs) -> ListOptions {
    ListOptions {
        limit: args.limit,
        offset: args.offset,
        platform: args.platform.clone(),
        tag: args.tag.clone(),
        read: args.unread.then_some(false),
        sort_by: args.sort.into(),
        sort_desc: !args.asc,
    }
}

pub async fn run_list(args: &ListArgs, config: &LogleafConfig) -> Result<(), CliError> {
    let service = open_service(config).await?;
    let leaves = service.list(&list_options(args)).await?;
    let now = Utc::now();

    if args.json {
        let json_items = leaves
            .iter()
            .map(|leaf| leaf_to_list_item(leaf, now))
            .collect::<Vec<LeafListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if leaves.is_empty() {
        println!("No leaves found.");
    } else {
        for line in format_leaf_lines(&leaves, now) {
            println!("{line}");
        }
    }

    Ok(())
}
