use std::sync::Arc;

use chrono::{DateTime, Utc};
use logleaf_core::config::LogleafConfig;
use logleaf_core::db::LibSqlLeafStore;
use logleaf_core::services::LeafService;
use logleaf_core::Leaf;
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct LeafListItem {
    pub id: String,
    pub note: String,
    pub url: String,
    pub platform: String,
    pub tags: Vec<String>,
    pub read: bool,
    pub synced_at: DateTime<Utc>,
    pub relative_time: String,
}

/// Open the configured database and wrap it in a libSQL-backed store
pub async fn open_store(config: &LogleafConfig) -> Result<LibSqlLeafStore, CliError> {
    let db = config.open_database().await?;
    tracing::debug!(path = %config.db_path.display(), "Opened leaf database");
    Ok(LibSqlLeafStore::new(Arc::new(db)))
}

pub async fn open_service(config: &LogleafConfig) -> Result<LeafService, CliError> {
    let store = open_store(config).await?;
    Ok(LeafService::new(Arc::new(store)))
}

pub fn format_leaf_lines(leaves: &[Leaf], now: DateTime<Utc>) -> Vec<String> {
    leaves
        .iter()
        .map(|leaf| {
            let id = leaf.id().to_string();
            let short_id = id.chars().take(13).collect::<String>();
            let marker = if leaf.is_read() { " " } else { "*" };
            let preview = note_preview(leaf.note(), 40);
            let relative_time = format_relative_time(leaf.synced_at(), now);
            let tags = render_tags(leaf);

            if tags.is_empty() {
                format!(
                    "{marker} {short_id:<13}  {preview:<40}  {:<8}  {relative_time}",
                    leaf.platform()
                )
            } else {
                format!(
                    "{marker} {short_id:<13}  {preview:<40}  {:<8}  {relative_time:<10}  {tags}",
                    leaf.platform()
                )
            }
        })
        .collect()
}

pub fn leaf_to_list_item(leaf: &Leaf, now: DateTime<Utc>) -> LeafListItem {
    LeafListItem {
        id: leaf.id().to_string(),
        note: leaf.note().to_string(),
        url: leaf.url().to_string(),
        platform: leaf.platform().to_string(),
        tags: leaf.tag_names(),
        read: leaf.is_read(),
        synced_at: leaf.synced_at(),
        relative_time: format_relative_time(leaf.synced_at(), now),
    }
}

pub fn note_preview(note: &str, max_chars: usize) -> String {
    let collapsed = note.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

/// Tags in stored order
pub fn render_tags(leaf: &Leaf) -> String {
    leaf.tags()
        .iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn format_relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - at).num_seconds().max(0);
    let minute = 60;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_leaf_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyLeafId)
    } else {
        Ok(trimmed.to_string())
    }
}
