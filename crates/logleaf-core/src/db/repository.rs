//! libSQL implementation of `LeafStore`

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{params, Value};
use std::sync::Arc;

use super::{Database, LeafStore, ListOptions, StoreError, StoreResult};
use crate::models::{Leaf, LeafId};

const SELECT_COLUMNS: &str = "SELECT id, note, url, platform, tags, read, synced_at FROM leaves";

/// `LeafStore` backed by a libSQL database
#[derive(Clone)]
pub struct LibSqlLeafStore {
    db: Arc<Database>,
}

impl LibSqlLeafStore {
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn parse_leaf(row: &libsql::Row) -> StoreResult<Leaf> {
        let id: String = row.get(0)?;
        let tags_json: String = row.get(4)?;
        let tags: Vec<String> = serde_json::from_str(&tags_json)?;
        let synced_at_raw: String = row.get(6)?;
        let synced_at = DateTime::parse_from_rfc3339(&synced_at_raw)
            .map_err(|e| {
                StoreError::Database(format!("leaf {id}: invalid synced_at {synced_at_raw:?}: {e}"))
            })?
            .with_timezone(&Utc);

        Leaf::reconstruct(
            id.clone(),
            row.get::<String>(1)?,
            row.get::<String>(2)?,
            row.get::<String>(3)?,
            &tags,
            row.get::<i64>(5)? != 0,
            synced_at,
        )
        .map_err(|source| StoreError::InvalidRecord { id, source })
    }

    fn tags_json(leaf: &Leaf) -> StoreResult<String> {
        Ok(serde_json::to_string(&leaf.tag_names())?)
    }
}

/// Timestamps are stored with a fixed nine-digit fraction so text order
/// matches time order.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[async_trait]
impl LeafStore for LibSqlLeafStore {
    async fn get(&self, id: &LeafId) -> StoreResult<Option<Leaf>> {
        let mut rows = self
            .db
            .connection()
            .query(
                &format!("{SELECT_COLUMNS} WHERE id = ?"),
                params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_leaf(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, options: &ListOptions) -> StoreResult<Vec<Leaf>> {
        let mut clauses = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(platform) = &options.platform {
            clauses.push("platform = ?");
            values.push(Value::Text(platform.clone()));
        }
        if let Some(tag) = &options.tag {
            clauses.push("EXISTS (SELECT 1 FROM json_each(leaves.tags) WHERE json_each.value = ?)");
            values.push(Value::Text(tag.clone()));
        }
        if let Some(read) = options.read {
            clauses.push("read = ?");
            values.push(Value::Integer(i64::from(read)));
        }

        let mut sql = SELECT_COLUMNS.to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        let direction = if options.sort_desc { "DESC" } else { "ASC" };
        sql.push_str(&format!(
            " ORDER BY {} {direction}, id {direction} LIMIT ? OFFSET ?",
            options.sort_by.column()
        ));
        values.push(Value::Integer(options.limit as i64));
        values.push(Value::Integer(options.offset as i64));

        let mut rows = self
            .db
            .connection()
            .query(&sql, libsql::params_from_iter(values))
            .await?;

        let mut leaves = Vec::new();
        while let Some(row) = rows.next().await? {
            leaves.push(Self::parse_leaf(&row)?);
        }
        Ok(leaves)
    }

    async fn put(&self, leaf: &Leaf) -> StoreResult<Leaf> {
        self.db
            .connection()
            .execute(
                "INSERT OR REPLACE INTO leaves (id, note, url, platform, tags, read, synced_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    leaf.id().as_str(),
                    leaf.note(),
                    leaf.url().as_str(),
                    leaf.platform(),
                    Self::tags_json(leaf)?,
                    i64::from(leaf.is_read()),
                    format_timestamp(leaf.synced_at())
                ],
            )
            .await?;

        Ok(leaf.clone())
    }

    async fn update(&self, leaf: &Leaf) -> StoreResult<()> {
        let rows = self
            .db
            .connection()
            .execute(
                "UPDATE leaves SET note = ?, url = ?, platform = ?, tags = ?, read = ? WHERE id = ?",
                params![
                    leaf.note(),
                    leaf.url().as_str(),
                    leaf.platform(),
                    Self::tags_json(leaf)?,
                    i64::from(leaf.is_read()),
                    leaf.id().as_str()
                ],
            )
            .await?;

        if rows == 0 {
            return Err(StoreError::NotFound(leaf.id().to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &LeafId) -> StoreResult<()> {
        let rows = self
            .db
            .connection()
            .execute("DELETE FROM leaves WHERE id = ?", params![id.as_str()])
            .await?;

        if rows == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SortKey;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    async fn setup() -> LibSqlLeafStore {
        LibSqlLeafStore::new(Arc::new(Database::open_in_memory().await.unwrap()))
    }

    fn leaf(note: &str, url: &str, platform: &str, tags: &[&str]) -> Leaf {
        Leaf::create(note, url, platform, tags).unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_put_and_get() {
        let store = setup().await;
        let original = leaf("Hello", "https://qiita.com/a", "qiita", &["rust", "db"]);

        store.put(&original).await.unwrap();
        let fetched = store.get(original.id()).await.unwrap().unwrap();

        assert_eq!(fetched, original);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_missing_returns_none() {
        let store = setup().await;
        let id = LeafId::new("missing").unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_put_overwrites_by_id() {
        let store = setup().await;
        let mut original = leaf("Hello", "https://qiita.com/a", "qiita", &[]);
        store.put(&original).await.unwrap();

        original.update_note("Changed").unwrap();
        store.put(&original).await.unwrap();

        let all = store.list(&ListOptions::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].note(), "Changed");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_requires_existing_record() {
        let store = setup().await;
        let mut original = leaf("Hello", "https://qiita.com/a", "qiita", &[]);

        let err = store.update(&original).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        store.put(&original).await.unwrap();
        original.mark_as_read().unwrap();
        store.update(&original).await.unwrap();

        let fetched = store.get(original.id()).await.unwrap().unwrap();
        assert!(fetched.is_read());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete() {
        let store = setup().await;
        let original = leaf("Bye", "https://qiita.com/a", "qiita", &[]);
        store.put(&original).await.unwrap();

        store.delete(original.id()).await.unwrap();
        assert!(store.get(original.id()).await.unwrap().is_none());

        let err = store.delete(original.id()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_filters_and_sorts() {
        let store = setup().await;
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rows = [
            ("1", "Alpha", "qiita", vec!["rust"], false, 1),
            ("2", "Beta", "zenn", vec!["rust", "aws"], true, 2),
            ("3", "Gamma", "qiita", vec!["go"], false, 3),
        ];
        for (id, note, platform, tags, read, day) in rows {
            let leaf = Leaf::reconstruct(
                id,
                note,
                format!("https://example.com/{id}"),
                platform,
                &tags,
                read,
                base + chrono::Duration::days(day),
            )
            .unwrap();
            store.put(&leaf).await.unwrap();
        }

        let newest_first = store.list(&ListOptions::default()).await.unwrap();
        let ids: Vec<_> = newest_first.iter().map(|l| l.id().to_string()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);

        let qiita = store
            .list(&ListOptions {
                platform: Some("qiita".to_string()),
                sort_by: SortKey::Note,
                sort_desc: false,
                ..ListOptions::default()
            })
            .await
            .unwrap();
        let notes: Vec<_> = qiita.iter().map(|l| l.note().to_string()).collect();
        assert_eq!(notes, vec!["Alpha", "Gamma"]);

        let rust = store
            .list(&ListOptions {
                tag: Some("rust".to_string()),
                read: Some(false),
                ..ListOptions::default()
            })
            .await
            .unwrap();
        assert_eq!(rust.len(), 1);
        assert_eq!(rust[0].id().as_str(), "1");

        let paged = store
            .list(&ListOptions {
                limit: 1,
                offset: 1,
                ..ListOptions::default()
            })
            .await
            .unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].id().as_str(), "2");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_row_is_reported() {
        let store = setup().await;
        store
            .database()
            .connection()
            .execute(
                "INSERT INTO leaves (id, note, url, platform, tags, read, synced_at)
                 VALUES ('bad', 'note', 'ab', 'qiita', '[]', 0, '2024-01-01T00:00:00Z')",
                (),
            )
            .await
            .unwrap();

        let err = store
            .get(&LeafId::new("bad").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord { .. }));
    }
}
