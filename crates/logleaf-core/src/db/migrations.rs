//! Database migrations

use libsql::Connection;

use super::StoreResult;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> StoreResult<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }

    tracing::debug!("Database schema at version {}", CURRENT_VERSION);
    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> StoreResult<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists = match rows.next().await? {
        Some(row) => row.get::<i32>(0)? != 0,
        None => false,
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version = match rows.next().await? {
        Some(row) => row.get::<i32>(0)?,
        None => 0,
    };

    Ok(version)
}

/// Migration to version 1: leaves table
///
/// Rows are keyed by leaf ID only; `tags` holds a JSON array of strings in
/// display order and `synced_at` an RFC 3339 UTC timestamp.
async fn migrate_v1(conn: &Connection) -> StoreResult<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    let statements = [
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        "CREATE TABLE IF NOT EXISTS leaves (
            id TEXT PRIMARY KEY,
            note TEXT NOT NULL,
            url TEXT NOT NULL,
            platform TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            read INTEGER NOT NULL DEFAULT 0,
            synced_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_leaves_url ON leaves(url)",
        "CREATE INDEX IF NOT EXISTS idx_leaves_synced ON leaves(synced_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_leaves_platform ON leaves(platform)",
        "INSERT INTO schema_version (version) VALUES (1)",
    ];

    for statement in statements {
        if let Err(e) = conn.execute(statement, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    conn.execute("COMMIT", ()).await?;
    Ok(())
}
