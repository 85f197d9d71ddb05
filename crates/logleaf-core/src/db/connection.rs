//! Database connection management

use libsql::{Builder, Connection, Database as LibSqlDatabase};
use std::path::Path;
use std::time::Duration;

use super::{migrations, StoreError, StoreResult};

/// Remote Turso database the local file replicates
#[derive(Clone, Default)]
pub struct ReplicaConfig {
    /// Remote database URL (e.g., `libsql://your-db.turso.io`)
    pub url: String,
    /// Authentication token for remote database
    pub auth_token: String,
    /// Automatic sync interval
    pub sync_interval: Option<Duration>,
}

impl ReplicaConfig {
    pub fn new(url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: auth_token.into(),
            sync_interval: Some(Duration::from_secs(60)),
        }
    }
}

impl std::fmt::Debug for ReplicaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicaConfig")
            .field("url", &self.url)
            .field("auth_token", &"[REDACTED]")
            .field("sync_interval", &self.sync_interval)
            .finish()
    }
}

/// Database wrapper for libSQL connections
pub struct Database {
    db: LibSqlDatabase,
    conn: Connection,
    replicated: bool,
}

impl Database {
    /// Open a local-only database at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Database(format!("{}: {e}", parent.display())))?;
        }

        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        let database = Self {
            db,
            conn,
            replicated: false,
        };
        database.configure().await?;
        database.migrate().await?;
        Ok(database)
    }

    /// Open an in-memory database (useful for testing)
    pub async fn open_in_memory() -> StoreResult<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        let conn = db.connect()?;

        let database = Self {
            db,
            conn,
            replicated: false,
        };
        database.configure().await?;
        database.migrate().await?;
        Ok(database)
    }

    /// Open a local file that replicates a remote Turso database
    ///
    /// Reads are served from the local file, writes go to the remote and
    /// sync back.
    pub async fn open_with_replica(
        local_path: impl AsRef<Path>,
        replica: ReplicaConfig,
    ) -> StoreResult<Self> {
        let mut builder = Builder::new_remote_replica(
            local_path.as_ref(),
            replica.url.clone(),
            replica.auth_token.clone(),
        );
        if let Some(interval) = replica.sync_interval {
            builder = builder.sync_interval(interval);
            tracing::debug!("Automatic replica sync interval set to {:?}", interval);
        }

        let db = builder.build().await?;
        let conn = db.connect()?;

        let database = Self {
            db,
            conn,
            replicated: true,
        };

        // Pull the remote schema before migrating
        database.sync().await?;
        database.configure().await?;
        database.migrate().await?;
        Ok(database)
    }

    async fn configure(&self) -> StoreResult<()> {
        // Some pragmas are rejected by remote replicas
        self.conn
            .execute("PRAGMA journal_mode = WAL;", ())
            .await
            .ok();
        self.conn
            .execute("PRAGMA synchronous = NORMAL;", ())
            .await
            .ok();
        Ok(())
    }

    async fn migrate(&self) -> StoreResult<()> {
        migrations::run(&self.conn).await
    }

    /// Pull changes from the remote database when replicating
    pub async fn sync(&self) -> StoreResult<()> {
        if self.replicated {
            self.db.sync().await?;
            tracing::debug!("Database synced with remote");
        }
        Ok(())
    }

    pub const fn is_replicated(&self) -> bool {
        self.replicated
    }

    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
