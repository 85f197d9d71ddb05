//! Leaf persistence
//!
//! [`LeafStore`] is the seam the sync engine and the use-case service talk
//! to. Two backends implement it: [`LibSqlLeafStore`] (local file, optionally
//! an embedded Turso replica) and [`InMemoryLeafStore`].

mod connection;
mod memory;
mod migrations;
mod repository;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Leaf, LeafError, LeafId};

pub use connection::{Database, ReplicaConfig};
pub use memory::InMemoryLeafStore;
pub use repository::LibSqlLeafStore;

/// Default page size for listing when the caller does not pass a limit
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Errors raised by a leaf store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Leaf not found: {0}")]
    NotFound(String),

    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A persisted row no longer satisfies the leaf invariants
    #[error("Invalid leaf record {id}: {source}")]
    InvalidRecord {
        id: String,
        #[source]
        source: LeafError,
    },

    #[error("Database error: {0}")]
    Database(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Sort key for [`ListOptions`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    SyncedAt,
    Note,
    Platform,
}

impl SortKey {
    pub const fn column(self) -> &'static str {
        match self {
            Self::SyncedAt => "synced_at",
            Self::Note => "note",
            Self::Platform => "platform",
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "synced_at" | "syncedAt" => Ok(Self::SyncedAt),
            "note" => Ok(Self::Note),
            "platform" => Ok(Self::Platform),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Filtering, paging and ordering for [`LeafStore::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: usize,
    pub offset: usize,
    /// Only leaves from this platform
    pub platform: Option<String>,
    /// Only leaves carrying this tag
    pub tag: Option<String>,
    /// Only leaves in this read state
    pub read: Option<bool>,
    pub sort_by: SortKey,
    pub sort_desc: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
            platform: None,
            tag: None,
            read: None,
            sort_by: SortKey::SyncedAt,
            sort_desc: true,
        }
    }
}

impl ListOptions {
    /// Unfiltered listing capped at `limit`
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Whether `leaf` passes the platform/tag/read filters
    pub fn matches(&self, leaf: &Leaf) -> bool {
        if let Some(platform) = &self.platform {
            if leaf.platform() != platform {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !leaf.tags().iter().any(|t| t.as_str() == tag) {
                return false;
            }
        }
        if let Some(read) = self.read {
            if leaf.is_read() != read {
                return false;
            }
        }
        true
    }
}

/// Trait for leaf storage operations
#[async_trait]
pub trait LeafStore: Send + Sync {
    /// Get a leaf by ID
    async fn get(&self, id: &LeafId) -> StoreResult<Option<Leaf>>;

    /// List leaves matching `options`
    async fn list(&self, options: &ListOptions) -> StoreResult<Vec<Leaf>>;

    /// Insert or overwrite a leaf by ID
    async fn put(&self, leaf: &Leaf) -> StoreResult<Leaf>;

    /// Overwrite an existing leaf; `NotFound` when no record has its ID
    async fn update(&self, leaf: &Leaf) -> StoreResult<()>;

    /// Remove a leaf; `NotFound` when no record existed
    async fn delete(&self, id: &LeafId) -> StoreResult<()>;
}
