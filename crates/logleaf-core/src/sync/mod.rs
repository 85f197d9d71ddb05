//! Incremental sync of Qiita stocks into the leaf store.
//!
//! A run fetches every stock page, lists the persisted leaves, and writes a
//! new leaf for each stock whose URL is not stored yet. Membership is by URL,
//! so re-running against the same feed writes nothing. Fetch and list
//! failures abort the run; construction and write failures are recorded per
//! item and the run moves on.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::db::{LeafStore, ListOptions, StoreError};
use crate::models::{Leaf, LeafError};
use crate::qiita::{FetchError, StockItem, StockSource, QIITA_PLATFORM};

pub const DEFAULT_LIST_LIMIT: usize = 1000;
pub const DEFAULT_PACE: Duration = Duration::from_secs(1);

/// Tuning for a sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Upper bound on persisted leaves read for the membership set
    pub list_limit: usize,
    /// Pause after each successful write
    pub pace: Duration,
    /// Platform label written on new leaves
    pub platform: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            list_limit: DEFAULT_LIST_LIMIT,
            pace: DEFAULT_PACE,
            platform: QIITA_PLATFORM.to_string(),
        }
    }
}

/// Failures that end a run
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to fetch stocks page {page}: {source}")]
    Fetch {
        page: u32,
        #[source]
        source: FetchError,
    },
    #[error("Failed to list stored leaves: {0}")]
    ListLeaves(#[source] StoreError),
    #[error("Sync deadline exceeded")]
    DeadlineExceeded,
}

/// Why a single stock item was not written
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("invalid item: {0}")]
    Invalid(#[from] LeafError),
    #[error("write failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug)]
pub struct SyncFailure {
    pub item_id: String,
    pub url: String,
    pub error: ItemError,
}

/// Outcome of a completed run
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Page requests issued
    pub pages: u32,
    /// Stock items fetched across all pages
    pub fetched: usize,
    /// Items skipped because their URL is already stored
    pub existing: usize,
    /// Leaves written
    pub created: usize,
    pub failures: Vec<SyncFailure>,
}

/// Fetched feed, in source order
#[derive(Debug, Default)]
pub struct FetchedStocks {
    pub items: Vec<StockItem>,
    pub pages: u32,
}

pub struct SyncEngine {
    source: Arc<dyn StockSource>,
    store: Arc<dyn LeafStore>,
    settings: SyncSettings,
}

impl SyncEngine {
    pub fn new(
        source: Arc<dyn StockSource>,
        store: Arc<dyn LeafStore>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            source,
            store,
            settings,
        }
    }

    /// Request pages 1, 2, ... until a short page. Any page failure discards
    /// what was fetched so far.
    pub async fn fetch_all(&self) -> Result<FetchedStocks, SyncError> {
        let mut fetched = FetchedStocks::default();
        let mut page = 1;
        loop {
            let result = self
                .source
                .list_stocks_page(page)
                .await
                .map_err(|source| SyncError::Fetch { page, source })?;
            fetched.pages = page;
            fetched.items.extend(result.items);
            if !result.has_more {
                break;
            }
            page += 1;
        }
        Ok(fetched)
    }

    /// URLs of the stored leaves, as rendered strings
    pub async fn existing_urls(&self) -> Result<HashSet<String>, SyncError> {
        let leaves = self
            .store
            .list(&ListOptions::with_limit(self.settings.list_limit))
            .await
            .map_err(SyncError::ListLeaves)?;
        Ok(leaves
            .iter()
            .map(|leaf| leaf.url().to_string())
            .collect())
    }

    /// Run one sync pass to completion.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        tracing::info!(platform = %self.settings.platform, "Starting stock sync");

        let fetched = self.fetch_all().await?;
        let mut known = self.existing_urls().await?;

        let mut report = SyncReport {
            pages: fetched.pages,
            fetched: fetched.items.len(),
            ..SyncReport::default()
        };
        tracing::info!(
            fetched = report.fetched,
            pages = report.pages,
            stored = known.len(),
            "Fetched stocks"
        );

        let total = fetched.items.len();
        for (index, item) in fetched.items.into_iter().enumerate() {
            if known.contains(&item.url) {
                report.existing += 1;
                continue;
            }

            match self.persist(&item).await {
                Ok(leaf) => {
                    tracing::debug!(item_id = %item.id, leaf_id = %leaf.id(), "Created leaf");
                    report.created += 1;
                    known.insert(item.url);
                    if index + 1 < total && !self.settings.pace.is_zero() {
                        tokio::time::sleep(self.settings.pace).await;
                    }
                }
                Err(error) => {
                    tracing::warn!(item_id = %item.id, url = %item.url, %error, "Skipping stock item");
                    report.failures.push(SyncFailure {
                        item_id: item.id,
                        url: item.url,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            created = report.created,
            existing = report.existing,
            failed = report.failures.len(),
            "Stock sync finished"
        );
        Ok(report)
    }

    /// Run one pass, giving up at `deadline`. Writes committed before the
    /// deadline stay committed.
    pub async fn run_until(&self, deadline: Instant) -> Result<SyncReport, SyncError> {
        tokio::time::timeout_at(deadline, self.run())
            .await
            .map_err(|_| SyncError::DeadlineExceeded)?
    }

    async fn persist(&self, item: &StockItem) -> Result<Leaf, ItemError> {
        let leaf = Leaf::create(
            item.title.as_str(),
            item.url.as_str(),
            self.settings.platform.as_str(),
            &item.tag_names(),
        )?;
        Ok(self.store.put(&leaf).await?)
    }
}
