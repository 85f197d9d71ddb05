//! In-memory `LeafStore`

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{LeafStore, ListOptions, SortKey, StoreError, StoreResult};
use crate::models::{Leaf, LeafId};

/// Process-local store keyed by leaf ID. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryLeafStore {
    leaves: Mutex<HashMap<LeafId, Leaf>>,
}

impl InMemoryLeafStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `leaves`
    pub fn with_leaves(leaves: impl IntoIterator<Item = Leaf>) -> Self {
        let map = leaves
            .into_iter()
            .map(|leaf| (leaf.id().clone(), leaf))
            .collect();
        Self {
            leaves: Mutex::new(map),
        }
    }

    pub async fn len(&self) -> usize {
        self.leaves.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.leaves.lock().await.is_empty()
    }
}

fn compare(a: &Leaf, b: &Leaf, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::SyncedAt => a.synced_at().cmp(&b.synced_at()),
        SortKey::Note => a.note().cmp(b.note()),
        SortKey::Platform => a.platform().cmp(b.platform()),
    };
    primary.then_with(|| a.id().as_str().cmp(b.id().as_str()))
}

#[async_trait]
impl LeafStore for InMemoryLeafStore {
    async fn get(&self, id: &LeafId) -> StoreResult<Option<Leaf>> {
        Ok(self.leaves.lock().await.get(id).cloned())
    }

    async fn list(&self, options: &ListOptions) -> StoreResult<Vec<Leaf>> {
        let mut matched: Vec<Leaf> = self
            .leaves
            .lock()
            .await
            .values()
            .filter(|leaf| options.matches(leaf))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ordering = compare(a, b, options.sort_by);
            if options.sort_desc {
                ordering.reverse()
            } else {
                ordering
            }
        });

        Ok(matched
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .collect())
    }

    async fn put(&self, leaf: &Leaf) -> StoreResult<Leaf> {
        self.leaves
            .lock()
            .await
            .insert(leaf.id().clone(), leaf.clone());
        Ok(leaf.clone())
    }

    async fn update(&self, leaf: &Leaf) -> StoreResult<()> {
        let mut leaves = self.leaves.lock().await;
        match leaves.get_mut(leaf.id()) {
            Some(existing) => {
                *existing = leaf.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(leaf.id().to_string())),
        }
    }

    async fn delete(&self, id: &LeafId) -> StoreResult<()> {
        self.leaves
            .lock()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
