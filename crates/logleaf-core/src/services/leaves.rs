//! Leaf use cases over a `LeafStore`.

use std::sync::Arc;

use serde::Deserialize;

use crate::db::{LeafStore, ListOptions, StoreError};
use crate::models::{Leaf, LeafId, Tag};
use crate::Result;

/// Input for a manually added leaf
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewLeaf {
    pub note: String,
    pub url: String,
    pub platform: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial edit; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LeafChanges {
    pub note: Option<String>,
    pub url: Option<String>,
    pub platform: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl LeafChanges {
    pub const fn is_empty(&self) -> bool {
        self.note.is_none() && self.url.is_none() && self.platform.is_none() && self.tags.is_none()
    }

    fn apply(self, leaf: &mut Leaf) -> Result<()> {
        if let Some(note) = self.note {
            leaf.update_note(note)?;
        }
        if let Some(url) = self.url {
            leaf.update_url(url)?;
        }
        if let Some(platform) = self.platform {
            leaf.update_platform(platform)?;
        }
        if let Some(tags) = self.tags {
            let tags = tags
                .into_iter()
                .map(Tag::new)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            leaf.update_tags(tags)?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct LeafService {
    store: Arc<dyn LeafStore>,
}

impl LeafService {
    pub fn new(store: Arc<dyn LeafStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Leaf>> {
        Ok(self.store.list(options).await?)
    }

    /// Fetch one leaf; a missing leaf is an error here, unlike the store.
    pub async fn get(&self, id: &str) -> Result<Leaf> {
        let id = LeafId::new(id)?;
        self.store
            .get(&id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()).into())
    }

    pub async fn add(&self, input: NewLeaf) -> Result<Leaf> {
        let leaf = Leaf::create(input.note, input.url, input.platform, &input.tags)?;
        let stored = self.store.put(&leaf).await?;
        tracing::info!(leaf_id = %stored.id(), "Added leaf");
        Ok(stored)
    }

    pub async fn update(&self, id: &str, changes: LeafChanges) -> Result<Leaf> {
        let mut leaf = self.get(id).await?;
        changes.apply(&mut leaf)?;
        self.store.update(&leaf).await?;
        tracing::info!(leaf_id = %leaf.id(), "Updated leaf");
        Ok(leaf)
    }

    pub async fn mark_read(&self, id: &str) -> Result<Leaf> {
        let mut leaf = self.get(id).await?;
        leaf.mark_as_read()?;
        self.store.update(&leaf).await?;
        tracing::info!(leaf_id = %leaf.id(), "Marked leaf as read");
        Ok(leaf)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = LeafId::new(id)?;
        self.store.delete(&id).await?;
        tracing::info!(leaf_id = %id, "Deleted leaf");
        Ok(())
    }
}
