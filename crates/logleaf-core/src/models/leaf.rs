//! Leaf aggregate

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

use super::{LeafId, LeafUrl, Tag, MAX_URL_LEN, MIN_URL_LEN};

/// Maximum number of tags a leaf may carry
pub const MAX_TAGS_PER_LEAF: usize = 10;

/// Domain invariant violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeafError {
    #[error("Leaf ID cannot be empty")]
    EmptyId,
    #[error("URL cannot be empty")]
    EmptyUrl,
    #[error("URL must be between {min} and {max} characters (got {0})", min = MIN_URL_LEN, max = MAX_URL_LEN)]
    InvalidLength(usize),
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),
    #[error("Tag cannot be empty")]
    EmptyTag,
    #[error("Note cannot be empty")]
    EmptyNote,
    #[error("Platform cannot be empty")]
    EmptyPlatform,
    #[error("Duplicate tag: {0}")]
    DuplicateTag(String),
    #[error("A leaf can have at most {max} tags (got {0})", max = MAX_TAGS_PER_LEAF)]
    TagLimitExceeded(usize),
    #[error("Leaf is already marked as read")]
    AlreadyRead,
}

/// A tracked article or bookmark.
///
/// Fields are private; every mutation goes through a method that validates
/// before committing, so a `Leaf` always satisfies:
///
/// * `note` and `platform` are non-empty
/// * `tags` are unique and at most [`MAX_TAGS_PER_LEAF`]
/// * `read` only moves from `false` to `true`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    id: LeafId,
    note: String,
    url: LeafUrl,
    platform: String,
    tags: Vec<Tag>,
    read: bool,
    synced_at: DateTime<Utc>,
}

impl Leaf {
    /// Create a new unread leaf with a fresh ID, synced now.
    pub fn create<S: AsRef<str>>(
        note: impl Into<String>,
        url: impl Into<String>,
        platform: impl Into<String>,
        tags: &[S],
    ) -> Result<Self, LeafError> {
        let note = non_empty(note.into(), LeafError::EmptyNote)?;
        let platform = non_empty(platform.into(), LeafError::EmptyPlatform)?;
        let url = LeafUrl::new(url)?;
        let tags = build_tags(tags)?;

        Ok(Self {
            id: LeafId::generate(),
            note,
            url,
            platform,
            tags,
            read: false,
            synced_at: Utc::now(),
        })
    }

    /// Rebuild a leaf from persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct<S: AsRef<str>>(
        id: impl Into<String>,
        note: impl Into<String>,
        url: impl Into<String>,
        platform: impl Into<String>,
        tags: &[S],
        read: bool,
        synced_at: DateTime<Utc>,
    ) -> Result<Self, LeafError> {
        let id = LeafId::new(id)?;
        let note = non_empty(note.into(), LeafError::EmptyNote)?;
        let platform = non_empty(platform.into(), LeafError::EmptyPlatform)?;
        let url = LeafUrl::new(url)?;
        let tags = build_tags(tags)?;

        Ok(Self {
            id,
            note,
            url,
            platform,
            tags,
            read,
            synced_at,
        })
    }

    pub const fn id(&self) -> &LeafId {
        &self.id
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub const fn url(&self) -> &LeafUrl {
        &self.url
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub const fn is_read(&self) -> bool {
        self.read
    }

    pub const fn synced_at(&self) -> DateTime<Utc> {
        self.synced_at
    }

    /// Tag labels in display order
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(ToString::to_string).collect()
    }

    pub fn update_note(&mut self, note: impl Into<String>) -> Result<(), LeafError> {
        self.note = non_empty(note.into(), LeafError::EmptyNote)?;
        Ok(())
    }

    pub fn update_platform(&mut self, platform: impl Into<String>) -> Result<(), LeafError> {
        self.platform = non_empty(platform.into(), LeafError::EmptyPlatform)?;
        Ok(())
    }

    pub fn update_url(&mut self, url: impl Into<String>) -> Result<(), LeafError> {
        self.url = LeafUrl::new(url)?;
        Ok(())
    }

    /// Replace the whole tag sequence.
    pub fn update_tags(&mut self, tags: Vec<Tag>) -> Result<(), LeafError> {
        if tags.len() > MAX_TAGS_PER_LEAF {
            return Err(LeafError::TagLimitExceeded(tags.len()));
        }
        ensure_unique(&tags)?;
        self.tags = tags;
        Ok(())
    }

    pub fn mark_as_read(&mut self) -> Result<(), LeafError> {
        if self.read {
            return Err(LeafError::AlreadyRead);
        }
        self.read = true;
        Ok(())
    }
}

fn non_empty(value: String, error: LeafError) -> Result<String, LeafError> {
    if value.is_empty() {
        Err(error)
    } else {
        Ok(value)
    }
}

fn build_tags<S: AsRef<str>>(values: &[S]) -> Result<Vec<Tag>, LeafError> {
    let tags = values
        .iter()
        .map(|value| Tag::new(value.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique(&tags)?;
    if tags.len() > MAX_TAGS_PER_LEAF {
        return Err(LeafError::TagLimitExceeded(tags.len()));
    }
    Ok(tags)
}

fn ensure_unique(tags: &[Tag]) -> Result<(), LeafError> {
    let mut seen = HashSet::with_capacity(tags.len());
    for tag in tags {
        if !seen.insert(tag.as_str()) {
            return Err(LeafError::DuplicateTag(tag.to_string()));
        }
    }
    Ok(())
}
