//! Leaf value objects
//!
//! Each constructor validates its input; an instance that exists is valid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

use super::LeafError;

/// Shortest accepted URL, in bytes
pub const MIN_URL_LEN: usize = 3;
/// Longest accepted URL, in bytes
pub const MAX_URL_LEN: usize = 2048;

/// Opaque identifier of a leaf
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LeafId(String);

impl LeafId {
    /// Wrap an existing identifier
    pub fn new(value: impl Into<String>) -> Result<Self, LeafError> {
        let value = value.into();
        if value.is_empty() {
            return Err(LeafError::EmptyId);
        }
        Ok(Self(value))
    }

    /// Generate a fresh identifier (UUID v7, time-sortable)
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LeafId {
    type Err = LeafError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LeafId {
    type Error = LeafError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LeafId> for String {
    fn from(value: LeafId) -> Self {
        value.0
    }
}

/// Validated URL of a leaf
///
/// Accepts absolute URIs (`https://qiita.com/...`) and absolute-path
/// references (`/items/1`). Equality is by the original string, no
/// normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LeafUrl(String);

impl LeafUrl {
    pub fn new(value: impl Into<String>) -> Result<Self, LeafError> {
        let value = value.into();
        if value.is_empty() {
            return Err(LeafError::EmptyUrl);
        }
        if !(MIN_URL_LEN..=MAX_URL_LEN).contains(&value.len()) {
            return Err(LeafError::InvalidLength(value.len()));
        }
        parse_uri_reference(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn parse_uri_reference(value: &str) -> Result<(), LeafError> {
    if let Some(c) = value
        .chars()
        .find(|c| c.is_whitespace() || c.is_control())
    {
        return Err(LeafError::MalformedUrl(format!(
            "unexpected character {c:?}"
        )));
    }

    match Url::parse(value) {
        Ok(_) => Ok(()),
        Err(url::ParseError::RelativeUrlWithoutBase) if value.starts_with('/') => {
            let base = Url::parse("http://localhost/").map_err(|e| {
                LeafError::MalformedUrl(e.to_string())
            })?;
            base.join(value)
                .map(|_| ())
                .map_err(|e| LeafError::MalformedUrl(e.to_string()))
        }
        Err(e) => Err(LeafError::MalformedUrl(e.to_string())),
    }
}

impl fmt::Display for LeafUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LeafUrl {
    type Err = LeafError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LeafUrl {
    type Error = LeafError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LeafUrl> for String {
    fn from(value: LeafUrl) -> Self {
        value.0
    }
}

/// A tag label attached to a leaf
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    pub fn new(value: impl Into<String>) -> Result<Self, LeafError> {
        let value = value.into();
        if value.is_empty() {
            return Err(LeafError::EmptyTag);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Tag {
    type Err = LeafError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Tag {
    type Error = LeafError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Tag> for String {
    fn from(value: Tag) -> Self {
        value.0
    }
}
