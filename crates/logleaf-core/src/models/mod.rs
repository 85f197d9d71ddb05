//! Data models for logleaf

mod leaf;
mod value;

pub use leaf::{Leaf, LeafError, MAX_TAGS_PER_LEAF};
pub use value::{LeafId, LeafUrl, Tag, MAX_URL_LEN, MIN_URL_LEN};
