//! logleaf-core - Core library for logleaf
//!
//! This crate contains the leaf aggregate, the store abstraction with its
//! libSQL and in-memory backends, the Qiita stock source, and the sync engine
//! shared by the CLI and the API server.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod qiita;
pub mod services;
pub mod sync;
mod util;

pub use error::{Error, Result};
pub use models::{Leaf, LeafError, LeafId, LeafUrl, Tag};
