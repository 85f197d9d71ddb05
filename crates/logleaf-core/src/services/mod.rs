//! Application services shared by the CLI and the API

mod leaves;

pub use leaves::{LeafChanges, LeafService, NewLeaf};
