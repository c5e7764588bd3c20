//! Infrastructure layer - Index adapters
//!
//! - `memory`: fixture collections held in memory
//! - `json`: query-index JSON documents on disk (feature `fs`)

pub mod memory;

#[cfg(feature = "fs")]
pub mod json;

#[cfg(feature = "fs")]
pub use json::JsonFileIndex;
pub use memory::{InMemoryIndex, PageRequest};
