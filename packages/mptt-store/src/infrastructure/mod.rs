//! Infrastructure layer - Storage adapters
//!
//! Multiple storage backends for the TreeStore trait

pub mod memory_store;
pub use memory_store::InMemoryTreeStore;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::{ConnectionManager, SqliteTreeStore};
