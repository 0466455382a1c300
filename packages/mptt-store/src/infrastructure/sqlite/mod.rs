//! SQLite adapter for TreeStore
//!
//! - `ConnectionManager`: shared connection + transaction demarcation
//! - `SqliteTreeStore`: `mptt` table schema and TreeStore implementation

pub mod connection;
pub mod store;

pub use connection::{ConnectionManager, IN_MEMORY_PATH};
pub use store::SqliteTreeStore;
