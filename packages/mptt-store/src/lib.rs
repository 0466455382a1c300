//! mptt-store - Nested Set (MPTT) Tree Storage
//!
//! Trees are stored in a flat table, one row per node, each carrying a
//! `(left, right)` interval: a node's interval strictly contains the intervals
//! of all its descendants and siblings never overlap.
//!
//! ## Layout
//!
//! - `domain`: records, the pure interval encoder, `TreeStore` /
//!   `TransactionManager` ports
//! - `infrastructure`: SQLite and in-memory backends
//! - `tree`: arena-based reconstruction of a record set, BFS/DFS traversal
//! - `builder`: import of nested tree descriptions
//! - `config` / `logging`: ambient configuration and `tracing` set-up
//!
//! ## Usage
//!
//! ```rust
//! use mptt_store::{InMemoryTreeStore, MpttTree, TreeStore};
//!
//! let store = InMemoryTreeStore::new();
//! let food = store.create_as_root("Food")?;
//! let meat = store.create_as_child("Meat", food.id)?;
//! let pork = store.create_as_child("Pork", meat.id)?;
//! store.create_as_sibling("Beef", pork.id)?;
//!
//! let leaves: Vec<_> = store.find_leaves()?.into_iter().map(|r| r.name).collect();
//! assert_eq!(leaves, ["Pork", "Beef"]);
//!
//! let tree = MpttTree::build(store.find_all()?)?;
//! assert_eq!(tree.root().right, 8);
//! # Ok::<(), mptt_store::StorageError>(())
//! ```
//!
//! Mutations renumber existing rows before inserting; a multi-record build is
//! only consistent when wrapped in `TransactionManager::in_transaction`.

pub mod builder;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;
pub mod tree;

pub use error::{ErrorKind, Result, StorageError};

pub use builder::{append_child, import_subtree, import_tree, TreeSpec};
pub use config::{ConfigError, StoreConfig};
pub use domain::{Interval, RecordId, TransactionManager, TreeRecord, TreeStore};
pub use infrastructure::InMemoryTreeStore;
pub use tree::{MpttTree, NodeId};

#[cfg(feature = "sqlite")]
pub use infrastructure::{ConnectionManager, SqliteTreeStore};
