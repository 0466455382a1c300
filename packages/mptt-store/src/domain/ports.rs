//! Port traits implemented by the storage backends

use super::models::{RecordId, TreeRecord};
use crate::error::Result;

// ═══════════════════════════════════════════════════════════════════════════
// Port Trait: TreeStore
// ═══════════════════════════════════════════════════════════════════════════

/// Nested set tree storage
///
/// # Core Operations
///
/// 1. **Mutation**
///    - `create_as_root`: first root at `(1, 2)`
///    - `create_as_child`: new first child of an existing record
///    - `create_as_sibling`: new record right after an existing record
///
/// 2. **Queries** (all ordered by `left`, i.e. pre-order)
///    - `find_by_id` / `find_by_name`
///    - `find_children`: every descendant
///    - `find_immediate_children`: one level deep
///    - `find_path`: ancestor chain between two records
///    - `find_leaves` / `find_all`
///
/// Mutations renumber existing records before inserting. They are not atomic
/// across calls; wrap multi-record builds in
/// [`TransactionManager::in_transaction`].
///
/// # Implementations
///
/// - `SqliteTreeStore`: SQLite adapter
/// - `InMemoryTreeStore`: vector-backed reference implementation
pub trait TreeStore: Send + Sync {
    // ═══════════════════════════════════════════════════════════════════════
    // Mutation Operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Store a root record with `parent_id = None`, `left = 1`, `right = 2`
    ///
    /// Existing records are not renumbered.
    fn create_as_root(&self, name: &str) -> Result<TreeRecord>;

    /// Store a record as the first child of `parent_id`
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::RecordNotFound` if the parent doesn't exist
    fn create_as_child(&self, name: &str, parent_id: RecordId) -> Result<TreeRecord>;

    /// Store a record right after `sibling_id`, under the same parent
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::RecordNotFound` if the sibling doesn't exist
    fn create_as_sibling(&self, name: &str, sibling_id: RecordId) -> Result<TreeRecord>;

    // ═══════════════════════════════════════════════════════════════════════
    // Query Operations
    // ═══════════════════════════════════════════════════════════════════════

    fn find_by_id(&self, id: RecordId) -> Result<Option<TreeRecord>>;

    /// First record in pre-order carrying `name`
    fn find_by_name(&self, name: &str) -> Result<Option<TreeRecord>>;

    /// All descendants of `parent` (not only direct children)
    fn find_children(&self, parent: &TreeRecord) -> Result<Vec<TreeRecord>>;

    /// Direct children of `parent_id`
    fn find_immediate_children(&self, parent_id: RecordId) -> Result<Vec<TreeRecord>>;

    /// Records on the path from `first` down to `last`, both included
    ///
    /// Empty when `first` is not an ancestor (or `last` itself).
    fn find_path(&self, first: &TreeRecord, last: &TreeRecord) -> Result<Vec<TreeRecord>>;

    /// Records whose interval width is 1
    fn find_leaves(&self) -> Result<Vec<TreeRecord>>;

    fn find_all(&self) -> Result<Vec<TreeRecord>>;

    fn count(&self) -> Result<usize>;

    /// Remove every record and restart id generation
    fn clear(&self) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════
// Port Trait: TransactionManager
// ═══════════════════════════════════════════════════════════════════════════

/// Caller-driven transaction demarcation
///
/// Tree mutations leave the table inconsistent if a later step of a build
/// fails; callers own the unit of work and roll back on error.
pub trait TransactionManager {
    fn begin_transaction(&self) -> Result<()>;

    fn commit(&self) -> Result<()>;

    fn rollback(&self) -> Result<()>;

    /// Run `f` in a transaction: commit on `Ok`, roll back on `Err`
    ///
    /// The error returned by `f` (or by a failed commit) is preserved; a
    /// failing rollback is logged. A failed commit is rolled back as well, so
    /// the transaction never stays open after this returns.
    fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce() -> Result<T>,
    {
        self.begin_transaction()?;
        let result = f().and_then(|value| self.commit().map(|()| value));
        if result.is_err() {
            if let Err(rollback_err) = self.rollback() {
                tracing::error!("in_transaction: rollback failed: {}", rollback_err);
            }
        }
        result
    }
}
