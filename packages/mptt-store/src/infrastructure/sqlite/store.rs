//! SQLite Tree Store
//!
//! Persists nested set records in the `mptt` table. Renumbering runs as two
//! bulk `UPDATE` statements (one for `lft`, one for `rht`) ahead of each
//! insert, both under the same connection lock.

use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use std::path::Path;
use tracing::{debug, warn};

use super::connection::ConnectionManager;
use crate::domain::interval::{plan_insert, InsertPlan, Placement};
use crate::domain::models::{RecordId, TreeRecord};
use crate::domain::ports::{TransactionManager, TreeStore};
use crate::error::{Result, StorageError};

const SELECT_RECORD: &str = "SELECT id, name, pid, lft, rht FROM mptt";

/// SQLite-based TreeStore implementation
///
/// Clones share one `ConnectionManager`, hence one connection and one
/// transaction. While a thread is inside `in_transaction`, calls made through
/// any clone from other threads run inside that same transaction and are
/// committed or rolled back with it. Give each independent writer its own
/// store opened on the database file; those serialize on `BEGIN IMMEDIATE`.
#[derive(Clone)]
pub struct SqliteTreeStore {
    manager: ConnectionManager,
}

impl SqliteTreeStore {
    /// Create a store on top of an existing connection manager
    pub fn new(manager: ConnectionManager) -> Result<Self> {
        let store = Self { manager };
        store.init_schema()?;
        Ok(store)
    }

    /// Create a new SQLite store at the given path
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        Self::new(ConnectionManager::open(db_path)?)
    }

    /// Create an in-memory SQLite store (for testing)
    pub fn in_memory() -> Result<Self> {
        Self::new(ConnectionManager::open_in_memory()?)
    }

    pub fn connection_manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.manager.get();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS mptt (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                pid INTEGER NOT NULL DEFAULT 0,
                lft INTEGER NOT NULL,
                rht INTEGER NOT NULL
            )",
            [],
        )?;

        // Range scans on both interval ends
        conn.execute("CREATE INDEX IF NOT EXISTS idx_mptt_lft ON mptt(lft)", [])?;
        conn.execute("CREATE INDEX IF NOT EXISTS idx_mptt_rht ON mptt(rht)", [])?;
        conn.execute("CREATE INDEX IF NOT EXISTS idx_mptt_pid ON mptt(pid)", [])?;
        conn.execute("CREATE INDEX IF NOT EXISTS idx_mptt_name ON mptt(name)", [])?;

        Ok(())
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<TreeRecord> {
    Ok(TreeRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: TreeRecord::parent_from_persisted(row.get(2)?),
        left: row.get(3)?,
        right: row.get(4)?,
    })
}

fn query_records<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<TreeRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let records = stmt
        .query_map(params, row_to_record)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

fn find_by_id_in(conn: &Connection, id: RecordId) -> Result<Option<TreeRecord>> {
    let record = conn
        .query_row(
            &format!("{} WHERE id = ?1", SELECT_RECORD),
            params![id],
            row_to_record,
        )
        .optional()?;
    Ok(record)
}

fn require(conn: &Connection, id: RecordId) -> Result<TreeRecord> {
    find_by_id_in(conn, id)?.ok_or_else(|| StorageError::record_not_found(id))
}

/// Apply the renumbering of `plan` and insert the new record
fn insert(conn: &Connection, name: &str, plan: InsertPlan) -> Result<TreeRecord> {
    if let Some(renumber) = plan.renumber {
        // Both statements are required; either one alone breaks nesting
        let lefts = conn.execute(
            "UPDATE mptt SET lft = lft + ?2 WHERE lft > ?1",
            params![renumber.left_threshold, renumber.delta],
        )?;
        let rights = conn.execute(
            "UPDATE mptt SET rht = rht + ?2 WHERE rht > ?1",
            params![renumber.right_threshold, renumber.delta],
        )?;
        debug!(
            "insert: shifted {} lft / {} rht values by {}",
            lefts, rights, renumber.delta
        );
    }

    let parent_id = plan.parent_id;
    conn.execute(
        "INSERT INTO mptt (name, pid, lft, rht) VALUES (?1, ?2, ?3, ?4)",
        params![
            name,
            parent_id.unwrap_or(crate::domain::NO_PARENT),
            plan.slot.left,
            plan.slot.right
        ],
    )?;

    let record = TreeRecord::new(
        conn.last_insert_rowid(),
        name,
        parent_id,
        plan.slot.left,
        plan.slot.right,
    );
    debug!(
        "insert: stored '{}' as {} at ({}, {})",
        record.name, record.id, record.left, record.right
    );
    Ok(record)
}

impl TreeStore for SqliteTreeStore {
    fn create_as_root(&self, name: &str) -> Result<TreeRecord> {
        let conn = self.manager.get();
        let existing: i64 = conn.query_row("SELECT COUNT(*) FROM mptt", [], |row| row.get(0))?;
        if existing > 0 {
            warn!(
                "create_as_root: {} records already stored, new root is not renumbered",
                existing
            );
        }
        insert(&conn, name, plan_insert(Placement::Root))
    }

    fn create_as_child(&self, name: &str, parent_id: RecordId) -> Result<TreeRecord> {
        let conn = self.manager.get();
        let parent = require(&conn, parent_id)?;
        insert(&conn, name, plan_insert(Placement::FirstChildOf(&parent)))
    }

    fn create_as_sibling(&self, name: &str, sibling_id: RecordId) -> Result<TreeRecord> {
        let conn = self.manager.get();
        let sibling = require(&conn, sibling_id)?;
        insert(&conn, name, plan_insert(Placement::After(&sibling)))
    }

    fn find_by_id(&self, id: RecordId) -> Result<Option<TreeRecord>> {
        find_by_id_in(&self.manager.get(), id)
    }

    fn find_by_name(&self, name: &str) -> Result<Option<TreeRecord>> {
        let conn = self.manager.get();
        let record = conn
            .query_row(
                &format!("{} WHERE name = ?1 ORDER BY lft LIMIT 1", SELECT_RECORD),
                params![name],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn find_children(&self, parent: &TreeRecord) -> Result<Vec<TreeRecord>> {
        query_records(
            &self.manager.get(),
            &format!("{} WHERE lft > ?1 AND rht < ?2 ORDER BY lft", SELECT_RECORD),
            params![parent.left, parent.right],
        )
    }

    fn find_immediate_children(&self, parent_id: RecordId) -> Result<Vec<TreeRecord>> {
        query_records(
            &self.manager.get(),
            &format!("{} WHERE pid = ?1 ORDER BY lft", SELECT_RECORD),
            params![parent_id],
        )
    }

    fn find_path(&self, first: &TreeRecord, last: &TreeRecord) -> Result<Vec<TreeRecord>> {
        query_records(
            &self.manager.get(),
            &format!(
                "{} WHERE lft BETWEEN ?1 AND ?2 AND rht BETWEEN ?3 AND ?4 ORDER BY lft",
                SELECT_RECORD
            ),
            params![first.left, last.left, last.right, first.right],
        )
    }

    fn find_leaves(&self) -> Result<Vec<TreeRecord>> {
        query_records(
            &self.manager.get(),
            &format!("{} WHERE rht - lft = 1 ORDER BY lft", SELECT_RECORD),
            [],
        )
    }

    fn find_all(&self) -> Result<Vec<TreeRecord>> {
        query_records(
            &self.manager.get(),
            &format!("{} ORDER BY lft", SELECT_RECORD),
            [],
        )
    }

    fn count(&self) -> Result<usize> {
        let conn = self.manager.get();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM mptt", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn clear(&self) -> Result<()> {
        // Without AUTOINCREMENT, rowids restart at 1 once the table is empty
        self.manager.get().execute("DELETE FROM mptt", [])?;
        Ok(())
    }
}

impl TransactionManager for SqliteTreeStore {
    fn begin_transaction(&self) -> Result<()> {
        self.manager.begin_transaction()
    }

    fn commit(&self) -> Result<()> {
        self.manager.commit()
    }

    fn rollback(&self) -> Result<()> {
        self.manager.rollback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_schema_is_idempotent() {
        let manager = ConnectionManager::open_in_memory().unwrap();
        let store = SqliteTreeStore::new(manager.clone()).unwrap();
        store.create_as_root("Food").unwrap();

        // Re-initialising keeps existing rows
        let again = SqliteTreeStore::new(manager).unwrap();
        assert_eq!(again.count().unwrap(), 1);
    }

    #[test]
    fn test_root_persists_parent_sentinel() {
        let store = SqliteTreeStore::in_memory().unwrap();
        let root = store.create_as_root("Food").unwrap();

        let pid: i64 = store
            .connection_manager()
            .get()
            .query_row("SELECT pid FROM mptt WHERE id = ?1", params![root.id], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(pid, 0);
        assert_eq!(store.find_by_id(root.id).unwrap().unwrap().parent_id, None);
    }

    #[test]
    fn test_child_and_sibling() {
        let store = SqliteTreeStore::in_memory().unwrap();
        let food = store.create_as_root("Food").unwrap();
        let meat = store.create_as_child("Meat", food.id).unwrap();
        let pork = store.create_as_child("Pork", meat.id).unwrap();
        let beef = store.create_as_sibling("Beef", pork.id).unwrap();

        assert_eq!((pork.left, pork.right), (3, 4));
        assert_eq!((beef.left, beef.right), (5, 6));
        assert_eq!(beef.parent_id, Some(meat.id));

        let food = store.find_by_id(food.id).unwrap().unwrap();
        assert_eq!((food.left, food.right), (1, 8));
        let meat = store.find_by_id(meat.id).unwrap().unwrap();
        assert_eq!((meat.left, meat.right), (2, 7));
    }

    #[test]
    fn test_missing_reference() {
        let store = SqliteTreeStore::in_memory().unwrap();
        store.create_as_root("Food").unwrap();

        let err = store.create_as_child("Meat", 99).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RecordNotFound);
        let err = store.create_as_sibling("Meat", 99).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RecordNotFound);

        // Lookup failures happen before any renumbering
        let root = store.find_by_name("Food").unwrap().unwrap();
        assert_eq!((root.left, root.right), (1, 2));
    }

    #[test]
    fn test_empty_queries() {
        let store = SqliteTreeStore::in_memory().unwrap();
        assert!(store.find_all().unwrap().is_empty());
        assert!(store.find_leaves().unwrap().is_empty());
        assert!(store.find_immediate_children(1).unwrap().is_empty());
        assert!(store.find_by_id(1).unwrap().is_none());
        assert!(store.find_by_name("Food").unwrap().is_none());
    }

    #[test]
    fn test_find_by_name_prefers_preorder() {
        let store = SqliteTreeStore::in_memory().unwrap();
        let food = store.create_as_root("Food").unwrap();
        let first = store.create_as_child("Other", food.id).unwrap();
        // Inserted as the new first child, so it precedes `first` in pre-order
        let second = store.create_as_child("Other", food.id).unwrap();

        let found = store.find_by_name("Other").unwrap().unwrap();
        assert_eq!(found.id, second.id);
        assert_ne!(found.id, first.id);
    }

    #[test]
    fn test_clear_restarts_ids() {
        let store = SqliteTreeStore::in_memory().unwrap();
        let food = store.create_as_root("Food").unwrap();
        store.create_as_child("Meat", food.id).unwrap();

        store.clear().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.create_as_root("Food").unwrap().id, 1);
    }

    #[test]
    fn test_clones_share_the_open_transaction() {
        let store = SqliteTreeStore::in_memory().unwrap();
        let food = store.create_as_root("Food").unwrap();
        let clone = store.clone();

        store.begin_transaction().unwrap();
        clone.create_as_child("Meat", food.id).unwrap();
        assert!(clone.connection_manager().is_in_transaction());
        store.rollback().unwrap();

        assert_eq!(clone.count().unwrap(), 1);
    }
}
