//! In-Memory Tree Store
//!
//! Vector-backed implementation of `TreeStore`, applying the interval encoder
//! directly. Used by unit tests and as a reference model for the SQLite store.

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::domain::interval::{plan_insert, Placement};
use crate::domain::models::{RecordId, TreeRecord};
use crate::domain::ports::{TransactionManager, TreeStore};
use crate::error::{Result, StorageError};

#[derive(Debug, Clone)]
struct State {
    records: Vec<TreeRecord>,
    next_id: RecordId,
}

impl State {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    fn get(&self, id: RecordId) -> Option<&TreeRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn insert(&mut self, placement: Placement<'_>, name: &str) -> TreeRecord {
        let plan = plan_insert(placement);
        if let Some(renumber) = plan.renumber {
            let touched = renumber.apply(&mut self.records);
            debug!(
                "insert: shifted {} records past {}",
                touched, renumber.left_threshold
            );
        }

        let record = TreeRecord::new(
            self.next_id,
            name,
            plan.parent_id,
            plan.slot.left,
            plan.slot.right,
        );
        self.next_id += 1;
        self.records.push(record.clone());
        record
    }

    fn select(&self, predicate: impl Fn(&TreeRecord) -> bool) -> Vec<TreeRecord> {
        let mut selected: Vec<TreeRecord> = self
            .records
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect();
        selected.sort_by_key(|r| r.left);
        selected
    }
}

/// In-memory `TreeStore`
///
/// Transactions snapshot the whole record set on `begin_transaction` and
/// restore it on `rollback`.
pub struct InMemoryTreeStore {
    state: RwLock<State>,
    snapshot: Mutex<Option<State>>,
}

impl InMemoryTreeStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::empty()),
            snapshot: Mutex::new(None),
        }
    }
}

impl Default for InMemoryTreeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeStore for InMemoryTreeStore {
    fn create_as_root(&self, name: &str) -> Result<TreeRecord> {
        let mut state = self.state.write();
        if !state.records.is_empty() {
            warn!(
                "create_as_root: {} records already stored, new root is not renumbered",
                state.records.len()
            );
        }
        Ok(state.insert(Placement::Root, name))
    }

    fn create_as_child(&self, name: &str, parent_id: RecordId) -> Result<TreeRecord> {
        let mut state = self.state.write();
        let parent = state
            .get(parent_id)
            .cloned()
            .ok_or_else(|| StorageError::record_not_found(parent_id))?;
        Ok(state.insert(Placement::FirstChildOf(&parent), name))
    }

    fn create_as_sibling(&self, name: &str, sibling_id: RecordId) -> Result<TreeRecord> {
        let mut state = self.state.write();
        let sibling = state
            .get(sibling_id)
            .cloned()
            .ok_or_else(|| StorageError::record_not_found(sibling_id))?;
        Ok(state.insert(Placement::After(&sibling), name))
    }

    fn find_by_id(&self, id: RecordId) -> Result<Option<TreeRecord>> {
        Ok(self.state.read().get(id).cloned())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<TreeRecord>> {
        Ok(self
            .state
            .read()
            .records
            .iter()
            .filter(|r| r.name == name)
            .min_by_key(|r| r.left)
            .cloned())
    }

    fn find_children(&self, parent: &TreeRecord) -> Result<Vec<TreeRecord>> {
        Ok(self
            .state
            .read()
            .select(|r| r.left > parent.left && r.right < parent.right))
    }

    fn find_immediate_children(&self, parent_id: RecordId) -> Result<Vec<TreeRecord>> {
        Ok(self
            .state
            .read()
            .select(|r| r.persisted_parent_id() == parent_id))
    }

    fn find_path(&self, first: &TreeRecord, last: &TreeRecord) -> Result<Vec<TreeRecord>> {
        Ok(self.state.read().select(|r| {
            (first.left..=last.left).contains(&r.left)
                && (last.right..=first.right).contains(&r.right)
        }))
    }

    fn find_leaves(&self) -> Result<Vec<TreeRecord>> {
        Ok(self.state.read().select(TreeRecord::is_leaf))
    }

    fn find_all(&self) -> Result<Vec<TreeRecord>> {
        Ok(self.state.read().select(|_| true))
    }

    fn count(&self) -> Result<usize> {
        Ok(self.state.read().records.len())
    }

    fn clear(&self) -> Result<()> {
        *self.state.write() = State::empty();
        Ok(())
    }
}

impl TransactionManager for InMemoryTreeStore {
    fn begin_transaction(&self) -> Result<()> {
        let mut snapshot = self.snapshot.lock();
        if snapshot.is_some() {
            return Err(StorageError::transaction("transaction already active"));
        }
        *snapshot = Some(self.state.read().clone());
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.snapshot
            .lock()
            .take()
            .map(|_| ())
            .ok_or_else(|| StorageError::transaction("commit without active transaction"))
    }

    fn rollback(&self) -> Result<()> {
        let saved = self
            .snapshot
            .lock()
            .take()
            .ok_or_else(|| StorageError::transaction("rollback without active transaction"))?;
        *self.state.write() = saved;
        Ok(())
    }
}
