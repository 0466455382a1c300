//! Common test utilities for mptt-store
//!
//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use mptt_store::{
    InMemoryTreeStore, RecordId, SqliteTreeStore, TransactionManager, TreeRecord, TreeSpec,
    TreeStore,
};

/// Food / Meat / Fruit tree used throughout the scenarios
pub fn food_spec() -> TreeSpec {
    TreeSpec::node(
        "Food",
        vec![
            TreeSpec::node("Meat", vec![TreeSpec::leaf("Pork"), TreeSpec::leaf("Beef")]),
            TreeSpec::node(
                "Fruit",
                vec![
                    TreeSpec::node("Yellow", vec![TreeSpec::leaf("Banana")]),
                    TreeSpec::node("Red", vec![TreeSpec::leaf("Cherry")]),
                ],
            ),
        ],
    )
}

/// Build `spec` inserting every child with `create_as_child` only
///
/// Each child becomes the new first child of its parent, so siblings end up
/// in reverse declaration order. Walks depth-first with an explicit stack.
pub fn create_first_child_tree<S>(store: &S, spec: &TreeSpec) -> mptt_store::Result<()>
where
    S: TreeStore + TransactionManager,
{
    store.in_transaction(|| {
        let root = store.create_as_root(&spec.name)?;
        let mut stack: Vec<(&TreeSpec, RecordId)> = vec![(spec, root.id)];

        while let Some((node, parent_id)) = stack.pop() {
            for child in &node.children {
                let record = store.create_as_child(&child.name, parent_id)?;
                stack.push((child, record.id));
            }
        }
        Ok(())
    })
}

pub fn sqlite_store() -> SqliteTreeStore {
    SqliteTreeStore::in_memory().expect("in-memory sqlite store")
}

pub fn memory_store() -> InMemoryTreeStore {
    InMemoryTreeStore::new()
}

/// `(id, name, pid, lft, rht)` as the `mptt` table shows them
pub fn tuples(records: &[TreeRecord]) -> Vec<(i64, String, i64, i64, i64)> {
    records
        .iter()
        .map(|r| {
            (
                r.id,
                r.name.clone(),
                r.persisted_parent_id(),
                r.left,
                r.right,
            )
        })
        .collect()
}

pub fn row(id: i64, name: &str, pid: i64, lft: i64, rht: i64) -> (i64, String, i64, i64, i64) {
    (id, name.to_string(), pid, lft, rht)
}

pub fn names(records: &[TreeRecord]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

pub fn by_name<S: TreeStore>(store: &S, name: &str) -> TreeRecord {
    store
        .find_by_name(name)
        .expect("query")
        .unwrap_or_else(|| panic!("record '{}' not found", name))
}
