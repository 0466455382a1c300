//! Tree import
//!
//! Builds a whole nested tree description into a store in one transaction.
//! A node's first child is created with `create_as_child`, each following
//! child with `create_as_sibling` after the previous one, so the declaration
//! order of `children` becomes the pre-order of the stored tree.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::models::{RecordId, TreeRecord, NO_PARENT};
use crate::domain::ports::{TransactionManager, TreeStore};
use crate::error::{Result, StorageError};
use crate::tree::{MpttTree, NodeId};

/// Nested tree description
///
/// ```yaml
/// name: Food
/// children:
///   - name: Meat
///     children:
///       - name: Pork
///       - name: Beef
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeSpec>,
}

impl TreeSpec {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn node(name: impl Into<String>, children: Vec<TreeSpec>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }

    /// Parse YAML (or JSON, which YAML accepts)
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Number of nodes, this one included
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeSpec::size).sum::<usize>()
    }

    /// Describe a rebuilt tree as a spec
    pub fn from_tree(tree: &MpttTree) -> Self {
        // Post-order with an explicit stack: a node is assembled once all of
        // its children have been.
        let mut pending: Vec<(NodeId, bool)> = vec![(tree.root_id(), false)];
        let mut built: Vec<TreeSpec> = Vec::new();

        while let Some((node, expanded)) = pending.pop() {
            let children = tree.children_of(node);
            if expanded {
                let first_child = built.len() - children.len();
                let children = built.split_off(first_child);
                built.push(TreeSpec::node(tree.record(node).name.clone(), children));
            } else {
                pending.push((node, true));
                pending.extend(children.iter().rev().map(|&child| (child, false)));
            }
        }

        built.pop().unwrap_or_else(|| TreeSpec::leaf(tree.root().name.clone()))
    }
}

/// Store `spec` as a new root tree and return the root's final record
///
/// The store must be empty; use [`import_subtree`] to extend an existing tree.
pub fn import_tree<S>(store: &S, spec: &TreeSpec) -> Result<TreeRecord>
where
    S: TreeStore + TransactionManager,
{
    store.in_transaction(|| {
        let existing = store.count()?;
        if existing > 0 {
            return Err(StorageError::invalid_tree(format!(
                "cannot import '{}' as a new root: store already holds {} records, \
                 import it under an existing record instead",
                spec.name, existing
            )));
        }
        let root = store.create_as_root(&spec.name)?;
        let created = insert_descendants(store, spec, root.id)?;
        info!("import_tree: stored '{}' with {} descendants", spec.name, created);
        reload(store, root.id)
    })
}

/// Store `spec` as the last child of `parent_id`
pub fn import_subtree<S>(store: &S, spec: &TreeSpec, parent_id: RecordId) -> Result<TreeRecord>
where
    S: TreeStore + TransactionManager,
{
    store.in_transaction(|| {
        let root = append_child(store, &spec.name, parent_id)?;
        let created = insert_descendants(store, spec, root.id)?;
        info!(
            "import_subtree: stored '{}' under {} with {} descendants",
            spec.name, parent_id, created
        );
        reload(store, root.id)
    })
}

/// Insert `name` after the current last child of `parent_id`
pub fn append_child<S: TreeStore + ?Sized>(
    store: &S,
    name: &str,
    parent_id: RecordId,
) -> Result<TreeRecord> {
    if parent_id == NO_PARENT {
        return Err(StorageError::record_not_found(parent_id));
    }
    match store.find_immediate_children(parent_id)?.last() {
        Some(last) => store.create_as_sibling(name, last.id),
        None => store.create_as_child(name, parent_id),
    }
}

/// Depth-first walk over `spec.children`, returns how many records were created
fn insert_descendants<S: TreeStore + ?Sized>(
    store: &S,
    spec: &TreeSpec,
    id: RecordId,
) -> Result<usize> {
    let mut created = 0;
    let mut stack: Vec<(&TreeSpec, RecordId)> = vec![(spec, id)];

    while let Some((node, parent_id)) = stack.pop() {
        let mut previous: Option<RecordId> = None;
        for child in &node.children {
            let record = match previous {
                None => store.create_as_child(&child.name, parent_id)?,
                Some(sibling_id) => store.create_as_sibling(&child.name, sibling_id)?,
            };
            previous = Some(record.id);
            stack.push((child, record.id));
            created += 1;
        }
    }

    Ok(created)
}

fn reload<S: TreeStore + ?Sized>(store: &S, id: RecordId) -> Result<TreeRecord> {
    store
        .find_by_id(id)?
        .ok_or_else(|| StorageError::record_not_found(id))
}
