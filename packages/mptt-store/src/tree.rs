//! In-memory tree reconstruction
//!
//! Rebuilds parent/child links from a flat record set (typically
//! `TreeStore::find_all`) into an arena: nodes live in one `Vec` and refer
//! to each other by index.
//!
//! # Algorithm
//! 1. Sort records by `left`; the first one is the root
//! 2. Walk them with a stack of open ancestors, popping every entry that does
//!    not contain the current record; the remaining top is its parent
//! 3. Children are appended in `left` order
//!
//! Inconsistent input (several top-level records, partial overlaps, a
//! `parent_id` disagreeing with the intervals) is rejected with
//! `ErrorKind::InvalidTree`.

use std::collections::{HashMap, VecDeque};
use tracing::debug;

use crate::domain::interval::resolve_parents;
use crate::domain::models::{RecordId, TreeRecord};
use crate::error::{Result, StorageError};

/// Index of a node inside an [`MpttTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct TreeNode {
    record: TreeRecord,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Tree structure rebuilt from nested set records
///
/// # Example
/// ```
/// use mptt_store::domain::TreeRecord;
/// use mptt_store::MpttTree;
///
/// let tree = MpttTree::build(vec![
///     TreeRecord::new(1, "Food", None, 1, 8),
///     TreeRecord::new(2, "Meat", Some(1), 2, 7),
///     TreeRecord::new(3, "Pork", Some(2), 3, 4),
///     TreeRecord::new(4, "Beef", Some(2), 5, 6),
/// ])?;
///
/// let names: Vec<_> = tree.bfs().map(|r| r.name.as_str()).collect();
/// assert_eq!(names, ["Food", "Meat", "Pork", "Beef"]);
/// # Ok::<(), mptt_store::StorageError>(())
/// ```
#[derive(Debug)]
pub struct MpttTree {
    nodes: Vec<TreeNode>,
    index: HashMap<RecordId, NodeId>,
}

impl MpttTree {
    pub fn build(mut records: Vec<TreeRecord>) -> Result<Self> {
        records.sort_by_key(|r| r.left);
        let parents = resolve_parents(&records)?;

        let mut index = HashMap::with_capacity(records.len());
        let mut nodes: Vec<TreeNode> = Vec::with_capacity(records.len());

        for (position, (record, parent)) in records.into_iter().zip(parents).enumerate() {
            let id = NodeId(position);
            if index.insert(record.id, id).is_some() {
                return Err(StorageError::invalid_tree(format!(
                    "duplicate record id {}",
                    record.id
                )));
            }

            let parent = parent.map(NodeId);
            if let Some(NodeId(p)) = parent {
                nodes[p].children.push(id);
            }
            nodes.push(TreeNode {
                record,
                parent,
                children: Vec::new(),
            });
        }

        debug!("build: rebuilt tree with {} nodes", nodes.len());
        Ok(Self { nodes, index })
    }

    pub fn root(&self) -> &TreeRecord {
        &self.nodes[0].record
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: `build` rejects an empty record set
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, id: RecordId) -> Option<&TreeRecord> {
        self.index.get(&id).map(|&node| self.record(node))
    }

    pub fn node_id(&self, id: RecordId) -> Option<NodeId> {
        self.index.get(&id).copied()
    }

    pub fn record(&self, node: NodeId) -> &TreeRecord {
        &self.nodes[node.0].record
    }

    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children_of(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Parent record of `child`; `None` for the root or a record not in the tree
    pub fn parent(&self, child: &TreeRecord) -> Option<&TreeRecord> {
        let node = self.node_id(child.id)?;
        self.parent_of(node).map(|p| self.record(p))
    }

    /// Direct children of `parent`, ordered by `left`
    pub fn children(&self, parent: &TreeRecord) -> impl Iterator<Item = &TreeRecord> + '_ {
        let children = self
            .node_id(parent.id)
            .map(|node| self.children_of(node))
            .unwrap_or(&[]);
        children.iter().map(move |&c| self.record(c))
    }

    /// Distance from the root (root is 0)
    pub fn depth(&self, record: &TreeRecord) -> Option<usize> {
        let mut node = self.node_id(record.id)?;
        let mut depth = 0;
        while let Some(parent) = self.parent_of(node) {
            node = parent;
            depth += 1;
        }
        Some(depth)
    }

    /// Breadth-first (level order) traversal
    pub fn bfs(&self) -> Bfs<'_> {
        Bfs {
            tree: self,
            queue: VecDeque::from([self.root_id()]),
        }
    }

    /// Depth-first pre-order traversal, the same order as `find_all`
    pub fn dfs(&self) -> Dfs<'_> {
        Dfs {
            tree: self,
            stack: vec![self.root_id()],
        }
    }
}

impl<'a> IntoIterator for &'a MpttTree {
    type Item = &'a TreeRecord;
    type IntoIter = Bfs<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.bfs()
    }
}

/// Level-order iterator over an [`MpttTree`]
pub struct Bfs<'a> {
    tree: &'a MpttTree,
    queue: VecDeque<NodeId>,
}

impl<'a> Iterator for Bfs<'a> {
    type Item = &'a TreeRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        self.queue.extend(self.tree.children_of(node));
        Some(self.tree.record(node))
    }
}

/// Pre-order iterator over an [`MpttTree`]
pub struct Dfs<'a> {
    tree: &'a MpttTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Dfs<'a> {
    type Item = &'a TreeRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Reverse so the leftmost child is visited first
        self.stack.extend(self.tree.children_of(node).iter().rev());
        Some(self.tree.record(node))
    }
}
