//! Nested set domain models
//!
//! - `TreeRecord`: one row of the tree table (id, name, parent, interval)
//! - `Interval`: the `(left, right)` pair encoding a node's position

use serde::{Deserialize, Serialize};

/// Identifier assigned by the storage backend
pub type RecordId = i64;

/// Persisted parent id of a root record
pub const NO_PARENT: RecordId = 0;

// ═══════════════════════════════════════════════════════════════════════════
// Interval
// ═══════════════════════════════════════════════════════════════════════════

/// A `(left, right)` interval of the nested set encoding
///
/// A node's interval strictly contains the intervals of all its descendants,
/// and the intervals of two siblings never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub left: i64,
    pub right: i64,
}

impl Interval {
    /// Interval of the first root record
    pub const ROOT: Interval = Interval { left: 1, right: 2 };

    pub fn new(left: i64, right: i64) -> Self {
        Self { left, right }
    }

    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    /// A leaf occupies exactly two consecutive numbers
    pub fn is_leaf(&self) -> bool {
        self.width() == 1
    }

    /// Strict containment: `other` lies inside `self` and is not `self`
    pub fn contains(&self, other: &Interval) -> bool {
        self.left < other.left && other.right < self.right
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.left < other.right && other.left < self.right
    }

    /// Number of descendants encoded by this interval, assuming compact numbering
    pub fn descendant_count(&self) -> i64 {
        (self.width() - 1) / 2
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TreeRecord
// ═══════════════════════════════════════════════════════════════════════════

/// One node of a nested set tree, as stored in the `mptt` table
///
/// # Examples
///
/// ```rust
/// use mptt_store::domain::TreeRecord;
///
/// let food = TreeRecord::new(1, "Food", None, 1, 8);
/// let meat = TreeRecord::new(2, "Meat", Some(1), 2, 7);
/// assert!(food.contains(&meat));
/// assert!(food.is_root());
/// assert!(!meat.is_leaf());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeRecord {
    /// Backend generated identifier
    pub id: RecordId,
    /// Label, not required to be unique
    pub name: String,
    /// Immediate parent, `None` for a root (persisted as `0`)
    pub parent_id: Option<RecordId>,
    pub left: i64,
    pub right: i64,
}

impl TreeRecord {
    pub fn new(
        id: RecordId,
        name: impl Into<String>,
        parent_id: Option<RecordId>,
        left: i64,
        right: i64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
            left,
            right,
        }
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.left, self.right)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.interval().is_leaf()
    }

    /// Whether `other` is a (transitive) descendant of this record
    pub fn contains(&self, other: &TreeRecord) -> bool {
        self.interval().contains(&other.interval())
    }

    pub fn descendant_count(&self) -> i64 {
        self.interval().descendant_count()
    }

    /// Parent id as persisted in the `pid` column
    pub fn persisted_parent_id(&self) -> RecordId {
        self.parent_id.unwrap_or(NO_PARENT)
    }

    /// Inverse of [`TreeRecord::persisted_parent_id`]
    pub fn parent_from_persisted(pid: RecordId) -> Option<RecordId> {
        Some(pid).filter(|&p| p != NO_PARENT)
    }
}
