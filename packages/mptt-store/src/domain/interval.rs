//! Interval encoder
//!
//! Pure functions maintaining the nested set numbering. Storage backends ask
//! [`plan_insert`] where a new record goes and which existing records must
//! shift, then persist the result in their own way (bulk `UPDATE` statements
//! for SQLite, [`Renumber::apply`] for the in-memory store).

use std::collections::HashSet;

use super::models::{Interval, RecordId, TreeRecord};
use crate::error::{Result, StorageError};

/// Room taken by one new record: its own left and right numbers
pub const SLOT_WIDTH: i64 = 2;

// ═══════════════════════════════════════════════════════════════════════════
// Renumbering
// ═══════════════════════════════════════════════════════════════════════════

/// Shift `left` values above `left_threshold` and `right` values above
/// `right_threshold` by `delta`.
///
/// The two thresholds are applied independently; a record can have only its
/// `right` moved (an ancestor of the insertion point). Returns the number of
/// records that changed.
pub fn renumber(
    records: &mut [TreeRecord],
    left_threshold: i64,
    right_threshold: i64,
    delta: i64,
) -> usize {
    let mut touched = 0;
    for record in records.iter_mut() {
        let mut changed = false;
        if record.left > left_threshold {
            record.left += delta;
            changed = true;
        }
        if record.right > right_threshold {
            record.right += delta;
            changed = true;
        }
        if changed {
            touched += 1;
        }
    }
    touched
}

/// One renumbering step, as executed before an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renumber {
    pub left_threshold: i64,
    pub right_threshold: i64,
    pub delta: i64,
}

impl Renumber {
    /// Open a slot directly after `parent.left`, i.e. for a new first child
    pub fn make_room_under(parent: Interval) -> Self {
        Self {
            left_threshold: parent.left,
            right_threshold: parent.left,
            delta: SLOT_WIDTH,
        }
    }

    /// Open a slot directly after `sibling.right`
    pub fn make_room_after(sibling: Interval) -> Self {
        Self {
            left_threshold: sibling.right,
            right_threshold: sibling.right,
            delta: SLOT_WIDTH,
        }
    }

    pub fn apply(&self, records: &mut [TreeRecord]) -> usize {
        renumber(
            records,
            self.left_threshold,
            self.right_threshold,
            self.delta,
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Insert planning
// ═══════════════════════════════════════════════════════════════════════════

/// Where a new record is attached
#[derive(Debug, Clone, Copy)]
pub enum Placement<'a> {
    /// New independent root at `(1, 2)`, nothing is renumbered
    Root,
    /// New first child of the given record
    FirstChildOf(&'a TreeRecord),
    /// New sibling placed right after the given record
    After(&'a TreeRecord),
}

/// Everything a backend needs to perform one insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPlan {
    pub renumber: Option<Renumber>,
    pub slot: Interval,
    pub parent_id: Option<RecordId>,
}

pub fn child_slot(parent: Interval) -> Interval {
    Interval::new(parent.left + 1, parent.left + 2)
}

pub fn sibling_slot(sibling: Interval) -> Interval {
    Interval::new(sibling.right + 1, sibling.right + 2)
}

pub fn plan_insert(placement: Placement<'_>) -> InsertPlan {
    match placement {
        Placement::Root => InsertPlan {
            renumber: None,
            slot: Interval::ROOT,
            parent_id: None,
        },
        Placement::FirstChildOf(parent) => InsertPlan {
            renumber: Some(Renumber::make_room_under(parent.interval())),
            slot: child_slot(parent.interval()),
            parent_id: Some(parent.id),
        },
        Placement::After(sibling) => InsertPlan {
            renumber: Some(Renumber::make_room_after(sibling.interval())),
            slot: sibling_slot(sibling.interval()),
            parent_id: sibling.parent_id,
        },
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Structure checks
// ═══════════════════════════════════════════════════════════════════════════

/// Resolve the containing record of every entry of `sorted`.
///
/// `sorted` must be ordered by `left`. Entry `i` of the result is the index of
/// the tightest record containing `sorted[i]`, or `None` for the first record.
/// Works on any subtree (e.g. a record plus its `find_children` result); the
/// first record's own `parent_id` is not checked.
pub fn resolve_parents(sorted: &[TreeRecord]) -> Result<Vec<Option<usize>>> {
    if sorted.is_empty() {
        return Err(StorageError::invalid_tree("empty record set"));
    }

    let mut endpoints = HashSet::with_capacity(sorted.len() * 2);
    for record in sorted {
        if record.left >= record.right {
            return Err(StorageError::invalid_tree(format!(
                "record {} has left {} >= right {}",
                record.id, record.left, record.right
            )));
        }
        if !endpoints.insert(record.left) || !endpoints.insert(record.right) {
            return Err(StorageError::invalid_tree(format!(
                "record {} shares an interval endpoint with another record",
                record.id
            )));
        }
    }

    let mut parents = Vec::with_capacity(sorted.len());
    let mut stack: Vec<usize> = Vec::new();

    for (index, record) in sorted.iter().enumerate() {
        // Records are visited in pre-order, so anything on the stack that does
        // not contain this record has no children left.
        while let Some(&top) = stack.last() {
            let candidate = &sorted[top];
            if candidate.contains(record) {
                break;
            }
            if candidate.right > record.left {
                return Err(StorageError::invalid_tree(format!(
                    "record {} ({}, {}) partially overlaps record {} ({}, {})",
                    record.id,
                    record.left,
                    record.right,
                    candidate.id,
                    candidate.left,
                    candidate.right
                )));
            }
            stack.pop();
        }

        let parent = stack.last().copied();
        match parent {
            None if index > 0 => {
                return Err(StorageError::invalid_tree(format!(
                    "record {} is outside of root record {}",
                    record.id, sorted[0].id
                )));
            }
            Some(p) if record.parent_id != Some(sorted[p].id) => {
                return Err(StorageError::invalid_tree(format!(
                    "record {} names parent {:?} but is nested in record {}",
                    record.id, record.parent_id, sorted[p].id
                )));
            }
            _ => {}
        }

        parents.push(parent);
        stack.push(index);
    }

    Ok(parents)
}

/// Check a complete table against the nested set invariants.
///
/// On top of [`resolve_parents`]: the first record must be a root and a record
/// is a leaf exactly when it has no children.
pub fn validate(records: &[TreeRecord]) -> Result<()> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.left);

    let parents = resolve_parents(&sorted)?;

    if !sorted[0].is_root() {
        return Err(StorageError::invalid_tree(format!(
            "top-level record {} has parent {:?}",
            sorted[0].id, sorted[0].parent_id
        )));
    }

    let mut child_counts = vec![0usize; sorted.len()];
    for parent in parents.iter().flatten() {
        child_counts[*parent] += 1;
    }

    for (record, children) in sorted.iter().zip(child_counts) {
        if record.is_leaf() != (children == 0) {
            return Err(StorageError::invalid_tree(format!(
                "record {} has {} children but interval width {}",
                record.id,
                children,
                record.interval().width()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn food_tree() -> Vec<TreeRecord> {
        vec![
            TreeRecord::new(1, "Food", None, 1, 8),
            TreeRecord::new(2, "Meat", Some(1), 2, 7),
            TreeRecord::new(3, "Pork", Some(2), 3, 4),
            TreeRecord::new(4, "Beef", Some(2), 5, 6),
        ]
    }

    #[test]
    fn test_renumber_thresholds_are_independent() {
        let mut records = food_tree();
        // New first child of Meat: everything after Meat.left moves
        let touched = renumber(&mut records, 2, 2, 2);

        assert_eq!(touched, 4);
        assert_eq!(records[0].interval(), Interval::new(1, 10));
        assert_eq!(records[1].interval(), Interval::new(2, 9));
        assert_eq!(records[2].interval(), Interval::new(5, 6));
        assert_eq!(records[3].interval(), Interval::new(7, 8));
    }

    #[test]
    fn test_renumber_after_sibling_only_moves_ancestors_right() {
        let mut records = food_tree();
        let touched = Renumber::make_room_after(Interval::new(5, 6)).apply(&mut records);

        assert_eq!(touched, 2);
        assert_eq!(records[0].interval(), Interval::new(1, 10));
        assert_eq!(records[1].interval(), Interval::new(2, 9));
        assert_eq!(records[2].interval(), Interval::new(3, 4));
        assert_eq!(records[3].interval(), Interval::new(5, 6));
    }

    #[test]
    fn test_plan_root() {
        let plan = plan_insert(Placement::Root);
        assert_eq!(plan.renumber, None);
        assert_eq!(plan.slot, Interval::ROOT);
        assert_eq!(plan.parent_id, None);
    }

    #[test]
    fn test_plan_first_child() {
        let meat = TreeRecord::new(2, "Meat", Some(1), 2, 7);
        let plan = plan_insert(Placement::FirstChildOf(&meat));

        assert_eq!(plan.slot, Interval::new(3, 4));
        assert_eq!(plan.parent_id, Some(2));
        assert_eq!(
            plan.renumber,
            Some(Renumber {
                left_threshold: 2,
                right_threshold: 2,
                delta: SLOT_WIDTH
            })
        );
    }

    #[test]
    fn test_plan_sibling_inherits_parent() {
        let pork = TreeRecord::new(3, "Pork", Some(2), 3, 4);
        let plan = plan_insert(Placement::After(&pork));

        assert_eq!(plan.slot, Interval::new(5, 6));
        assert_eq!(plan.parent_id, Some(2));
        assert_eq!(plan.renumber.map(|r| r.left_threshold), Some(4));
    }

    #[test]
    fn test_validate_accepts_food_tree() {
        assert!(validate(&food_tree()).is_ok());
    }

    #[test]
    fn test_resolve_parents() {
        let parents = resolve_parents(&food_tree()).unwrap();
        assert_eq!(parents, vec![None, Some(0), Some(1), Some(1)]);
    }

    #[test]
    fn test_validate_rejects_partial_overlap() {
        let records = vec![
            TreeRecord::new(1, "a", None, 1, 10),
            TreeRecord::new(2, "b", Some(1), 2, 5),
            TreeRecord::new(3, "c", Some(1), 4, 7),
        ];
        let err = validate(&records).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTree);
        assert!(err.message.contains("partially overlaps"));
    }

    #[test]
    fn test_validate_rejects_wrong_parent() {
        let mut records = food_tree();
        records[3].parent_id = Some(1);
        let err = validate(&records).unwrap_err();
        assert!(err.message.contains("names parent"));
    }

    #[test]
    fn test_validate_rejects_second_root() {
        let mut records = food_tree();
        records.push(TreeRecord::new(5, "Drinks", None, 9, 10));
        let err = validate(&records).unwrap_err();
        assert!(err.message.contains("outside of root"));
    }

    #[test]
    fn test_validate_rejects_gap_leaf() {
        let records = vec![
            TreeRecord::new(1, "Food", None, 1, 6),
            TreeRecord::new(2, "Meat", Some(1), 2, 5),
        ];
        let err = validate(&records).unwrap_err();
        assert!(err.message.contains("interval width"));
    }

    #[test]
    fn test_validate_rejects_empty_and_inverted() {
        assert!(validate(&[]).is_err());
        let records = vec![TreeRecord::new(1, "x", None, 3, 2)];
        assert!(validate(&records).is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_endpoints() {
        let records = vec![
            TreeRecord::new(1, "Food", None, 1, 2),
            TreeRecord::new(2, "Drinks", None, 1, 2),
        ];
        let err = validate(&records).unwrap_err();
        assert!(err.message.contains("endpoint"));
    }
}
