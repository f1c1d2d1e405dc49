//! In-memory ordered indexes.
//!
//! Three independent tree engines share one behavioral contract,
//! [`OrderedIndex`], but no code:
//!
//! - [`BinarySearchTree`]: unbalanced, depth O(n) in the worst case
//! - [`AvlTree`]: height-balanced, every balance factor in `{-1, 0, 1}`
//! - [`BTree`]: multiway, minimum degree [`btree::MIN_DEGREE`]
//!
//! # Duplicate keys
//!
//! Inserting a key that is already present leaves the index untouched and
//! returns `false`. The existing record is never overwritten.
//!
//! # Usage
//!
//! ```
//! use library::index::{AvlTree, OrderedIndex, Record};
//!
//! #[derive(Debug, PartialEq)]
//! struct Entry(u32);
//!
//! impl Record for Entry {
//!     type Key = u32;
//!     fn key(&self) -> &u32 {
//!         &self.0
//!     }
//! }
//!
//! let mut tree = AvlTree::new();
//! assert!(tree.insert(Entry(2)));
//! assert!(tree.insert(Entry(1)));
//! assert!(!tree.insert(Entry(2)));
//!
//! assert_eq!(tree.search(&1), Some(&Entry(1)));
//! assert_eq!(tree.remove(&2), Some(Entry(2)));
//! assert_eq!(tree.to_ordered_sequence(), vec![&Entry(1)]);
//! ```

pub mod avl;
pub mod bst;
pub mod btree;

use std::fmt;

pub use avl::AvlTree;
pub use bst::BinarySearchTree;
pub use btree::BTree;

/// A value stored in an index, identified by a unique key.
pub trait Record {
    /// The ordering key. Two records with equal keys are duplicates.
    type Key: Ord + Clone + fmt::Debug;

    /// The key this record is indexed by.
    fn key(&self) -> &Self::Key;
}

/// Common contract implemented by every tree engine.
///
/// # Invariants
///
/// - Keys are unique; `to_ordered_sequence` is strictly ascending.
/// - Every operation leaves the structure fully valid before returning.
/// - `search` borrows into live storage; the borrow ends before the next
///   mutation.
pub trait OrderedIndex<R: Record> {
    /// Insert a record. Returns `false` (and drops `record`) if its key is
    /// already present.
    fn insert(&mut self, record: R) -> bool;

    /// Look up a record by key.
    fn search(&self, key: &R::Key) -> Option<&R>;

    /// Remove a record by key. Absent keys are a no-op returning `None`.
    fn remove(&mut self, key: &R::Key) -> Option<R>;

    /// All records in ascending key order.
    fn to_ordered_sequence(&self) -> Vec<&R>;

    /// Number of records stored.
    fn len(&self) -> usize;

    /// Whether the index holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walk the whole structure and report the first broken invariant.
    ///
    /// Linear in the number of records. Meant for tests and simulation.
    fn check_invariants(&self) -> Result<(), InvariantViolation>;
}

/// A structural invariant that does not hold.
///
/// Produced only by `check_invariants`; a correct engine never yields one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Which invariant is broken.
    pub description: String,
    /// Where it is broken (keys, counts, depths).
    pub context: String,
}

impl InvariantViolation {
    pub(crate) fn new(description: &str, context: String) -> Self {
        Self {
            description: description.to_string(),
            context,
        }
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.is_empty() {
            write!(f, "{}", self.description)
        } else {
            write!(f, "{} ({})", self.description, self.context)
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// Check that `key` lies strictly between the optional bounds.
pub(crate) fn check_bounds<K: Ord + fmt::Debug>(
    key: &K,
    lower: Option<&K>,
    upper: Option<&K>,
) -> Result<(), InvariantViolation> {
    if lower.is_some_and(|lower| key <= lower) || upper.is_some_and(|upper| key >= upper) {
        return Err(InvariantViolation::new(
            "key out of order",
            format!("key {key:?} not within ({lower:?}, {upper:?})"),
        ));
    }
    Ok(())
}

/// Check that a walk visited exactly as many records as the index counts.
pub(crate) fn check_len(counted: usize, stored: usize) -> Result<(), InvariantViolation> {
    if counted == stored {
        Ok(())
    } else {
        Err(InvariantViolation::new(
            "record count mismatch",
            format!("walked {counted} records, len() reports {stored}"),
        ))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_bounds() {
        assert!(check_bounds(&5, Some(&1), Some(&9)).is_ok());
        assert!(check_bounds(&5, None, None).is_ok());
        assert!(check_bounds(&1, Some(&1), None).is_err());
        assert!(check_bounds(&9, None, Some(&9)).is_err());
    }

    #[test]
    fn test_invariant_violation_display() {
        let violation = InvariantViolation::new("height is stale", "key 7".to_string());
        assert_eq!(violation.to_string(), "height is stale (key 7)");

        let bare = InvariantViolation::new("empty", String::new());
        assert_eq!(bare.to_string(), "empty");
    }
}
