//! Multiway balanced tree (B-tree) with minimum degree [`MIN_DEGREE`].
//!
//! Every record lives in exactly one node. Unlike a B+tree, internal
//! nodes hold records too, and there are no sibling links.
//!
//! # Structure
//!
//! - A node holds between `MIN_DEGREE - 1` and [`MAX_ENTRIES`] records
//!   sorted by key; only the root may hold fewer.
//! - An internal node with k records has k+1 children. Record i separates
//!   child i (keys below it) from child i+1 (keys above it).
//! - All leaves sit at the same depth.
//!
//! # Algorithms
//!
//! Insertion splits full nodes on the way down, so a parent always has room
//! for a promoted median and no second pass upward is needed. Removal fills
//! thin children on the way down (borrow from a sibling, or merge with one),
//! so the child it descends into can always afford to lose a record.

use std::borrow::Borrow;
use std::mem;

use tracing::trace;

use super::{InvariantViolation, OrderedIndex, Record, check_bounds, check_len};

/// Minimum degree T. Non-root nodes hold at least `T - 1` records.
pub const MIN_DEGREE: usize = 3;

/// Records in a full node: `2T - 1`.
pub const MAX_ENTRIES: usize = 2 * MIN_DEGREE - 1;

/// A B-tree node. A node without children is a leaf.
struct Node<R> {
    entries: Vec<R>,
    children: Vec<Self>,
}

impl<R> Node<R> {
    const fn new() -> Self {
        Self {
            entries: Vec::new(),
            children: Vec::new(),
        }
    }

    const fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    const fn is_full(&self) -> bool {
        self.entries.len() >= MAX_ENTRIES
    }

    /// Whether this node can give up a record and stay legal.
    const fn can_lend(&self) -> bool {
        self.entries.len() >= MIN_DEGREE
    }
}

impl<R: Record> Node<R> {
    /// Number of records with a key strictly below `key`, scanning left to right.
    ///
    /// This is both the position `key` would take in `entries` and the index
    /// of the child to descend into when `key` is not in this node.
    fn position<Q>(&self, key: &Q) -> usize
    where
        R::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries
            .iter()
            .take_while(|entry| entry.key().borrow() < key)
            .count()
    }

    fn holds_at<Q>(&self, idx: usize, key: &Q) -> bool
    where
        R::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries
            .get(idx)
            .is_some_and(|entry| entry.key().borrow() == key)
    }

    /// Split the full child at `idx`, promoting its median into this node.
    ///
    /// The child keeps the lower `T - 1` records (and `T` children); a new
    /// sibling inserted right after it takes the upper `T - 1` records (and
    /// `T` children).
    fn split_child(&mut self, idx: usize) {
        let child = &mut self.children[idx];
        let mut upper = child.entries.split_off(MIN_DEGREE - 1);
        let median = upper.remove(0);
        let children = if child.is_leaf() {
            Vec::new()
        } else {
            child.children.split_off(MIN_DEGREE)
        };

        trace!("btree split: promoting {:?}", median.key());
        self.entries.insert(idx, median);
        self.children.insert(
            idx + 1,
            Self {
                entries: upper,
                children,
            },
        );
    }

    /// Insert into a subtree whose root is known not to be full.
    fn insert_non_full(&mut self, record: R) {
        let mut idx = self.position(record.key());
        if self.is_leaf() {
            self.entries.insert(idx, record);
            return;
        }

        if self.children[idx].is_full() {
            self.split_child(idx);
            if self.entries[idx].key() < record.key() {
                idx += 1;
            }
        }
        self.children[idx].insert_non_full(record);
    }

    /// Key of the rightmost record in this subtree.
    fn last_key(&self) -> Option<&R::Key> {
        let mut node = self;
        while let Some(child) = node.children.last() {
            node = child;
        }
        node.entries.last().map(Record::key)
    }

    /// Key of the leftmost record in this subtree.
    fn first_key(&self) -> Option<&R::Key> {
        let mut node = self;
        while let Some(child) = node.children.first() {
            node = child;
        }
        node.entries.first().map(Record::key)
    }

    /// Remove `key` from this subtree.
    ///
    /// Every node this descends into holds at least `T` records on entry
    /// (or is the root), so removing one never underflows it.
    fn remove<Q>(&mut self, key: &Q) -> Option<R>
    where
        R::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let idx = self.position(key);

        if self.holds_at(idx, key) {
            if self.is_leaf() {
                return Some(self.entries.remove(idx));
            }

            if self.children[idx].can_lend() {
                let predecessor_key = self.children[idx].last_key()?.clone();
                let predecessor = self.children[idx].remove::<R::Key>(&predecessor_key)?;
                return Some(mem::replace(&mut self.entries[idx], predecessor));
            }

            if self.children[idx + 1].can_lend() {
                let successor_key = self.children[idx + 1].first_key()?.clone();
                let successor = self.children[idx + 1].remove::<R::Key>(&successor_key)?;
                return Some(mem::replace(&mut self.entries[idx], successor));
            }

            self.merge(idx);
            return self.children[idx].remove(key);
        }

        if self.is_leaf() {
            return None;
        }

        let was_last = idx == self.entries.len();
        if !self.children[idx].can_lend() {
            self.fill(idx);
        }

        // Filling the last child may have merged it into its left sibling.
        if was_last && idx > self.entries.len() {
            self.children[idx - 1].remove(key)
        } else {
            self.children[idx].remove(key)
        }
    }

    /// Give the child at `idx` at least `T` records.
    fn fill(&mut self, idx: usize) {
        if idx != 0 && self.children[idx - 1].can_lend() {
            self.borrow_from_prev(idx);
        } else if idx != self.entries.len() && self.children[idx + 1].can_lend() {
            self.borrow_from_next(idx);
        } else if idx != self.entries.len() {
            self.merge(idx);
        } else {
            self.merge(idx - 1);
        }
    }

    /// Rotate one record from the left sibling through the separator into
    /// the child at `idx`.
    ///
    /// # Pre-conditions
    ///
    /// - `idx > 0` and the left sibling can lend.
    fn borrow_from_prev(&mut self, idx: usize) {
        let sibling = &mut self.children[idx - 1];
        let lent = sibling.entries.remove(sibling.entries.len() - 1);
        let grandchild = if sibling.is_leaf() {
            None
        } else {
            Some(sibling.children.remove(sibling.children.len() - 1))
        };

        trace!("btree borrow from left: {:?}", lent.key());
        let separator = mem::replace(&mut self.entries[idx - 1], lent);
        let child = &mut self.children[idx];
        child.entries.insert(0, separator);
        if let Some(grandchild) = grandchild {
            child.children.insert(0, grandchild);
        }
    }

    /// Rotate one record from the right sibling through the separator into
    /// the child at `idx`.
    ///
    /// # Pre-conditions
    ///
    /// - `idx` is not the last child and the right sibling can lend.
    fn borrow_from_next(&mut self, idx: usize) {
        let sibling = &mut self.children[idx + 1];
        let lent = sibling.entries.remove(0);
        let grandchild = if sibling.is_leaf() {
            None
        } else {
            Some(sibling.children.remove(0))
        };

        trace!("btree borrow from right: {:?}", lent.key());
        let separator = mem::replace(&mut self.entries[idx], lent);
        let child = &mut self.children[idx];
        child.entries.push(separator);
        if let Some(grandchild) = grandchild {
            child.children.push(grandchild);
        }
    }

    /// Fold separator `idx` and child `idx + 1` into child `idx`.
    fn merge(&mut self, idx: usize) {
        let sibling = self.children.remove(idx + 1);
        let separator = self.entries.remove(idx);
        trace!("btree merge around {:?}", separator.key());

        let child = &mut self.children[idx];
        child.entries.push(separator);
        child.entries.extend(sibling.entries);
        child.children.extend(sibling.children);
    }

    /// Verify this subtree, returning the number of records it holds.
    fn check(
        &self,
        is_root: bool,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        lower: Option<&R::Key>,
        upper: Option<&R::Key>,
    ) -> Result<usize, InvariantViolation> {
        let count = self.entries.len();
        let first = self.entries.first().map(Record::key);

        if count > MAX_ENTRIES || (!is_root && count < MIN_DEGREE - 1) {
            return Err(InvariantViolation::new(
                "node entry count out of range",
                format!("node starting at {first:?} at depth {depth} holds {count}"),
            ));
        }

        let mut previous = lower;
        for entry in &self.entries {
            check_bounds(entry.key(), previous, upper)?;
            previous = Some(entry.key());
        }

        if self.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(InvariantViolation::new(
                        "leaves at different depths",
                        format!("leaf starting at {first:?} at depth {depth}, expected {expected}"),
                    ));
                }
                Some(_) => {}
            }
            return Ok(count);
        }

        if self.children.len() != count + 1 {
            return Err(InvariantViolation::new(
                "child count does not match entry count",
                format!(
                    "node starting at {first:?} has {count} entries and {} children",
                    self.children.len()
                ),
            ));
        }

        let mut total = count;
        for (i, child) in self.children.iter().enumerate() {
            let child_lower = if i == 0 {
                lower
            } else {
                Some(self.entries[i - 1].key())
            };
            let child_upper = self.entries.get(i).map(Record::key).or(upper);
            total += child.check(false, depth + 1, leaf_depth, child_lower, child_upper)?;
        }
        Ok(total)
    }
}

/// An ordered index backed by a B-tree of minimum degree [`MIN_DEGREE`].
pub struct BTree<R> {
    root: Node<R>,
    len: usize,
}

impl<R> BTree<R> {
    /// Create an empty tree whose root is an empty leaf.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: Node::new(),
            len: 0,
        }
    }

    /// Number of records stored.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels (0 when empty).
    #[must_use]
    pub fn height(&self) -> usize {
        if self.len == 0 {
            return 0;
        }
        let mut levels = 1;
        let mut node = &self.root;
        while let Some(child) = node.children.first() {
            levels += 1;
            node = child;
        }
        levels
    }

    /// Number of records held directly by the root node.
    #[must_use]
    pub const fn root_entry_count(&self) -> usize {
        self.root.entries.len()
    }

    /// Number of children of the root node (0 while the root is a leaf).
    #[must_use]
    pub const fn root_child_count(&self) -> usize {
        self.root.children.len()
    }

    /// Iterate over records in ascending key order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, R> {
        let mut iter = Iter {
            stack: Vec::new(),
            remaining: self.len,
        };
        iter.descend_first(&self.root);
        iter
    }
}

impl<R: Record> BTree<R> {
    /// Insert a record, splitting full nodes on the way down.
    ///
    /// Returns `false` without touching the tree if the key already exists.
    pub fn insert(&mut self, record: R) -> bool {
        if self.search(record.key()).is_some() {
            return false;
        }

        if self.root.is_full() {
            let old_root = mem::replace(&mut self.root, Node::new());
            self.root.children.push(old_root);
            self.root.split_child(0);
            trace!("btree root split, height now {}", self.height());
        }

        self.root.insert_non_full(record);
        self.len += 1;
        true
    }

    /// Look up a record by key, or by any borrowed form of it.
    #[must_use]
    pub fn search<Q>(&self, key: &Q) -> Option<&R>
    where
        R::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = &self.root;
        loop {
            let idx = node.position(key);
            if let Some(entry) = node
                .entries
                .get(idx)
                .filter(|entry| entry.key().borrow() == key)
            {
                return Some(entry);
            }
            node = node.children.get(idx)?;
        }
    }

    /// Remove the record with the given key.
    ///
    /// Absent keys return `None` before any node is touched. If the root is
    /// left without records but with a child, that child becomes the root.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<R>
    where
        R::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search(key)?;

        let removed = self.root.remove(key);
        if removed.is_some() {
            self.len -= 1;
        }

        if self.root.entries.is_empty() && !self.root.is_leaf() {
            let child = self.root.children.remove(0);
            self.root = child;
            trace!("btree root collapsed, height now {}", self.height());
        }

        removed
    }

    /// All records in ascending key order.
    #[must_use]
    pub fn to_ordered_sequence(&self) -> Vec<&R> {
        self.iter().collect()
    }

    /// Verify entry counts, child counts, ordering, leaf depth and count.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut leaf_depth = None;
        let counted = self.root.check(true, 0, &mut leaf_depth, None, None)?;
        check_len(counted, self.len)
    }
}

impl<R> Default for BTree<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> OrderedIndex<R> for BTree<R> {
    fn insert(&mut self, record: R) -> bool {
        Self::insert(self, record)
    }

    fn search(&self, key: &R::Key) -> Option<&R> {
        Self::search(self, key)
    }

    fn remove(&mut self, key: &R::Key) -> Option<R> {
        Self::remove(self, key)
    }

    fn to_ordered_sequence(&self) -> Vec<&R> {
        Self::to_ordered_sequence(self)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn check_invariants(&self) -> Result<(), InvariantViolation> {
        Self::check_invariants(self)
    }
}

impl<'a, R> IntoIterator for &'a BTree<R> {
    type Item = &'a R;
    type IntoIter = Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over a [`BTree`].
///
/// Before yielding record i of a node it has already walked child i; after
/// the last record it walks the final child.
pub struct Iter<'a, R> {
    /// Path of nodes paired with the index of their next record to yield.
    stack: Vec<(&'a Node<R>, usize)>,
    remaining: usize,
}

impl<'a, R> Iter<'a, R> {
    fn descend_first(&mut self, mut node: &'a Node<R>) {
        loop {
            self.stack.push((node, 0));
            match node.children.first() {
                Some(child) => node = child,
                None => break,
            }
        }
    }
}

impl<'a, R> Iterator for Iter<'a, R> {
    type Item = &'a R;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            let (node, idx) = *top;
            if let Some(entry) = node.entries.get(idx) {
                top.1 += 1;
                if let Some(child) = node.children.get(idx + 1) {
                    self.descend_first(child);
                }
                self.remaining = self.remaining.saturating_sub(1);
                return Some(entry);
            }
            self.stack.pop();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<R> ExactSizeIterator for Iter<'_, R> {}
