//! Unbalanced binary search tree.
//!
//! No rebalancing is ever done, so the shape depends entirely on insertion
//! order: ascending keys degenerate into a right spine of depth n. Every
//! walk in this module, including `Drop`, is iterative so such a spine
//! cannot overflow the call stack.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;

use tracing::trace;

use super::{InvariantViolation, OrderedIndex, Record, check_bounds, check_len};

type Link<R> = Option<Box<Node<R>>>;

/// A node awaiting its check, with the exclusive key bounds it must respect.
type Bounded<'a, R> = (
    &'a Node<R>,
    Option<&'a <R as Record>::Key>,
    Option<&'a <R as Record>::Key>,
);

struct Node<R> {
    record: R,
    left: Link<R>,
    right: Link<R>,
}

impl<R> Node<R> {
    const fn leaf(record: R) -> Self {
        Self {
            record,
            left: None,
            right: None,
        }
    }
}

/// An ordered index backed by a plain binary search tree.
///
/// # Invariants
///
/// - For every node, keys in the left subtree < node key < keys in the
///   right subtree.
/// - `len` equals the number of nodes.
pub struct BinarySearchTree<R> {
    root: Link<R>,
    len: usize,
}

impl<R> BinarySearchTree<R> {
    /// Create an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None, len: 0 }
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
        let mut deepest = 0;
        let mut stack: Vec<(&Node<R>, usize)> =
            self.root.as_deref().map(|root| (root, 1)).into_iter().collect();
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.left.as_deref().map(|left| (left, depth + 1)));
            stack.extend(node.right.as_deref().map(|right| (right, depth + 1)));
        }
        deepest
    }

    /// Iterate over records in ascending key order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, R> {
        let mut iter = Iter {
            stack: Vec::new(),
            remaining: self.len,
        };
        iter.descend_left(self.root.as_deref());
        iter
    }
}

impl<R: Record> BinarySearchTree<R> {
    /// Insert a record as a new leaf.
    ///
    /// Returns `false` without touching the tree if the key already exists.
    pub fn insert(&mut self, record: R) -> bool {
        let slot = locate(&mut self.root, record.key());
        if slot.is_some() {
            return false;
        }
        *slot = Some(Box::new(Node::leaf(record)));
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
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(node.record.key().borrow()) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.record),
            };
        }
        None
    }

    /// Remove the record with the given key.
    ///
    /// A node with two children takes over the record of the minimum node of
    /// its right subtree, and that minimum node is detached instead.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<R>
    where
        R::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let slot = locate(&mut self.root, key);
        let mut node = slot.take()?;
        self.len -= 1;

        if node.left.is_none() {
            *slot = node.right.take();
            return Some(node.record);
        }

        if let Some(successor) = take_min(&mut node.right) {
            trace!("bst remove: successor {:?} promoted", successor.key());
            let removed = mem::replace(&mut node.record, successor);
            *slot = Some(node);
            Some(removed)
        } else {
            *slot = node.left.take();
            Some(node.record)
        }
    }

    /// All records in ascending key order.
    #[must_use]
    pub fn to_ordered_sequence(&self) -> Vec<&R> {
        self.iter().collect()
    }

    /// Verify ordering and count over the whole tree.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut counted = 0;
        let mut stack: Vec<Bounded<'_, R>> = self
            .root
            .as_deref()
            .map(|root| (root, None, None))
            .into_iter()
            .collect();

        while let Some((node, lower, upper)) = stack.pop() {
            let key = node.record.key();
            check_bounds(key, lower, upper)?;
            counted += 1;
            stack.extend(node.left.as_deref().map(|left| (left, lower, Some(key))));
            stack.extend(node.right.as_deref().map(|right| (right, Some(key), upper)));
        }

        check_len(counted, self.len)
    }
}

/// Find the slot holding `key`, or the empty slot where it would be attached.
fn locate<'a, R, Q>(mut slot: &'a mut Link<R>, key: &Q) -> &'a mut Link<R>
where
    R: Record,
    R::Key: Borrow<Q>,
    Q: Ord + ?Sized,
{
    while let Some(ordering) = slot
        .as_deref()
        .map(|node| key.cmp(node.record.key().borrow()))
        .filter(|ordering| ordering.is_ne())
    {
        let Some(node) = slot else { break };
        slot = if ordering.is_lt() {
            &mut node.left
        } else {
            &mut node.right
        };
    }
    slot
}

/// Detach the leftmost node under `slot`, splicing its right child in its place.
fn take_min<R>(mut slot: &mut Link<R>) -> Option<R> {
    while slot.as_deref().is_some_and(|node| node.left.is_some()) {
        let Some(node) = slot else { break };
        slot = &mut node.left;
    }
    let min = *slot.take()?;
    *slot = min.right;
    Some(min.record)
}

impl<R> Default for BinarySearchTree<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Drop for BinarySearchTree<R> {
    fn drop(&mut self) {
        let mut stack: Vec<Box<Node<R>>> = self.root.take().into_iter().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.left.take());
            stack.extend(node.right.take());
        }
    }
}

impl<R: Record> OrderedIndex<R> for BinarySearchTree<R> {
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

impl<'a, R> IntoIterator for &'a BinarySearchTree<R> {
    type Item = &'a R;
    type IntoIter = Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over a [`BinarySearchTree`].
pub struct Iter<'a, R> {
    /// Nodes whose record has not been yielded yet, deepest on top.
    stack: Vec<&'a Node<R>>,
    remaining: usize,
}

impl<'a, R> Iter<'a, R> {
    fn descend_left(&mut self, mut node: Option<&'a Node<R>>) {
        while let Some(current) = node {
            self.stack.push(current);
            node = current.left.as_deref();
        }
    }
}

impl<'a, R> Iterator for Iter<'a, R> {
    type Item = &'a R;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.descend_left(node.right.as_deref());
        self.remaining = self.remaining.saturating_sub(1);
        Some(&node.record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<R> ExactSizeIterator for Iter<'_, R> {}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    use super::*;
    use crate::index::test_support::{Item, keys};

    fn tree_of(keys: &[u32]) -> BinarySearchTree<Item> {
        let mut tree = BinarySearchTree::new();
        for &key in keys {
            assert!(tree.insert(Item::new(key)));
        }
        tree
    }

    fn root_key(tree: &BinarySearchTree<Item>) -> Option<u32> {
        tree.root.as_deref().map(|node| node.record.key)
    }

    #[test]
    fn test_empty_tree() {
        let tree: BinarySearchTree<Item> = BinarySearchTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert!(tree.search(&1).is_none());
        assert!(tree.to_ordered_sequence().is_empty());
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_insert_and_search() {
        let tree = tree_of(&[50, 20, 80, 10, 30]);

        assert_eq!(tree.len(), 5);
        assert_eq!(tree.search(&30), Some(&Item::new(30)));
        assert!(tree.search(&40).is_none());
        assert_eq!(keys(tree.iter()), vec![10, 20, 30, 50, 80]);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_duplicate_insert_is_ignored() {
        let mut tree = tree_of(&[5]);
        let replacement = Item {
            key: 5,
            value: "replacement".to_string(),
        };

        assert!(!tree.insert(replacement));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.search(&5).map(|item| item.value.as_str()), Some("value_5"));
    }

    #[test]
    fn test_remove_two_children_promotes_right_minimum() {
        let mut tree = tree_of(&[50, 20, 80, 10, 30]);

        assert_eq!(tree.remove(&20), Some(Item::new(20)));

        // 30 took 20's place under the root, keeping 10 as its left child.
        let root = tree.root.as_deref().expect("root");
        let left = root.left.as_deref().expect("left child");
        assert_eq!(left.record.key, 30);
        assert_eq!(left.left.as_deref().map(|node| node.record.key), Some(10));
        assert!(left.right.is_none());

        assert_eq!(keys(tree.iter()), vec![10, 30, 50, 80]);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_remove_leaf_and_single_child() {
        let mut tree = tree_of(&[50, 20, 80, 10, 90]);

        // Leaf.
        assert!(tree.remove(&10).is_some());
        // 80 has only a right child.
        assert!(tree.remove(&80).is_some());
        assert_eq!(
            tree.root.as_deref().and_then(|root| root.right.as_deref()).map(|node| node.record.key),
            Some(90)
        );
        // Root has two children: 90, the minimum on the right, takes its place.
        assert!(tree.remove(&50).is_some());
        assert_eq!(root_key(&tree), Some(90));

        assert_eq!(keys(tree.iter()), vec![20, 90]);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_remove_root_with_left_child_only() {
        let mut tree = tree_of(&[5, 3, 1]);

        assert!(tree.remove(&5).is_some());
        assert_eq!(root_key(&tree), Some(3));
        assert_eq!(keys(tree.iter()), vec![1, 3]);
    }

    #[test]
    fn test_remove_absent_key_is_idempotent() {
        let mut tree = tree_of(&[4, 2, 6]);

        assert!(tree.remove(&5).is_none());
        assert!(tree.remove(&5).is_none());
        assert_eq!(tree.len(), 3);
        assert_eq!(keys(tree.iter()), vec![2, 4, 6]);
    }

    #[test]
    fn test_search_after_insert_and_remove() {
        let mut tree = BinarySearchTree::new();
        tree.insert(Item::new(7));
        assert_eq!(tree.search(&7), Some(&Item::new(7)));
        tree.remove(&7);
        assert!(tree.search(&7).is_none());
    }

    #[test]
    fn test_ascending_inserts_degenerate_without_overflow() {
        let n = 25_000;
        let mut tree = BinarySearchTree::new();
        for key in 0..n {
            tree.insert(Item::new(key));
        }

        assert_eq!(tree.height(), n as usize);
        assert!(tree.search(&(n - 1)).is_some());
        assert_eq!(tree.iter().count(), n as usize);
        assert!(tree.remove(&0).is_some());
        assert!(tree.check_invariants().is_ok());
        // Dropping the spine must not recurse.
        drop(tree);
    }

    #[test]
    fn test_remove_all_in_random_order() {
        let mut rng = StdRng::seed_from_u64(12345);
        let mut keys_to_insert: Vec<u32> = (0..500).collect();
        keys_to_insert.shuffle(&mut rng);

        let mut tree = tree_of(&keys_to_insert);
        assert_eq!(keys(tree.iter()), (0..500).collect::<Vec<_>>());

        keys_to_insert.shuffle(&mut rng);
        for key in &keys_to_insert {
            assert_eq!(tree.remove(key).map(|item| item.key), Some(*key));
            assert!(tree.check_invariants().is_ok());
        }

        assert!(tree.is_empty());
        assert!(tree.root.is_none());
    }

    #[test]
    fn test_iter_size_hint() {
        let tree = tree_of(&[3, 1, 2]);
        let mut iter = tree.iter();
        assert_eq!(iter.len(), 3);
        iter.next();
        assert_eq!(iter.len(), 2);
    }
}
