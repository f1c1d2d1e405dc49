//! Height-balanced (AVL) binary search tree.
//!
//! Every node caches its height. After any structural change the heights
//! on the path back to the root are recomputed bottom-up and each node's
//! balance factor (left height minus right height) is brought back into
//! `{-1, 0, 1}` with at most two rotations.
//!
//! ```text
//!        y                 x
//!       / \   rotate      / \
//!      x   C  ─right─►   A   y
//!     / \     ◄─left──      / \
//!    A   B                 B   C
//! ```
//!
//! Depth is O(log n), so the algorithms here recurse.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;

use tracing::trace;

use super::{InvariantViolation, OrderedIndex, Record, check_bounds, check_len};

type Link<R> = Option<Box<Node<R>>>;

struct Node<R> {
    record: R,
    left: Link<R>,
    right: Link<R>,
    /// Levels in the subtree rooted here; a leaf is 1, an empty link 0.
    height: i32,
}

impl<R> Node<R> {
    const fn leaf(record: R) -> Self {
        Self {
            record,
            left: None,
            right: None,
            height: 1,
        }
    }

    fn update_height(&mut self) {
        self.height = 1 + height(self.left.as_deref()).max(height(self.right.as_deref()));
    }

    fn balance_factor(&self) -> i32 {
        height(self.left.as_deref()) - height(self.right.as_deref())
    }
}

fn height<R>(node: Option<&Node<R>>) -> i32 {
    node.map_or(0, |node| node.height)
}

fn balance_factor<R>(node: Option<&Node<R>>) -> i32 {
    node.map_or(0, Node::balance_factor)
}

/// Lift the left child above `y`. Identity if `y` has no left child.
#[allow(clippy::unnecessary_box_returns)] // Subtrees move between parent slots as boxes.
fn rotate_right<R>(mut y: Box<Node<R>>) -> Box<Node<R>> {
    let Some(mut x) = y.left.take() else {
        return y;
    };
    y.left = x.right.take();
    y.update_height();
    x.right = Some(y);
    x.update_height();
    x
}

/// Lift the right child above `x`. Identity if `x` has no right child.
#[allow(clippy::unnecessary_box_returns)] // Subtrees move between parent slots as boxes.
fn rotate_left<R>(mut x: Box<Node<R>>) -> Box<Node<R>> {
    let Some(mut y) = x.right.take() else {
        return x;
    };
    x.right = y.left.take();
    x.update_height();
    y.left = Some(x);
    y.update_height();
    y
}

/// An ordered index backed by an AVL tree.
///
/// # Invariants
///
/// - Binary search tree ordering with unique keys.
/// - For every node, `|height(left) - height(right)| <= 1`.
/// - Every stored height equals `1 + max(height(left), height(right))`.
pub struct AvlTree<R> {
    root: Link<R>,
    len: usize,
}

impl<R> AvlTree<R> {
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

    /// Number of levels (0 when empty), read from the root's cached height.
    #[must_use]
    pub fn height(&self) -> usize {
        usize::try_from(height(self.root.as_deref())).unwrap_or_default()
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

impl<R: Record> AvlTree<R> {
    /// Insert a record, rebalancing on the way back up.
    ///
    /// Returns `false` without touching the tree if the key already exists.
    pub fn insert(&mut self, record: R) -> bool {
        let key = record.key().clone();
        let mut inserted = false;
        self.root = Some(insert_into(self.root.take(), record, &key, &mut inserted));
        if inserted {
            self.len += 1;
        }
        inserted
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

    /// Remove the record with the given key, rebalancing on the way back up.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<R>
    where
        R::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut removed = None;
        self.root = remove_from(self.root.take(), key, &mut removed);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// All records in ascending key order.
    #[must_use]
    pub fn to_ordered_sequence(&self) -> Vec<&R> {
        self.iter().collect()
    }

    /// Verify ordering, cached heights, balance factors and count.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut counted = 0;
        check_subtree(self.root.as_deref(), None, None, &mut counted)?;
        check_len(counted, self.len)
    }
}

#[allow(clippy::unnecessary_box_returns)] // Subtrees move between parent slots as boxes.
fn insert_into<R: Record>(
    link: Link<R>,
    record: R,
    key: &R::Key,
    inserted: &mut bool,
) -> Box<Node<R>> {
    let Some(mut node) = link else {
        *inserted = true;
        return Box::new(Node::leaf(record));
    };

    match key.cmp(node.record.key()) {
        Ordering::Less => node.left = Some(insert_into(node.left.take(), record, key, inserted)),
        Ordering::Greater => {
            node.right = Some(insert_into(node.right.take(), record, key, inserted));
        }
        Ordering::Equal => return node,
    }

    node.update_height();
    let balance = node.balance_factor();

    // The new key's position relative to the heavy child picks the case.
    if balance > 1 {
        match node.left.as_deref().map(|left| key.cmp(left.record.key())) {
            Some(Ordering::Less) => {
                trace!("avl insert {key:?}: rotate right");
                return rotate_right(node);
            }
            Some(Ordering::Greater) => {
                trace!("avl insert {key:?}: rotate left-right");
                node.left = node.left.take().map(rotate_left);
                return rotate_right(node);
            }
            _ => {}
        }
    }
    if balance < -1 {
        match node.right.as_deref().map(|right| key.cmp(right.record.key())) {
            Some(Ordering::Greater) => {
                trace!("avl insert {key:?}: rotate left");
                return rotate_left(node);
            }
            Some(Ordering::Less) => {
                trace!("avl insert {key:?}: rotate right-left");
                node.right = node.right.take().map(rotate_right);
                return rotate_left(node);
            }
            _ => {}
        }
    }

    node
}

fn remove_from<R, Q>(link: Link<R>, key: &Q, removed: &mut Option<R>) -> Link<R>
where
    R: Record,
    R::Key: Borrow<Q>,
    Q: Ord + ?Sized,
{
    let mut node = link?;

    match key.cmp(node.record.key().borrow()) {
        Ordering::Less => node.left = remove_from(node.left.take(), key, removed),
        Ordering::Greater => node.right = remove_from(node.right.take(), key, removed),
        Ordering::Equal => {
            if node.left.is_none() || node.right.is_none() {
                let node = *node;
                *removed = Some(node.record);
                return node.left.or(node.right);
            }

            let mut successor = None;
            node.right = take_min(node.right.take(), &mut successor);
            if let Some(successor) = successor {
                *removed = Some(mem::replace(&mut node.record, successor));
            }
        }
    }

    Some(rebalance(node))
}

/// Detach the leftmost node of `link`, rebalancing the path above it.
fn take_min<R>(link: Link<R>, min: &mut Option<R>) -> Link<R> {
    let mut node = link?;
    match node.left.take() {
        None => {
            let node = *node;
            *min = Some(node.record);
            node.right
        }
        Some(left) => {
            node.left = take_min(Some(left), min);
            Some(rebalance(node))
        }
    }
}

/// Restore the balance of `node` after a removal below it.
///
/// Unlike insertion, the case is chosen from the heavy child's own balance
/// factor, since there is no inserted key to compare against.
#[allow(clippy::unnecessary_box_returns)] // Subtrees move between parent slots as boxes.
fn rebalance<R>(mut node: Box<Node<R>>) -> Box<Node<R>> {
    node.update_height();
    let balance = node.balance_factor();

    if balance > 1 {
        if balance_factor(node.left.as_deref()) < 0 {
            trace!("avl rebalance: rotate left-right");
            node.left = node.left.take().map(rotate_left);
        } else {
            trace!("avl rebalance: rotate right");
        }
        return rotate_right(node);
    }
    if balance < -1 {
        if balance_factor(node.right.as_deref()) > 0 {
            trace!("avl rebalance: rotate right-left");
            node.right = node.right.take().map(rotate_right);
        } else {
            trace!("avl rebalance: rotate left");
        }
        return rotate_left(node);
    }

    node
}

/// Returns the actual height of the subtree.
fn check_subtree<R: Record>(
    node: Option<&Node<R>>,
    lower: Option<&R::Key>,
    upper: Option<&R::Key>,
    counted: &mut usize,
) -> Result<i32, InvariantViolation> {
    let Some(node) = node else {
        return Ok(0);
    };
    let key = node.record.key();
    check_bounds(key, lower, upper)?;
    *counted += 1;

    let left = check_subtree(node.left.as_deref(), lower, Some(key), counted)?;
    let right = check_subtree(node.right.as_deref(), Some(key), upper, counted)?;
    let actual = 1 + left.max(right);

    if node.height != actual {
        return Err(InvariantViolation::new(
            "stale height",
            format!("key {key:?} stores {} but has {actual}", node.height),
        ));
    }
    if (left - right).abs() > 1 {
        return Err(InvariantViolation::new(
            "balance factor out of range",
            format!("key {key:?} has left {left}, right {right}"),
        ));
    }
    Ok(actual)
}

impl<R> Default for AvlTree<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> OrderedIndex<R> for AvlTree<R> {
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

impl<'a, R> IntoIterator for &'a AvlTree<R> {
    type Item = &'a R;
    type IntoIter = Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over an [`AvlTree`].
pub struct Iter<'a, R> {
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
