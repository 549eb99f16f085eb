//! A multi-way search tree. Each node holds up to `max_node_elements` sorted values and a node
//! with `m` values partitions its subtree into `m + 1` ranges: one below each value (the value's
//! `left` child) plus one above the largest value (the last value's `right` child).
//!
//! Nodes are never split or merged. A value is stored in the first node on its search path with
//! room for it, and a new child node is only created when a full node has nowhere else to put a
//! value. With `max_node_elements == 1` this is a plain, unbalanced binary search tree.
//!
//! # Examples
//!
//! ```
//! use mwtree::btree::Tree;
//!
//! # fn main() -> mwtree::Result<()> {
//! let mut tree = Tree::new(4)?;
//!
//! for value in [37, 20, 105, 1, 12] {
//!     tree.insert(value);
//! }
//!
//! // Values come out in order no matter how they went in.
//! assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [1, 12, 20, 37, 105]);
//! assert_eq!(tree.iter().rev().copied().collect::<Vec<_>>(), [105, 37, 20, 12, 1]);
//!
//! // Inserting a value twice is reported rather than stored.
//! let (cursor, inserted) = tree.insert(20);
//! assert!(!inserted);
//! assert_eq!(cursor.get(), Some(&20));
//!
//! assert_eq!(tree.find(&12).get(), Some(&12));
//! assert_eq!(tree.find(&13), tree.end());
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::cursor::{Cursor, CursorMut, Iter, RawCursor};
use crate::error::{Error, Result};

/// How many values a node of a [`Tree::default`] holds.
pub const DEFAULT_MAX_NODE_ELEMENTS: usize = 40;

/// An ordered set of unique values stored in a multi-way search tree.
///
/// See the [module documentation][crate::btree] for the layout and an example.
pub struct Tree<T> {
    // The root is heap allocated like every other node so that moving the `Tree` doesn't break the
    // parent pointers of the root's children.
    root: NonNull<Node<T>>,
    max_elements: usize,
    len: usize,
    _owns: PhantomData<Box<Node<T>>>,
}

// SAFETY: A `Tree` uniquely owns every node reachable from its root, exactly like a `Box` would.
// Shared access only ever reads through the parent and child pointers.
unsafe impl<T: Send> Send for Tree<T> {}
// SAFETY: See above. `&Tree` hands out nothing but `&T`.
unsafe impl<T: Sync> Sync for Tree<T> {}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::with_max_elements(DEFAULT_MAX_NODE_ELEMENTS)
    }
}

impl<T> Drop for Tree<T> {
    fn drop(&mut self) {
        let mut pending = vec![self.root];
        while let Some(node) = pending.pop() {
            // SAFETY: Every node was allocated by `Node::new_boxed` and is referenced by exactly one
            // owning link (the root by `self.root`, every other node by one element's `left` or
            // `right`), so each node is pushed and freed exactly once. Links are plain pointers, so
            // freeing a node doesn't touch its children.
            let node = unsafe { Box::from_raw(node.as_ptr()) };
            for element in &node.elements {
                pending.extend(element.left.0);
                pending.extend(element.right.0);
            }
        }
    }
}

impl<T> Clone for Tree<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        let mut tree = Self::with_max_elements(self.max_elements);
        tree.len = self.len;

        let mut pending = VecDeque::new();
        pending.push_back((self.root, tree.root));
        while let Some((source, copy)) = pending.pop_front() {
            // SAFETY: `source` belongs to `self`, which we only read. `copy` was allocated either
            // above or in an earlier iteration and nothing else references it yet.
            let (source, copy_node) = unsafe { (&*source.as_ptr(), &mut *copy.as_ptr()) };
            copy_node.elements.reserve_exact(source.elements.len());

            for element in &source.elements {
                // Clone the value before allocating children so a panicking `clone` can't leak
                // nodes that aren't linked into `tree` yet.
                let value = element.value.clone();
                let mut child_copy = |child: Link<T>| {
                    Link(child.0.map(|child| {
                        let new_child = Node::new_boxed(Link(Some(copy)));
                        pending.push_back((child, new_child));
                        new_child
                    }))
                };
                let left = child_copy(element.left);
                let right = child_copy(element.right);
                copy_node.elements.push(Element { value, left, right });
            }
        }

        tracing::debug!(len = tree.len, "cloned tree");
        tree
    }
}

impl<T> fmt::Debug for Tree<T>
where
    T: fmt::Debug + Ord,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Writes the values breadth first, separated by single spaces.
impl<T> fmt::Display for Tree<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = VecDeque::new();
        pending.push_back(self.root_node());

        let mut separator = "";
        while let Some(node) = pending.pop_front() {
            for element in &node.elements {
                write!(f, "{}{}", separator, element.value)?;
                separator = " ";
                pending.extend(element.left.node());
                pending.extend(element.right.node());
            }
        }

        Ok(())
    }
}

impl<T> Tree<T> {
    /// Generates a new, empty `Tree` whose nodes each hold at most `max_node_elements` values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroCapacity`] if `max_node_elements` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use mwtree::{btree::Tree, Error};
    ///
    /// let tree = Tree::<u32>::new(3).unwrap();
    /// assert!(tree.is_empty());
    ///
    /// assert_eq!(Tree::<u32>::new(0).unwrap_err(), Error::ZeroCapacity);
    /// ```
    pub fn new(max_node_elements: usize) -> Result<Self> {
        if max_node_elements == 0 {
            tracing::debug!("rejected tree configured with zero elements per node");
            return Err(Error::ZeroCapacity);
        }

        Ok(Self::with_max_elements(max_node_elements))
    }

    fn with_max_elements(max_elements: usize) -> Self {
        Self {
            root: Node::new_boxed(Link(None)),
            max_elements,
            len: 0,
            _owns: PhantomData,
        }
    }

    /// The most values any single node of this tree holds.
    pub fn max_node_elements(&self) -> usize {
        self.max_elements
    }

    /// The number of values in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no values.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A cursor at the smallest value, or at [`Tree::end`] if the tree is empty.
    pub fn begin(&self) -> Cursor<'_, T> {
        Cursor::new(self, RawCursor::first(self.root))
    }

    /// The cursor one past the largest value.
    pub fn end(&self) -> Cursor<'_, T> {
        Cursor::new(self, RawCursor::end(self.root))
    }

    /// A mutable cursor at the smallest value, or at [`Tree::end_mut`] if the tree is empty.
    pub fn begin_mut(&mut self) -> CursorMut<'_, T> {
        let raw = RawCursor::first(self.root);
        CursorMut::new(self, raw)
    }

    /// The mutable cursor one past the largest value.
    pub fn end_mut(&mut self) -> CursorMut<'_, T> {
        let raw = RawCursor::end(self.root);
        CursorMut::new(self, raw)
    }

    /// Iterates over the values in increasing order. Use `iter().rev()` for decreasing order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// The smallest value in the tree.
    pub fn first(&self) -> Option<&T> {
        self.begin().get()
    }

    /// The largest value in the tree.
    pub fn last(&self) -> Option<&T>
    where
        T: Ord,
    {
        self.iter().next_back()
    }

    /// Inserts `value` unless an equal value is already present.
    ///
    /// Returns a cursor at the value equal to `value` and whether it was inserted by this call.
    /// Nothing changes when an equal value was already present.
    ///
    /// # Examples
    ///
    /// ```
    /// use mwtree::btree::Tree;
    ///
    /// let mut tree = Tree::new(2).unwrap();
    ///
    /// let (cursor, inserted) = tree.insert("b");
    /// assert!(inserted);
    /// assert_eq!(cursor.get(), Some(&"b"));
    ///
    /// let (_, inserted) = tree.insert("b");
    /// assert!(!inserted);
    /// assert_eq!(tree.len(), 1);
    /// ```
    pub fn insert(&mut self, value: T) -> (Cursor<'_, T>, bool)
    where
        T: Ord,
    {
        let (raw, inserted) = self.insert_raw(value);
        (Cursor::new(self, raw), inserted)
    }

    fn insert_raw(&mut self, value: T) -> (RawCursor<T>, bool)
    where
        T: Ord,
    {
        let mut current = self.root;
        let mut depth = 0_usize;
        loop {
            // SAFETY: `current` is the root or was reached through an owning link of a node in
            // this tree. We hold `&mut self` so there is no other reference into the tree.
            let node = unsafe { &mut *current.as_ptr() };
            let pos = match node.search(&value) {
                Ok(pos) => return (RawCursor::new(current, pos), false),
                Err(pos) => pos,
            };

            // A node with room never has children so inserting here can't disturb a `right` link.
            if node.elements.len() < self.max_elements {
                node.elements.insert(pos, Element::new(value));
                self.len += 1;
                return (RawCursor::new(current, pos), true);
            }

            let slot = node.child_slot_mut(pos);
            let existing = slot.0;
            current = match existing {
                Some(child) => child,
                None => {
                    let child = Node::new_boxed(Link(Some(current)));
                    *slot = Link(Some(child));
                    tracing::trace!(depth = depth + 1, "created child node");
                    child
                }
            };
            depth += 1;
        }
    }

    /// Finds the value equal to `value`. If there is none, the returned cursor equals
    /// [`Tree::end`].
    ///
    /// # Examples
    ///
    /// ```
    /// use mwtree::btree::Tree;
    ///
    /// let mut tree = Tree::new(1).unwrap();
    /// tree.extend([2, 1, 3]);
    ///
    /// assert_eq!(tree.find(&3).get(), Some(&3));
    /// assert_eq!(tree.find(&42), tree.end());
    /// ```
    pub fn find(&self, value: &T) -> Cursor<'_, T>
    where
        T: Ord,
    {
        let raw = self
            .find_raw(value)
            .unwrap_or_else(|| RawCursor::end(self.root));
        Cursor::new(self, raw)
    }

    /// Like [`Tree::find`] but the cursor can replace the value it points at.
    pub fn find_mut(&mut self, value: &T) -> CursorMut<'_, T>
    where
        T: Ord,
    {
        let raw = self
            .find_raw(value)
            .unwrap_or_else(|| RawCursor::end(self.root));
        CursorMut::new(self, raw)
    }

    /// Whether a value equal to `value` is in the tree.
    pub fn contains(&self, value: &T) -> bool
    where
        T: Ord,
    {
        self.find_raw(value).is_some()
    }

    fn find_raw(&self, value: &T) -> Option<RawCursor<T>>
    where
        T: Ord,
    {
        let mut current = self.root;
        loop {
            // SAFETY: `current` is the root or was reached through an owning link of a node in
            // this tree, and we hold `&self` so nothing mutates it.
            let node = unsafe { &*current.as_ptr() };
            match node.search(value) {
                Ok(pos) => return Some(RawCursor::new(current, pos)),
                Err(pos) => current = node.child(pos).0?,
            }
        }
    }

    pub(crate) fn root_node(&self) -> &Node<T> {
        // SAFETY: The root is always allocated and only freed in `Drop`. Because we take `&self`
        // here there can be no aliasing `&mut` obtained through `&mut self`.
        unsafe { self.root.as_ref() }
    }
}

impl<T> Extend<T> for Tree<T>
where
    T: Ord,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, values: I) {
        for value in values {
            self.insert(value);
        }
    }
}

impl<T> FromIterator<T> for Tree<T>
where
    T: Ord,
{
    /// Collects into a tree with [`DEFAULT_MAX_NODE_ELEMENTS`] values per node.
    fn from_iter<I: IntoIterator<Item = T>>(values: I) -> Self {
        let mut tree = Self::default();
        tree.extend(values);
        tree
    }
}

impl<'a, T> IntoIterator for &'a Tree<T>
where
    T: Ord,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A non-null pointer to a node, or nothing. Whether it owns the node depends on where it is
/// stored: element `left`/`right` links own their node, `Node::parent` doesn't.
pub(crate) struct Link<T>(pub(crate) Option<NonNull<Node<T>>>);

impl<T> Clone for Link<T> {
    fn clone(&self) -> Self {
        Self(self.0)
    }
}
impl<T> Copy for Link<T> {}

impl<T> Link<T> {
    pub(crate) fn node(&self) -> Option<&Node<T>> {
        // SAFETY: Non-empty links always point at a live node of the same tree as `self`. The
        // returned borrow is tied to the borrow of the link, and so to the borrow of the tree.
        unsafe { self.0.map(|ptr| &*ptr.as_ptr()) }
    }
}

/// A sorted run of at most `max_node_elements` values and the subtrees between them.
pub(crate) struct Node<T> {
    pub(crate) elements: Vec<Element<T>>,
    pub(crate) parent: Link<T>,
}

impl<T> Node<T> {
    fn new_boxed(parent: Link<T>) -> NonNull<Self> {
        NonNull::from(Box::leak(Box::new(Node {
            elements: Vec::new(),
            parent,
        })))
    }

    /// `Ok` with the position of an equal value, or `Err` with the position of the first larger
    /// one (`elements.len()` if there is none).
    fn search(&self, value: &T) -> std::result::Result<usize, usize>
    where
        T: Ord,
    {
        self.elements.binary_search_by(|e| e.value.cmp(value))
    }

    /// Position of the first value not less than `value`.
    pub(crate) fn lower_bound(&self, value: &T) -> usize
    where
        T: Ord,
    {
        self.elements.partition_point(|e| e.value < *value)
    }

    /// Position of the first value greater than `value`.
    pub(crate) fn upper_bound(&self, value: &T) -> usize
    where
        T: Ord,
    {
        self.elements.partition_point(|e| e.value <= *value)
    }

    /// The child holding values that would be inserted at `pos`.
    fn child(&self, pos: usize) -> Link<T> {
        match self.elements.get(pos) {
            Some(element) => element.left,
            None => self.elements.last().map_or(Link(None), |last| last.right),
        }
    }

    /// Mutable version of [`Node::child`]. Only valid on non-empty nodes.
    fn child_slot_mut(&mut self, pos: usize) -> &mut Link<T> {
        let last = self.elements.len() - 1;
        if pos > last {
            &mut self.elements[last].right
        } else {
            &mut self.elements[pos].left
        }
    }
}

/// A stored value. `left` holds everything between the previous value of the node and this one;
/// `right` is only ever set on the last element of a node and holds everything above it.
pub(crate) struct Element<T> {
    pub(crate) value: T,
    pub(crate) left: Link<T>,
    pub(crate) right: Link<T>,
}

impl<T> Element<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            left: Link(None),
            right: Link(None),
        }
    }
}

#[cfg(test)]
impl<T> Tree<T>
where
    T: Ord + fmt::Debug,
{
    /// Walks every node and asserts the structural invariants of the tree:
    ///
    /// 1. Values in a node strictly increase and never exceed `max_node_elements`.
    /// 2. Every subtree's values lie strictly between the values bracketing its link.
    /// 3. Only the last element of a node has a `right` child.
    /// 4. Every child's parent pointer is the node holding its link.
    /// 5. Only full nodes have children, and only the root may be empty.
    /// 6. `len` counts every value.
    pub(crate) fn assert_invariants(&self) {
        let mut count = 0;
        // (node, expected parent, exclusive lower bound, exclusive upper bound)
        let mut pending = vec![(self.root, None, None::<&T>, None::<&T>)];

        while let Some((ptr, parent, low, high)) = pending.pop() {
            let node = unsafe { &*ptr.as_ptr() };
            assert_eq!(node.parent.0, parent, "parent pointer is stale");
            assert!(node.elements.len() <= self.max_elements);
            if parent.is_some() {
                assert!(!node.elements.is_empty(), "non-root node is empty");
            }

            let values: Vec<&T> = node.elements.iter().map(|e| &e.value).collect();
            assert!(values.windows(2).all(|w| w[0] < w[1]), "{:?}", values);
            if let (Some(low), Some(first)) = (low, values.first()) {
                assert!(low < *first, "{:?} escapes lower bound {:?}", values, low);
            }
            if let (Some(high), Some(last)) = (high, values.last()) {
                assert!(*last < high, "{:?} escapes upper bound {:?}", values, high);
            }

            let has_children = node
                .elements
                .iter()
                .any(|e| e.left.0.is_some() || e.right.0.is_some());
            if has_children {
                assert_eq!(node.elements.len(), self.max_elements, "partial node has children");
            }

            let last = node.elements.len().saturating_sub(1);
            for (i, element) in node.elements.iter().enumerate() {
                if i != last {
                    assert!(element.right.0.is_none(), "non-final element has a right child");
                }
                let below = if i == 0 { low } else { Some(&node.elements[i - 1].value) };
                if let Some(left) = element.left.0 {
                    pending.push((left, Some(ptr), below, Some(&element.value)));
                }
                if let Some(right) = element.right.0 {
                    pending.push((right, Some(ptr), Some(&element.value), high));
                }
            }
            count += node.elements.len();
        }

        assert_eq!(count, self.len);
    }
}


#[cfg(test)]
mod quicktests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::test::quick::{max_node_elements, Op};

    /// Applies a set of operations to a tree and a `BTreeSet`, checking that every insert and
    /// find agrees with the set along the way.
    fn do_ops<T>(ops: &[Op<T>], tree: &mut Tree<T>, set: &mut BTreeSet<T>) -> bool
    where
        T: Ord + Clone + fmt::Debug,
    {
        for op in ops {
            let agrees = match op {
                Op::Insert(value) => {
                    let (cursor, inserted) = tree.insert(value.clone());
                    cursor.get() == Some(value) && inserted == set.insert(value.clone())
                }
                Op::Find(value) => tree.find(value).get() == set.get(value),
                Op::Iter => tree.iter().eq(set.iter()),
            };
            if !agrees {
                return false;
            }
        }

        tree.assert_invariants();
        tree.len() == set.len()
    }

    quickcheck::quickcheck! {
        fn fuzz_multiple_operations_i8(ops: Vec<Op<i8>>, width: u8) -> bool {
            let mut tree = Tree::new(max_node_elements(width)).unwrap();
            let mut set = BTreeSet::new();

            do_ops(&ops, &mut tree, &mut set)
        }
    }

    quickcheck::quickcheck! {
        fn clone_keeps_invariants(xs: Vec<i16>, width: u8) -> bool {
            let mut tree = Tree::new(max_node_elements(width)).unwrap();
            tree.extend(xs);

            let copy = tree.clone();
            copy.assert_invariants();
            copy.to_string() == tree.to_string() && copy.iter().eq(tree.iter())
        }
    }
}
