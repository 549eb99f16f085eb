//! Cursors over a [`Tree`]. A cursor is a node and a position within it, and nothing else: moving
//! it climbs back up through the parent pointers of the nodes rather than keeping a stack of the
//! path it came down.
//!
//! Every cursor rests on a value, or at the single end position one past the largest value. The
//! end position lives on the root, so a walk off the end of any leaf climbs all the way up to it.
//!
//! # Examples
//!
//! ```
//! use mwtree::btree::Tree;
//!
//! let mut tree = Tree::new(2).unwrap();
//! tree.extend([5, 3, 8, 1, 4, 9]);
//!
//! let mut cursor = tree.find(&4);
//! cursor.move_next();
//! assert_eq!(cursor.get(), Some(&5));
//!
//! cursor.move_prev();
//! cursor.move_prev();
//! assert_eq!(cursor.get(), Some(&3));
//!
//! let mut end = tree.end();
//! assert_eq!(end.get(), None);
//! end.move_prev();
//! assert_eq!(end.get(), Some(&9));
//! ```

use std::fmt;
use std::iter::FusedIterator;
use std::ptr::NonNull;

use crate::btree::{Node, Tree};
use crate::error::{Error, Result};

/// The position shared by [`Cursor`] and [`CursorMut`]: `pos` indexes `node`'s elements, or
/// equals the root's length for the end position.
pub(crate) struct RawCursor<T> {
    node: NonNull<Node<T>>,
    pos: usize,
}

impl<T> Clone for RawCursor<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node,
            pos: self.pos,
        }
    }
}
impl<T> Copy for RawCursor<T> {}

impl<T> PartialEq for RawCursor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.pos == other.pos
    }
}
impl<T> Eq for RawCursor<T> {}

/// The states a cursor passes through while it moves. A move starts in one of these and loops
/// until it reaches [`Step::Rest`].
enum Step<'a, T> {
    /// Heading for the smallest value of the subtree rooted here.
    DescendFront(NonNull<Node<T>>),
    /// Heading for the largest value of the subtree rooted here.
    DescendBack(NonNull<Node<T>>),
    /// Every value of this node's subtree that is greater than `departed` has been visited.
    AscendFront {
        node: NonNull<Node<T>>,
        departed: &'a T,
    },
    /// Every value of this node's subtree that is less than `departed` has been visited.
    AscendBack {
        node: NonNull<Node<T>>,
        departed: &'a T,
    },
    /// On a value (or the end position).
    Rest(RawCursor<T>),
}

impl<T> RawCursor<T> {
    pub(crate) fn new(node: NonNull<Node<T>>, pos: usize) -> Self {
        Self { node, pos }
    }

    /// The smallest value under `root`, or the end position if there is none.
    pub(crate) fn first(root: NonNull<Node<T>>) -> Self {
        let mut node = root;
        // SAFETY: See `RawCursor::node_ref`.
        while let Some(child) = unsafe { Self::node_ref(node) }
            .elements
            .first()
            .and_then(|e| e.left.0)
        {
            node = child;
        }
        Self::new(node, 0)
    }

    /// The position one past the last value. Only meaningful for the root.
    pub(crate) fn end(root: NonNull<Node<T>>) -> Self {
        // SAFETY: See `RawCursor::node_ref`.
        let len = unsafe { Self::node_ref(root) }.elements.len();
        Self::new(root, len)
    }

    /// # Safety
    ///
    /// `node` must belong to a live tree and the caller must not hold a `&mut` into that tree
    /// while the returned reference is in use. Cursors borrow their tree for as long as they live,
    /// which is what ties the otherwise unbounded lifetime down.
    unsafe fn node_ref<'a>(node: NonNull<Node<T>>) -> &'a Node<T> {
        &*node.as_ptr()
    }

    pub(crate) fn value<'a>(self) -> Option<&'a T> {
        // SAFETY: See `RawCursor::node_ref`.
        let node = unsafe { Self::node_ref(self.node) };
        node.elements.get(self.pos).map(|e| &e.value)
    }

    /// # Safety
    ///
    /// The caller must have unique access to the tree this cursor points into for as long as the
    /// returned reference lives.
    unsafe fn value_mut<'a>(self) -> Option<&'a mut T> {
        let node = &mut *self.node.as_ptr();
        node.elements.get_mut(self.pos).map(|e| &mut e.value)
    }

    /// The in-order successor, or `None` when already at the end.
    pub(crate) fn next(self) -> Option<Self>
    where
        T: Ord,
    {
        // SAFETY: See `RawCursor::node_ref`.
        let node = unsafe { Self::node_ref(self.node) };
        let len = node.elements.len();
        if self.pos >= len {
            return None;
        }

        let step = if self.pos + 1 < len {
            match node.elements[self.pos + 1].left.0 {
                Some(child) => Step::DescendFront(child),
                None => Step::Rest(Self::new(self.node, self.pos + 1)),
            }
        } else {
            match node.elements[self.pos].right.0 {
                Some(child) => Step::DescendFront(child),
                None => Step::AscendFront {
                    node: self.node,
                    departed: &node.elements[self.pos].value,
                },
            }
        };

        Self::settle(step)
    }

    /// The in-order predecessor, or `None` when already at the smallest value (or the tree is
    /// empty).
    pub(crate) fn prev(self) -> Option<Self>
    where
        T: Ord,
    {
        // SAFETY: See `RawCursor::node_ref`.
        let node = unsafe { Self::node_ref(self.node) };
        let step = match node.elements.get(self.pos) {
            // The end position: the largest value under the root.
            None if node.elements.is_empty() => return None,
            None => Step::DescendBack(self.node),
            Some(element) => match element.left.0 {
                Some(child) => Step::DescendBack(child),
                None if self.pos > 0 => Step::Rest(Self::new(self.node, self.pos - 1)),
                None => Step::AscendBack {
                    node: self.node,
                    departed: &element.value,
                },
            },
        };

        Self::settle(step)
    }

    /// Runs `step` until the cursor comes to rest. `None` means it climbed above the root while
    /// moving backwards.
    fn settle(mut step: Step<'_, T>) -> Option<Self>
    where
        T: Ord,
    {
        loop {
            step = match step {
                Step::Rest(cursor) => return Some(cursor),

                Step::DescendFront(ptr) => {
                    // SAFETY: See `RawCursor::node_ref`.
                    let node = unsafe { Self::node_ref(ptr) };
                    match node.elements.first().and_then(|e| e.left.0) {
                        Some(child) => Step::DescendFront(child),
                        None => Step::Rest(Self::new(ptr, 0)),
                    }
                }

                Step::DescendBack(ptr) => {
                    // SAFETY: See `RawCursor::node_ref`.
                    let node = unsafe { Self::node_ref(ptr) };
                    // Only the root is ever empty and it is never descended into from above.
                    let last = node.elements.len().checked_sub(1)?;
                    match node.elements[last].right.0 {
                        Some(child) => Step::DescendBack(child),
                        None => Step::Rest(Self::new(ptr, last)),
                    }
                }

                Step::AscendFront { node, departed } => {
                    // SAFETY: See `RawCursor::node_ref`.
                    match unsafe { Self::node_ref(node) }.parent.0 {
                        None => Step::Rest(Self::end(node)),
                        Some(parent) => {
                            // SAFETY: See `RawCursor::node_ref`.
                            let parent_node = unsafe { Self::node_ref(parent) };
                            let pos = parent_node.upper_bound(departed);
                            if pos < parent_node.elements.len() {
                                Step::Rest(Self::new(parent, pos))
                            } else {
                                Step::AscendFront {
                                    node: parent,
                                    departed,
                                }
                            }
                        }
                    }
                }

                Step::AscendBack { node, departed } => {
                    // SAFETY: See `RawCursor::node_ref`.
                    let parent = unsafe { Self::node_ref(node) }.parent.0?;
                    // SAFETY: See `RawCursor::node_ref`.
                    let parent_node = unsafe { Self::node_ref(parent) };
                    match parent_node.lower_bound(departed) {
                        0 => Step::AscendBack {
                            node: parent,
                            departed,
                        },
                        pos => Step::Rest(Self::new(parent, pos - 1)),
                    }
                }
            };
        }
    }
}

/// A read-only position in a [`Tree`]. Created by [`Tree::begin`], [`Tree::end`],
/// [`Tree::find`] and [`Tree::insert`].
///
/// Two cursors are equal when they sit on the same position of the same node. Cursors from
/// different trees never share a node so they are never equal, but comparing them is almost
/// certainly a bug.
pub struct Cursor<'a, T> {
    tree: &'a Tree<T>,
    raw: RawCursor<T>,
}

impl<'a, T> Clone for Cursor<'a, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            raw: self.raw,
        }
    }
}
impl<'a, T> Copy for Cursor<'a, T> {}

impl<'a, T> PartialEq for Cursor<'a, T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}
impl<'a, T> Eq for Cursor<'a, T> {}

impl<'a, T> fmt::Debug for Cursor<'a, T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get()).finish()
    }
}

impl<'a, T> Cursor<'a, T> {
    pub(crate) fn new(tree: &'a Tree<T>, raw: RawCursor<T>) -> Self {
        Self { tree, raw }
    }

    /// The value under the cursor, or `None` at the end position.
    pub fn get(&self) -> Option<&'a T> {
        self.raw.value()
    }

    /// Whether the cursor is one past the largest value.
    pub fn is_end(&self) -> bool {
        *self == self.tree.end()
    }

    /// Moves to the next larger value, or to the end position after the largest one.
    ///
    /// # Panics
    ///
    /// When the cursor is already at the end position.
    pub fn move_next(&mut self)
    where
        T: Ord,
    {
        match self.raw.next() {
            Some(raw) => self.raw = raw,
            None => panic!("cannot move a cursor past the end of the tree"),
        }
    }

    /// Moves to the next smaller value. Moving back from the end position lands on the largest
    /// value.
    ///
    /// # Panics
    ///
    /// When the cursor is on the smallest value, or the tree is empty.
    pub fn move_prev(&mut self)
    where
        T: Ord,
    {
        match self.raw.prev() {
            Some(raw) => self.raw = raw,
            None => panic!("cannot move a cursor before the start of the tree"),
        }
    }
}

/// A position in a [`Tree`] that may also replace the value under it. Created by
/// [`Tree::begin_mut`], [`Tree::end_mut`] and [`Tree::find_mut`].
pub struct CursorMut<'a, T> {
    tree: &'a mut Tree<T>,
    raw: RawCursor<T>,
}

impl<'a, T> fmt::Debug for CursorMut<'a, T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.get()).finish()
    }
}

impl<'a, T> CursorMut<'a, T> {
    pub(crate) fn new(tree: &'a mut Tree<T>, raw: RawCursor<T>) -> Self {
        Self { tree, raw }
    }

    /// The value under the cursor, or `None` at the end position.
    pub fn get(&self) -> Option<&T> {
        self.raw.value()
    }

    /// A read-only cursor at the same position, e.g. to compare against [`Tree::end`].
    pub fn as_cursor(&self) -> Cursor<'_, T> {
        Cursor::new(&*self.tree, self.raw)
    }

    /// Moves to the next larger value, or to the end position after the largest one.
    ///
    /// # Panics
    ///
    /// When the cursor is already at the end position.
    pub fn move_next(&mut self)
    where
        T: Ord,
    {
        match self.raw.next() {
            Some(raw) => self.raw = raw,
            None => panic!("cannot move a cursor past the end of the tree"),
        }
    }

    /// Moves to the next smaller value. Moving back from the end position lands on the largest
    /// value.
    ///
    /// # Panics
    ///
    /// When the cursor is on the smallest value, or the tree is empty.
    pub fn move_prev(&mut self)
    where
        T: Ord,
    {
        match self.raw.prev() {
            Some(raw) => self.raw = raw,
            None => panic!("cannot move a cursor before the start of the tree"),
        }
    }

    /// Replaces the value under the cursor and returns the old one. The new value must sort
    /// strictly between the values before and after the cursor so that the tree stays ordered.
    ///
    /// # Errors
    ///
    /// - [`Error::CursorAtEnd`] if the cursor is at the end position.
    /// - [`Error::OutOfOrder`] if `value` doesn't fit between its neighbours. The tree is left
    ///   unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use mwtree::{btree::Tree, Error};
    ///
    /// let mut tree = Tree::new(2).unwrap();
    /// tree.extend([10, 20, 30]);
    ///
    /// let mut cursor = tree.find_mut(&20);
    /// assert_eq!(cursor.replace(25), Ok(20));
    /// assert_eq!(cursor.replace(31), Err(Error::OutOfOrder));
    ///
    /// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [10, 25, 30]);
    /// ```
    pub fn replace(&mut self, value: T) -> Result<T>
    where
        T: Ord,
    {
        if self.raw.value().is_none() {
            return Err(Error::CursorAtEnd);
        }

        let above_prev = self
            .raw
            .prev()
            .and_then(RawCursor::value)
            .map_or(true, |prev| *prev < value);
        let below_next = self
            .raw
            .next()
            .and_then(RawCursor::value)
            .map_or(true, |next| value < *next);
        if !(above_prev && below_next) {
            return Err(Error::OutOfOrder);
        }

        // SAFETY: `self` holds the tree's only `&mut` borrow, and the slot is handed straight to
        // `mem::replace` without outliving this call.
        match unsafe { self.raw.value_mut() } {
            Some(slot) => Ok(std::mem::replace(slot, value)),
            None => Err(Error::CursorAtEnd),
        }
    }
}

/// An iterator over the values of a [`Tree`] in increasing order, created by [`Tree::iter`].
/// Iterating from the back yields decreasing order.
pub struct Iter<'a, T> {
    front: Cursor<'a, T>,
    back: Cursor<'a, T>,
    remaining: usize,
}

impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Self {
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, T> fmt::Debug for Iter<'a, T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("front", &self.front)
            .field("back", &self.back)
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(tree: &'a Tree<T>) -> Self {
        Self {
            front: tree.begin(),
            back: tree.end(),
            remaining: tree.len(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T>
where
    T: Ord,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let value = self.front.get();
        self.front.move_next();
        value
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T>
where
    T: Ord,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        self.back.move_prev();
        self.back.get()
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> where T: Ord {}

impl<'a, T> FusedIterator for Iter<'a, T> where T: Ord {}
