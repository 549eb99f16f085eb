//! This crate provides a multi-way search tree: an ordered set that stores several values per
//! node and walks them in order with a cursor that needs no stack.
//!
//! ## Multi-way search trees
//!
//! A Binary Search Tree stores one value per `Node` and splits the values below it into two
//! ordered subtrees. A multi-way tree stores up to `m` sorted values per `Node` and splits the
//! values below it into `m + 1` ordered subtrees: one between each pair of neighbouring values,
//! one below the smallest and one above the largest. The invariants are:
//!
//! 1. The values within a `Node` are strictly increasing.
//! 2. Every value in the subtree between two neighbouring values of a `Node` lies strictly
//!    between them (and likewise below the first and above the last value).
//!
//! Nodes here are never split, merged or rebalanced. A new value goes into the first node on its
//! search path with spare room, and a new child is only created below a full node. The height of
//! the tree therefore depends on the insertion order, just like an unbalanced BST, but wide
//! nodes keep it short.
//!
//! ## Cursors
//!
//! Each node knows its parent, so a [`Cursor`] only needs a node and a position in it. Moving
//! forwards or backwards descends into child subtrees or climbs back up through the parents, so
//! iteration uses no extra memory and no recursion no matter how deep the tree is.
//!
//! ```
//! use mwtree::Tree;
//!
//! # fn main() -> mwtree::Result<()> {
//! let mut tree = Tree::new(1)?;
//! for value in [10, 3, 11, 13, 100, 12, -20] {
//!     tree.insert(value);
//! }
//!
//! assert_eq!(tree.to_string(), "10 3 11 -20 13 12 100");
//! assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [-20, 3, 10, 11, 12, 13, 100]);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs, clippy::clone_on_ref_ptr)]

pub mod btree;
pub mod cursor;
pub mod error;

#[cfg(test)]
mod test;

pub use crate::btree::{Tree, DEFAULT_MAX_NODE_ELEMENTS};
pub use crate::cursor::{Cursor, CursorMut, Iter};
pub use crate::error::{Error, Result};
