//! Errors reported by [`Tree`][crate::btree::Tree] and its cursors.
//!
//! Lookups and insertions never fail: a missing value is reported by a cursor equal to
//! [`Tree::end`][crate::btree::Tree::end] and a duplicate insertion by the boolean returned
//! from [`Tree::insert`][crate::btree::Tree::insert]. The variants here cover invalid
//! configuration and edits that would break the ordering of the tree.

use thiserror::Error;

/// Errors that can occur when configuring or editing a tree.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A tree was configured with room for zero elements per node.
    #[error("a node must be able to hold at least one element")]
    ZeroCapacity,

    /// A replacement value does not fit between its neighbours.
    #[error("replacement value does not fit between its neighbours")]
    OutOfOrder,

    /// The cursor is past the last element and has nothing to edit.
    #[error("cursor is positioned at the end of the tree")]
    CursorAtEnd,
}

/// A `Result` alias using this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
