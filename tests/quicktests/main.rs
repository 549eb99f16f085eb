//! Property tests for the public `Tree` API, checked against `std::collections::BTreeSet`.

use quickcheck::{Arbitrary, Gen};

mod btree;

/// An enum for the kinds of "things" to do to a tree in a quicktest.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Op<T> {
    /// Insert the T into the data structure
    Insert(T),
    /// Look up the T in the data structure
    Find(T),
}

impl<T> Arbitrary for Op<T>
where
    T: Arbitrary,
{
    fn arbitrary(g: &mut Gen) -> Self {
        match g.choose(&[0, 0, 1]).unwrap() {
            0 => Op::Insert(T::arbitrary(g)),
            1 => Op::Find(T::arbitrary(g)),
            _ => unreachable!(),
        }
    }
}

/// Maps an arbitrary byte onto a node width between 1 and 8.
pub(crate) fn width(w: u8) -> usize {
    usize::from(w % 8) + 1
}
