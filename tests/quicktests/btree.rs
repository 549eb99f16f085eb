use mwtree::Tree;

use std::collections::{BTreeSet, HashSet};

use quickcheck_macros::quickcheck;

use crate::{width, Op};

/// Applies a set of operations to a tree and a set and reports whether every insert and find
/// agreed between the two.
fn do_ops<T>(ops: &[Op<T>], tree: &mut Tree<T>, set: &mut BTreeSet<T>) -> bool
where
    T: Ord + Clone,
{
    ops.iter().all(|op| match op {
        Op::Insert(x) => {
            let (cursor, inserted) = tree.insert(x.clone());
            cursor.get() == Some(x) && inserted == set.insert(x.clone())
        }
        Op::Find(x) => {
            let cursor = tree.find(x);
            match set.get(x) {
                Some(expected) => cursor.get() == Some(expected),
                None => cursor == tree.end(),
            }
        }
    })
}

fn tree_of(xs: &[i8], w: u8) -> Tree<i8> {
    let mut tree = Tree::new(width(w)).unwrap();
    tree.extend(xs.iter().copied());
    tree
}

#[quickcheck]
fn fuzz_multiple_operations_i8(ops: Vec<Op<i8>>, w: u8) -> bool {
    let mut tree = Tree::new(width(w)).unwrap();
    let mut set = BTreeSet::new();

    do_ops(&ops, &mut tree, &mut set) && tree.len() == set.len() && tree.iter().eq(set.iter())
}

#[quickcheck]
fn contains(xs: Vec<i8>, w: u8) -> bool {
    let tree = tree_of(&xs, w);

    xs.iter().all(|x| tree.find(x).get() == Some(x))
}

#[quickcheck]
fn contains_not(xs: Vec<i8>, nots: Vec<i8>, w: u8) -> bool {
    let tree = tree_of(&xs, w);
    let added: HashSet<_> = xs.into_iter().collect();
    let nots: HashSet<_> = nots.into_iter().collect();
    let mut nots = nots.difference(&added);

    nots.all(|x| tree.find(x) == tree.end() && !tree.contains(x))
}

#[quickcheck]
fn sorted_both_ways(xs: Vec<i8>, w: u8) -> bool {
    let tree = tree_of(&xs, w);
    let expected: BTreeSet<_> = xs.iter().collect();

    tree.iter().eq(expected.iter().copied()) && tree.iter().rev().eq(expected.iter().rev().copied())
}

#[quickcheck]
fn reinserting_changes_nothing(xs: Vec<i8>, w: u8) -> bool {
    let mut tree = tree_of(&xs, w);
    let before = tree.to_string();
    let len = tree.len();

    let all_rejected = xs.iter().all(|x| !tree.insert(*x).1);
    all_rejected && tree.len() == len && tree.to_string() == before
}

#[quickcheck]
fn prev_then_next_is_identity(xs: Vec<i8>, w: u8) -> bool {
    let tree = tree_of(&xs, w);
    if tree.is_empty() {
        return tree.begin() == tree.end();
    }

    let mut cursor = tree.end();
    cursor.move_prev();
    loop {
        let mut there_and_back = cursor;
        there_and_back.move_next();
        there_and_back.move_prev();
        if there_and_back != cursor {
            return false;
        }
        if cursor == tree.begin() {
            return true;
        }
        cursor.move_prev();
    }
}

#[quickcheck]
fn clone_and_move_render_the_same(xs: Vec<i8>, w: u8) -> bool {
    let tree = tree_of(&xs, w);
    let rendered = tree.to_string();

    let copy = tree.clone();
    let moved = tree;
    copy.to_string() == rendered && moved.to_string() == rendered && copy.iter().eq(moved.iter())
}
