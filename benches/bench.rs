use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mwtree::Tree;

/// Returns how many values are needed to fill a binary tree with `num_levels` levels.
fn num_values_in_full_tree(num_levels: u32) -> usize {
    2usize.pow(num_levels) - 1
}

/// Builds a tree by inserting values midpoint first. Without this, ascending inserts would turn
/// narrow trees into one long chain of nodes.
fn get_balanced_tree(max_node_elements: usize, num_levels: u32) -> Tree<i32> {
    let mut tree = Tree::new(max_node_elements).expect("benchmark widths are non-zero");
    let xs = (0..).take(num_values_in_full_tree(num_levels)).collect::<Vec<_>>();
    fill_balanced_tree(&mut tree, &xs);
    tree
}

/// Recursive helper for [`get_balanced_tree`].
fn fill_balanced_tree(tree: &mut Tree<i32>, xs: &[i32]) {
    if !xs.is_empty() {
        let mid = xs.len() / 2;
        tree.insert(xs[mid]);
        fill_balanced_tree(tree, &xs[..mid]);
        fill_balanced_tree(tree, &xs[mid + 1..]);
    }
}

/// Helper to bench a function on a tree.
/// It creates a group for the given name and closure and runs it for various sizes and node
/// widths before finishing the group.
fn bench_helper(c: &mut Criterion, name: &str, f: impl Fn(&mut Tree<i32>, i32)) {
    let mut group = c.benchmark_group(name);

    for num_levels in [3, 7, 11, 15] {
        let largest_element_in_tree = num_values_in_full_tree(num_levels) as i32 - 1;

        for max_node_elements in [1, 4, 16, 40] {
            let tree = get_balanced_tree(max_node_elements, num_levels);
            let id = BenchmarkId::new(
                format!("width-{}", max_node_elements),
                largest_element_in_tree,
            );

            group.bench_function(id, |b| {
                b.iter_custom(|iters| {
                    let mut time = std::time::Duration::ZERO;
                    for _ in 0..iters {
                        let mut tree = black_box(tree.clone());
                        let instant = std::time::Instant::now();
                        f(&mut tree, black_box(largest_element_in_tree));
                        time += instant.elapsed();
                    }
                    time
                })
            });
        }
    }

    group.finish();
}

pub fn criterion_benchmark(c: &mut Criterion) {
    bench_helper(c, "find", |tree, i| {
        let _value = black_box(tree.find(&i).get());
    });

    bench_helper(c, "insert", |tree, i| {
        tree.insert(i + 1);
    });

    bench_helper(c, "find-miss", |tree, i| {
        let _value = black_box(tree.find(&(i + 1)).get());
    });

    bench_helper(c, "iter", |tree, _| {
        black_box(tree.iter().count());
    });

    bench_helper(c, "iter-rev", |tree, _| {
        black_box(tree.iter().rev().count());
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
