//! Performance benchmarks for trellis-core operations
//!
//! Run with: `cargo bench -p trellis-core`
//!
//! These benchmarks measure critical path performance:
//! - Structure predicate checks (interval math over element pairs)
//! - Criteria evaluation against the in-memory store
//! - Ordered walks through next()

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use trellis_core::models::{Element, ElementCriteria};
use trellis_core::store::{ElementSource, MemoryStore};
use tokio::runtime::Runtime;

/// Build a complete tree with nested-set coordinates, DFS numbered
///
/// A fanout of 4 and depth of 5 yields 341 elements.
fn build_tree(fanout: usize, depth: usize) -> Vec<Element> {
    let mut elements = Vec::new();
    let mut next = 1;
    build_subtree(fanout, depth, 1, &mut next, &mut elements);
    elements
}

fn build_subtree(
    fanout: usize,
    depth: usize,
    level: i64,
    next: &mut i64,
    out: &mut Vec<Element>,
) {
    let lft = *next;
    *next += 1;
    if depth > 1 {
        for _ in 0..fanout {
            build_subtree(fanout, depth - 1, level + 1, next, out);
        }
    }
    let rgt = *next;
    *next += 1;
    out.push(
        Element::new("entry".to_string())
            .with_id(format!("n{lft}"))
            .with_slug(format!("n{lft}"))
            .with_structure(1, lft, rgt, level),
    );
}

/// Seed a store with a full tree and return it alongside the elements
async fn seeded_env() -> (MemoryStore, Vec<Element>) {
    let elements = build_tree(4, 5);
    let store = MemoryStore::new();
    for element in &elements {
        store.add_element(element.clone()).await;
    }
    (store, elements)
}

fn at_level(elements: &[Element], level: i64) -> Element {
    elements
        .iter()
        .find(|element| element.level == Some(level))
        .unwrap()
        .clone()
}

/// Benchmark pair-wise structure predicates
///
/// Measures the pure interval math with no store involved. Each iteration
/// checks every ordered pair in a 341-element tree.
fn bench_structure_predicates(c: &mut Criterion) {
    let elements = build_tree(4, 5);

    c.bench_function("ancestor_checks_341_nodes", |b| {
        b.iter(|| {
            let mut ancestors = 0usize;
            for upper in &elements {
                for lower in &elements {
                    if upper.is_ancestor_of(lower) {
                        ancestors += 1;
                    }
                }
            }
            black_box(ancestors)
        });
    });

    c.bench_function("sibling_checks_341_nodes", |b| {
        b.iter(|| {
            let mut siblings = 0usize;
            for left in &elements {
                for right in &elements {
                    if left.is_sibling_of(right) {
                        siblings += 1;
                    }
                }
            }
            black_box(siblings)
        });
    });
}

/// Benchmark criteria evaluation over the in-memory store
///
/// The sibling query is the expensive one: candidates that are not adjacent
/// to the target need a scan for the shared parent.
fn bench_criteria_queries(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("criteria_queries");
    group.sample_size(30);

    group.bench_function("descendants_of_root", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let (store, elements) = seeded_env().await;
                let root = at_level(&elements, 1);
                let criteria = ElementCriteria::new("entry".to_string()).descendant_of(&root);

                let start = std::time::Instant::now();
                for _ in 0..iters {
                    black_box(store.find(&criteria).await.unwrap());
                }
                start.elapsed()
            })
        });
    });

    group.bench_function("siblings_of_leaf", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let (store, elements) = seeded_env().await;
                let leaf = at_level(&elements, 5);
                let criteria = ElementCriteria::new("entry".to_string()).sibling_of(&leaf);

                let start = std::time::Instant::now();
                for _ in 0..iters {
                    black_box(store.find(&criteria).await.unwrap());
                }
                start.elapsed()
            })
        });
    });

    group.finish();
}

/// Benchmark one ordered walk step
///
/// Each next() resolves the full id listing and then fetches the neighbor,
/// so this tracks the cost of the non-memoized walk contract.
fn bench_relative_walk(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    c.bench_function("next_within_children", |b| {
        b.iter_custom(|iters| {
            rt.block_on(async {
                let (store, elements) = seeded_env().await;
                let root = at_level(&elements, 1);
                let mut first_child = at_level(&elements, 2);
                let children = ElementCriteria::new("entry".to_string())
                    .descendant_of(&root)
                    .descendant_dist(1);

                let start = std::time::Instant::now();
                for _ in 0..iters {
                    black_box(
                        first_child
                            .next(Some(children.clone()), &store)
                            .await
                            .unwrap(),
                    );
                }
                start.elapsed()
            })
        });
    });
}

criterion_group!(
    benches,
    bench_structure_predicates,
    bench_criteria_queries,
    bench_relative_walk
);
criterion_main!(benches);
