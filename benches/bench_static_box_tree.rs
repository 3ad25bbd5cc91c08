use criterion::{criterion_group, criterion_main, Bencher, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use static_box_tree::*;

use std::f64::consts::TAU;
const RADIUS: f64 = 100.0;
const QUERY_COUNT: usize = 100;

struct Point(f64, f64);

fn create_points_on_circle(count: usize) -> Vec<Point> {
    let mut result: Vec<Point> = Vec::with_capacity(count);

    for i in 0..count {
        let angle = (i as f64 / count as f64) * TAU;
        let x = RADIUS * angle.cos();
        let y = RADIUS * angle.sin();
        result.push(Point(x, y));
    }

    result
}

fn create_boxes_from_point_pairs(points: &[Point]) -> Vec<AABB<f64>> {
    let mut result: Vec<AABB<f64>> = Vec::with_capacity(points.len());
    let mut add_box = |pt1: &Point, pt2: &Point| {
        result.push(AABB::new(
            pt1.0.min(pt2.0),
            pt1.1.min(pt2.1),
            pt1.0.max(pt2.0),
            pt1.1.max(pt2.1),
        ));
    };
    for pts in points.windows(2) {
        add_box(&pts[0], &pts[1]);
    }
    // push last pair
    add_box(&points[points.len() - 1], &points[0]);
    result
}

fn tree_from_boxes(boxes: &[AABB<f64>]) -> StaticBoxTree<f64> {
    StaticBoxTree::from_boxes_with_rng(boxes, &mut StdRng::seed_from_u64(42))
}

fn create_tree_with_count(i: usize) -> StaticBoxTree<f64> {
    tree_from_boxes(&create_boxes_from_point_pairs(&create_points_on_circle(i)))
}

// query points at the lower corner of every step-th box so each query has at least one result
fn query_points(tree: &StaticBoxTree<f64>) -> Vec<[f64; 2]> {
    let step = Ord::max(tree.count() / QUERY_COUNT, 1);
    tree.nodes()
        .iter()
        .step_by(step)
        .map(|node| node.lower())
        .collect()
}

fn bench_create_tree(b: &mut Bencher, boxes: &[AABB<f64>]) {
    b.iter(|| tree_from_boxes(boxes))
}

fn create_tree_group(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_tree");
    let item_counts = [100, 1_000, 10_000, 100_000, 1_000_000];
    for i in item_counts {
        group.bench_with_input(BenchmarkId::new("from_boxes", i), &i, |b, i| {
            bench_create_tree(
                b,
                &create_boxes_from_point_pairs(&create_points_on_circle(*i)),
            )
        });
    }

    group.finish();
}

fn bench_visit_query(b: &mut Bencher, tree: &StaticBoxTree<f64>) {
    let mut query_results: Vec<usize> = Vec::new();
    let points = query_points(tree);
    b.iter(|| {
        for p in points.iter() {
            query_results.clear();
            tree.visit_query(p[0], p[1], &mut |index: usize| {
                query_results.push(index);
            });
        }
    })
}

fn bench_query_iter(b: &mut Bencher, tree: &StaticBoxTree<f64>) {
    let mut query_results: Vec<usize> = Vec::new();
    let points = query_points(tree);
    b.iter(|| {
        for p in points.iter() {
            query_results.clear();
            query_results.extend(tree.query_iter(p[0], p[1]));
        }
    })
}

fn bench_query_iter_reuse_stack(b: &mut Bencher, tree: &StaticBoxTree<f64>) {
    let mut query_results: Vec<usize> = Vec::new();
    let mut stack = Vec::with_capacity(3 * 16);
    let points = query_points(tree);
    b.iter(|| {
        for p in points.iter() {
            query_results.clear();
            query_results.extend(tree.query_iter_with_stack(p[0], p[1], &mut stack));
        }
    })
}

fn bench_visit_query_reuse_stack(b: &mut Bencher, tree: &StaticBoxTree<f64>) {
    let mut query_results: Vec<usize> = Vec::new();
    let mut stack = Vec::with_capacity(3 * 16);
    let points = query_points(tree);
    b.iter(|| {
        for p in points.iter() {
            query_results.clear();
            tree.visit_query_with_stack(
                p[0],
                p[1],
                &mut |index: usize| {
                    query_results.push(index);
                },
                &mut stack,
            );
        }
    })
}

fn query_tree_group(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_tree");
    let item_counts = [100, 1_000, 10_000, 100_000, 1_000_000];
    for i in item_counts {
        let tree = create_tree_with_count(i);
        group.bench_with_input(BenchmarkId::new("visit_query", i), &tree, |b, tree| {
            bench_visit_query(b, tree)
        });
        group.bench_with_input(BenchmarkId::new("query_iter", i), &tree, |b, tree| {
            bench_query_iter(b, tree)
        });
        group.bench_with_input(
            BenchmarkId::new("query_iter_reuse_stack", i),
            &tree,
            |b, tree| bench_query_iter_reuse_stack(b, tree),
        );
        group.bench_with_input(
            BenchmarkId::new("visit_query_reuse_stack", i),
            &tree,
            |b, tree| bench_visit_query_reuse_stack(b, tree),
        );
    }

    group.finish();
}

criterion_group!(create_tree, create_tree_group);
criterion_group!(query_tree, query_tree_group);
criterion_main!(create_tree, query_tree);
