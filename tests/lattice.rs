extern crate metric_trees;

use metric_trees::{GhTree, Metric, TreeConfig, VpTree};

#[derive(Debug, PartialEq, Clone)]
struct Point {
    x: f32,
    y: f32,
}

impl Point {
    fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

fn planar(p: &Point, q: &Point) -> f32 {
    let dx = p.x - q.x;
    let dy = p.y - q.y;
    (dx * dx + dy * dy).sqrt()
}

#[test]
fn point_check() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(1.0, 0.0);

    assert_eq!(planar.distance(&a, &b), 1.0);
}

fn lattice_points(n: usize) -> Vec<Point> {
    (0..n)
        .flat_map(|i| (0..n).map(move |j| Point::new(i as f32, j as f32)))
        .collect()
}

fn sorted(mut hits: Vec<(Point, f32)>) -> Vec<(f32, f32)> {
    hits.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    hits.into_iter().map(|(p, _)| (p.x, p.y)).collect()
}

#[test]
fn lattice_vp() {
    let tree = VpTree::build(lattice_points(20), &planar, &TreeConfig::new().seed(11)).unwrap();
    assert_eq!(tree.len(), 400);

    let target = Point::new(4.46, 4.4);
    let query = tree.range_query(&target, 1.0, &planar);
    let hits = sorted(query.map(|m| (m.point.clone(), m.distance)).collect());
    assert_eq!(hits, vec![(4.0, 4.0), (5.0, 4.0), (4.0, 5.0), (5.0, 5.0)]);
}

#[test]
fn lattice_gh() {
    let tree = GhTree::build(lattice_points(20), &planar, &TreeConfig::new().seed(12)).unwrap();
    assert_eq!(tree.len(), 400);

    let target = Point::new(4.46, 4.4);
    let query = tree.range_query(&target, 1.0, &planar);
    let hits = sorted(query.map(|m| (m.point.clone(), m.distance)).collect());
    assert_eq!(hits, vec![(4.0, 4.0), (5.0, 4.0), (4.0, 5.0), (5.0, 5.0)]);
}

#[test]
fn lattice_pruning_skips_work() {
    let center = Point::new(15.0, 15.0);
    let tree = VpTree::build(lattice_points(30), &planar, &TreeConfig::new().seed(13)).unwrap();
    let mut query = tree.range_query(&center, 1.0, &planar);
    assert_eq!(query.by_ref().count(), 5);
    println!("vp distance computations: {}", query.stats().distance_computations);
    assert!(query.stats().distance_computations < 900);

    let tree = GhTree::build(lattice_points(30), &planar, &TreeConfig::new().seed(13)).unwrap();
    let mut query = tree.range_query(&center, 1.0, &planar);
    assert_eq!(query.by_ref().count(), 5);
    println!("gh distance computations: {}", query.stats().distance_computations);
    assert!(query.stats().distance_computations < 900);
}

#[test]
fn boundary_points_included() {
    // every lattice neighbour sits exactly on the radius
    let tree = VpTree::build(lattice_points(10), &planar, &TreeConfig::new().max_leaf_size(2).seed(14)).unwrap();
    assert_eq!(tree.range_query(&Point::new(5.0, 5.0), 1.0, &planar).count(), 5);

    let tree = GhTree::build(lattice_points(10), &planar, &TreeConfig::new().max_leaf_size(2).seed(14)).unwrap();
    assert_eq!(tree.range_query(&Point::new(5.0, 5.0), 1.0, &planar).count(), 5);
}
