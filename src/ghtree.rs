//! Generalized-hyperplane trees.
//!
//! Each internal node holds two random pivots and sends every remaining
//! point to the side of the pivot it is closer to, ties going left.
use std::fmt::{self, Debug, Write};
use std::mem;

use rand::Rng;
use tracing::{debug, trace};

use crate::config::{PivotRemoval, TreeConfig};
use crate::error::BuildError;
use crate::metric::{check_distance, check_sample, Metric, Scalar};
use crate::pivot::{partition, take_pivot_pair};
use crate::query::{is_empty_radius, QueryStats, RangeMatch};
use crate::table::{PivotTable, TableScan};

pub struct GhSplit<T> {
    first: T,
    second: T,
    left: GhNode<T>,
    right: GhNode<T>,
    depth: usize,
}

impl<T> GhSplit<T> {
    /// Pivot owning the left half-space.
    pub fn first(&self) -> &T {
        &self.first
    }

    /// Pivot owning the right half-space.
    pub fn second(&self) -> &T {
        &self.second
    }

    pub fn left(&self) -> &GhNode<T> {
        &self.left
    }

    pub fn right(&self) -> &GhNode<T> {
        &self.right
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

// Children are left out: ties can make a tree as deep as it is long.
impl<T: Debug> Debug for GhSplit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GhSplit")
            .field("first", &self.first)
            .field("second", &self.second)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl<T> Drop for GhSplit<T> {
    fn drop(&mut self) {
        let mut stack = vec![take(&mut self.left), take(&mut self.right)];
        while let Some(node) = stack.pop() {
            if let GhNode::Internal(mut split) = node {
                stack.push(take(&mut split.left));
                stack.push(take(&mut split.right));
            }
        }
    }
}

fn take<T>(node: &mut GhNode<T>) -> GhNode<T> {
    mem::replace(node, GhNode::Leaf(PivotTable::new(Vec::new(), 0)))
}

#[derive(Debug)]
pub enum GhNode<T> {
    Leaf(PivotTable<T>),
    Internal(Box<GhSplit<T>>),
}

impl<T> GhNode<T> {
    pub fn depth(&self) -> usize {
        match self {
            GhNode::Leaf(table) => table.depth(),
            GhNode::Internal(split) => split.depth,
        }
    }

    /// Lazily yield every point within `radius` of `query` under this node.
    ///
    /// Hits borrow from the tree only, so they outlive `query` and `metric`.
    pub fn range_query<'t, 'q, F, M>(
        &'t self,
        query: &'q T,
        radius: F,
        metric: &'q M,
    ) -> GhRangeQuery<'t, 'q, T, F, M>
    where
        F: Scalar,
        M: Metric<T, F>,
    {
        let stack = if is_empty_radius(radius) {
            Vec::new()
        } else {
            vec![Step::Search(self)]
        };
        GhRangeQuery {
            query,
            radius,
            metric,
            stack,
            scan: None,
            stats: QueryStats::default(),
        }
    }
}

enum Task<T> {
    /// Points still to be placed under a node at this depth.
    Build(Vec<T>, usize),
    /// Both children are finished; join them under the two pivots.
    Join(T, T, usize),
}

/// Builds bottom-up from an explicit task stack, like the VP builder.
fn build_root<T, F, M, R>(
    points: Vec<T>,
    metric: &M,
    max_leaf_size: usize,
    removal: PivotRemoval,
    rng: &mut R,
) -> Result<GhNode<T>, BuildError>
where
    T: PartialEq,
    F: Scalar,
    M: Metric<T, F>,
    R: Rng,
{
    let mut tasks = vec![Task::Build(points, 0)];
    let mut done: Vec<GhNode<T>> = Vec::new();
    while let Some(task) = tasks.pop() {
        match task {
            // max_leaf_size >= 1, so a split always has two points to pick from
            Task::Build(data, depth) if data.len() <= max_leaf_size => {
                done.push(GhNode::Leaf(PivotTable::new(data, depth)));
            }
            Task::Build(data, depth) => {
                let (first, second, rest) = take_pivot_pair(data, removal, rng);
                let mut closer_to_first = Vec::with_capacity(rest.len());
                for p in &rest {
                    let d1 = check_distance(metric.distance(p, &first))?;
                    let d2 = check_distance(metric.distance(p, &second))?;
                    closer_to_first.push(d1 <= d2);
                }
                let (left, right) = partition(rest, |i, _| closer_to_first[i]);
                trace!(depth = depth, left = left.len(), right = right.len(), "gh split");

                tasks.push(Task::Join(first, second, depth));
                tasks.push(Task::Build(right, depth + 1));
                tasks.push(Task::Build(left, depth + 1));
            }
            Task::Join(first, second, depth) => {
                let right = done.pop().expect("right child finished before join");
                let left = done.pop().expect("left child finished before join");
                done.push(GhNode::Internal(Box::new(GhSplit {
                    first,
                    second,
                    left,
                    right,
                    depth,
                })));
            }
        }
    }
    Ok(done.pop().expect("root finished"))
}

/// A generalized-hyperplane tree owning all of its points. Immutable once
/// built.
#[derive(Debug)]
pub struct GhTree<T> {
    root: GhNode<T>,
    len: usize,
}

impl<T: PartialEq> GhTree<T> {
    /// Build a tree over `points`.
    ///
    /// An empty input gives a tree with a single empty leaf.
    pub fn build<F, M>(
        points: Vec<T>,
        metric: &M,
        config: &TreeConfig,
    ) -> Result<GhTree<T>, BuildError>
    where
        F: Scalar,
        M: Metric<T, F>,
    {
        config.validate()?;
        let mut rng = config.rng();
        check_sample(&points, metric, config.checks(), &mut rng)?;

        let n = points.len();
        let root = build_root(
            points,
            metric,
            config.leaf_size(),
            config.removal(),
            &mut rng,
        )?;
        let tree = GhTree {
            len: count(&root),
            root,
        };
        debug!(
            input = n,
            stored = tree.len,
            leaves = tree.leaf_count(),
            height = tree.height(),
            "built gh tree"
        );
        Ok(tree)
    }
}

impl<T> GhTree<T> {
    pub fn root(&self) -> &GhNode<T> {
        &self.root
    }

    /// Number of points stored, pivots included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn height(&self) -> usize {
        nodes(&self.root).map(GhNode::depth).max().unwrap_or(0)
    }

    pub fn leaf_count(&self) -> usize {
        nodes(&self.root)
            .filter(|n| matches!(n, GhNode::Leaf(_)))
            .count()
    }

    /// Every stored point with the depth of the node holding it.
    pub fn points(&self) -> impl Iterator<Item = (&T, usize)> + '_ {
        nodes(&self.root).flat_map(|node| {
            let depth = node.depth();
            let empty: &[T] = &[];
            let (pivots, table) = match node {
                GhNode::Leaf(table) => (None, table.points()),
                GhNode::Internal(split) => (Some([&split.first, &split.second]), empty),
            };
            pivots
                .into_iter()
                .flatten()
                .chain(table.iter())
                .map(move |p| (p, depth))
        })
    }

    /// Lazily yield every point within `radius` of `query`.
    pub fn range_query<'t, 'q, F, M>(
        &'t self,
        query: &'q T,
        radius: F,
        metric: &'q M,
    ) -> GhRangeQuery<'t, 'q, T, F, M>
    where
        F: Scalar,
        M: Metric<T, F>,
    {
        self.root.range_query(query, radius, metric)
    }
}

impl<T: Debug> GhTree<T> {
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for node in nodes(&self.root) {
            let indent = "  ".repeat(node.depth());
            match node {
                GhNode::Leaf(table) => {
                    let _ = writeln!(out, "{}leaf {:?}", indent, table.points());
                }
                GhNode::Internal(split) => {
                    let _ = writeln!(out, "{}gh {:?} | {:?}", indent, split.first, split.second);
                }
            }
        }
        out
    }
}

fn nodes<T>(root: &GhNode<T>) -> impl Iterator<Item = &GhNode<T>> + '_ {
    let mut stack = vec![root];
    std::iter::from_fn(move || {
        let node = stack.pop()?;
        if let GhNode::Internal(split) = node {
            stack.push(&split.right);
            stack.push(&split.left);
        }
        Some(node)
    })
}

fn count<T>(root: &GhNode<T>) -> usize {
    nodes(root)
        .map(|n| match n {
            GhNode::Leaf(table) => table.len(),
            GhNode::Internal(_) => 2,
        })
        .sum()
}

enum Step<'a, T, F> {
    Search(&'a GhNode<T>),
    /// A pivot hit waiting for its turn.
    Hit(RangeMatch<'a, T, F>),
}

/// Lazy range query over a [`GhTree`]. Yields hits depth-first, both pivots
/// before children, left before right.
pub struct GhRangeQuery<'t, 'q, T, F, M> {
    query: &'q T,
    radius: F,
    metric: &'q M,
    stack: Vec<Step<'t, T, F>>,
    scan: Option<TableScan<'t, T>>,
    stats: QueryStats,
}

impl<'t, 'q, T, F, M> GhRangeQuery<'t, 'q, T, F, M> {
    pub fn stats(&self) -> QueryStats {
        self.stats
    }
}

impl<'t, 'q, T, F, M> Iterator for GhRangeQuery<'t, 'q, T, F, M>
where
    F: Scalar,
    M: Metric<T, F>,
{
    type Item = RangeMatch<'t, T, F>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(scan) = self.scan.as_mut() {
                let hit = scan.next_match(self.query, self.radius, self.metric, &mut self.stats);
                if hit.is_some() {
                    return hit;
                }
                self.scan = None;
            }

            let split = match self.stack.pop()? {
                Step::Hit(hit) => return Some(hit),
                Step::Search(GhNode::Leaf(table)) => {
                    self.stats.nodes_visited += 1;
                    self.scan = Some(table.scan(true));
                    continue;
                }
                Step::Search(GhNode::Internal(split)) => split,
            };
            self.stats.nodes_visited += 1;

            let d1 = self.metric.distance(self.query, &split.first);
            let d2 = self.metric.distance(self.query, &split.second);
            self.stats.distance_computations += 2;
            let r = self.radius;
            let two_r = r + r;

            // the right-hand test is strict, the left-hand one is not
            if d2 - d1 < two_r {
                self.stack.push(Step::Search(&split.right));
            }
            if d1 - d2 <= two_r {
                self.stack.push(Step::Search(&split.left));
            }

            let first = RangeMatch {
                point: &split.first,
                distance: d1,
                depth: split.depth,
            };
            let second = RangeMatch {
                point: &split.second,
                distance: d2,
                depth: split.depth,
            };
            match (d1 <= r, d2 <= r) {
                (true, true) => {
                    self.stack.push(Step::Hit(second));
                    return Some(first);
                }
                (true, false) => return Some(first),
                (false, true) => return Some(second),
                (false, false) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abs(a: &f64, b: &f64) -> f64 {
        (a - b).abs()
    }

    fn line(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn small_input_is_one_leaf() {
        let tree = GhTree::build(line(10), &abs, &TreeConfig::new().seed(1)).unwrap();
        assert!(matches!(tree.root(), GhNode::Leaf(_)));
        assert_eq!(tree.len(), 10);
    }

    #[test]
    fn one_point_leaves_still_split() {
        let config = TreeConfig::new().max_leaf_size(1).seed(2);
        let tree = GhTree::build(line(3), &abs, &config).unwrap();
        match tree.root() {
            GhNode::Internal(split) => {
                assert_ne!(split.first(), split.second());
                assert_eq!(split.left().depth(), 1);
            }
            GhNode::Leaf(_) => panic!("expected a split"),
        }
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn both_pivots_reported() {
        let config = TreeConfig::new().max_leaf_size(1).seed(3);
        let tree = GhTree::build(line(3), &abs, &config).unwrap();
        let mut hits: Vec<f64> = tree.range_query(&1.0, 1.0, &abs).map(|m| *m.point).collect();
        hits.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(hits, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn pivots_come_before_children() {
        let config = TreeConfig::new().max_leaf_size(2).seed(4);
        let tree = GhTree::build(line(64), &abs, &config).unwrap();
        let hits: Vec<_> = tree.range_query(&30.0, 100.0, &abs).collect();
        assert_eq!(hits.len(), 64);
        // full traversal order matches the stored order
        let stored: Vec<_> = tree.points().map(|(p, d)| (*p, d)).collect();
        let found: Vec<_> = hits.iter().map(|m| (*m.point, m.depth)).collect();
        assert_eq!(found, stored);
    }

    fn discrete(a: &u8, b: &u8) -> f64 {
        if a == b {
            0.0
        } else {
            1.0
        }
    }

    #[test]
    fn point_tied_between_pivots_found_at_zero_radius() {
        // with three points any pivot pair leaves the third tied between them
        for seed in 0..8 {
            let config = TreeConfig::new().max_leaf_size(1).seed(seed);
            let tree = GhTree::build(vec![0u8, 1, 2], &discrete, &config).unwrap();
            let tied = match tree.root() {
                GhNode::Internal(split) => match (split.left(), split.right()) {
                    (GhNode::Leaf(left), GhNode::Leaf(right)) => {
                        assert!(right.is_empty());
                        left.points()[0]
                    }
                    _ => panic!("expected two leaves"),
                },
                GhNode::Leaf(_) => panic!("expected a split"),
            };
            for q in 0..3u8 {
                let hits: Vec<u8> = tree
                    .range_query(&q, 0.0, &discrete)
                    .map(|m| *m.point)
                    .collect();
                assert_eq!(hits, vec![q], "seed {} tied {}", seed, tied);
            }
        }
    }

    #[test]
    fn negative_radius_is_empty() {
        let tree = GhTree::build(line(50), &abs, &TreeConfig::new().seed(5)).unwrap();
        assert_eq!(tree.range_query(&3.0, -0.5, &abs).count(), 0);
    }

    #[test]
    fn duplicates_terminate() {
        let tree = GhTree::build(vec![2.0; 300], &abs, &TreeConfig::new().seed(6)).unwrap();
        assert_eq!(tree.len(), 2);

        let config = TreeConfig::new()
            .seed(6)
            .pivot_removal(PivotRemoval::SampledOnly);
        let tree = GhTree::build(vec![2.0; 300], &abs, &config).unwrap();
        assert_eq!(tree.len(), 300);
        assert_eq!(tree.range_query(&2.0, 0.0, &abs).count(), 300);
    }

    #[test]
    fn dump_lists_every_node() {
        let config = TreeConfig::new().max_leaf_size(4).seed(7);
        let tree = GhTree::build(line(40), &abs, &config).unwrap();
        assert_eq!(tree.dump().lines().count(), nodes(tree.root()).count());
    }
}
