//! Vantage-Point Trees are a data structure for fast range searches in
//! arbitrary metric spaces.
//!
//! Each internal node picks a random vantage point and splits the remaining
//! points at the median of their distances to it: the "inside ball" goes
//! left, the rest goes right.
use std::fmt::{self, Debug, Write};
use std::mem;

use rand::Rng;
use tracing::{debug, trace};

use crate::config::{PivotRemoval, TreeConfig};
use crate::error::BuildError;
use crate::median::median_by_key;
use crate::metric::{check_distance, check_sample, Metric, Scalar};
use crate::pivot::take_pivot;
use crate::query::{is_empty_radius, QueryStats, RangeMatch};
use crate::table::{PivotTable, TableScan};

/// Internal node of a VP tree.
pub struct VpSplit<T, F> {
    pivot: T,
    split_radius: F,
    left: VpNode<T, F>,
    right: VpNode<T, F>,
    depth: usize,
}

impl<T, F: Scalar> VpSplit<T, F> {
    pub fn pivot(&self) -> &T {
        &self.pivot
    }

    /// Median distance to the pivot. Points at or inside it are on the left.
    pub fn split_radius(&self) -> F {
        self.split_radius
    }

    pub fn left(&self) -> &VpNode<T, F> {
        &self.left
    }

    pub fn right(&self) -> &VpNode<T, F> {
        &self.right
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

// Children are left out: ties can make a tree as deep as it is long.
impl<T: Debug, F: Debug> Debug for VpSplit<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VpSplit")
            .field("pivot", &self.pivot)
            .field("split_radius", &self.split_radius)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl<T, F> Drop for VpSplit<T, F> {
    fn drop(&mut self) {
        let mut stack = vec![take(&mut self.left), take(&mut self.right)];
        while let Some(node) = stack.pop() {
            if let VpNode::Internal(mut split) = node {
                stack.push(take(&mut split.left));
                stack.push(take(&mut split.right));
            }
        }
    }
}

fn take<T, F>(node: &mut VpNode<T, F>) -> VpNode<T, F> {
    mem::replace(node, VpNode::Leaf(PivotTable::new(Vec::new(), 0)))
}

#[derive(Debug)]
pub enum VpNode<T, F> {
    Leaf(PivotTable<T>),
    Internal(Box<VpSplit<T, F>>),
}

impl<T, F: Scalar> VpNode<T, F> {
    pub fn depth(&self) -> usize {
        match self {
            VpNode::Leaf(table) => table.depth(),
            VpNode::Internal(split) => split.depth,
        }
    }

    /// Lazily yield every point within `radius` of `query` under this node.
    ///
    /// Hits borrow from the tree only, so they outlive `query` and `metric`.
    pub fn range_query<'t, 'q, M: Metric<T, F>>(
        &'t self,
        query: &'q T,
        radius: F,
        metric: &'q M,
    ) -> VpRangeQuery<'t, 'q, T, F, M> {
        let stack = if is_empty_radius(radius) {
            Vec::new()
        } else {
            vec![Step::Search(self)]
        };
        VpRangeQuery {
            query,
            radius,
            metric,
            stack,
            scan: None,
            stats: QueryStats::default(),
        }
    }
}

/// Node counts gathered while building, for logging.
#[derive(Default)]
struct Shape {
    leaves: usize,
    splits: usize,
    height: usize,
}

enum Task<T, F> {
    /// Points still to be placed under a node at this depth.
    Build(Vec<T>, usize),
    /// Both children are finished; join them under the pivot.
    Join(T, F, usize),
}

/// Builds bottom-up from an explicit task stack. Ties at the median can make
/// the tree O(n) deep, so nothing here recurses.
fn build_root<T, F, M, R>(
    points: Vec<T>,
    metric: &M,
    max_leaf_size: usize,
    removal: PivotRemoval,
    rng: &mut R,
    shape: &mut Shape,
) -> Result<VpNode<T, F>, BuildError>
where
    T: PartialEq,
    F: Scalar,
    M: Metric<T, F>,
    R: Rng,
{
    let mut tasks = vec![Task::Build(points, 0)];
    let mut done: Vec<VpNode<T, F>> = Vec::new();
    while let Some(task) = tasks.pop() {
        match task {
            Task::Build(data, depth) => {
                shape.height = shape.height.max(depth);
                if data.len() <= max_leaf_size {
                    shape.leaves += 1;
                    done.push(VpNode::Leaf(PivotTable::new(data, depth)));
                    continue;
                }
                shape.splits += 1;

                let (pivot, split_radius, left, right) = split(data, metric, removal, rng)?;
                trace!(
                    depth = depth,
                    left = left.len(),
                    right = right.len(),
                    split_radius = %split_radius,
                    "vp split"
                );
                // left is popped first, so right finishes on top of `done`
                tasks.push(Task::Join(pivot, split_radius, depth));
                tasks.push(Task::Build(right, depth + 1));
                tasks.push(Task::Build(left, depth + 1));
            }
            Task::Join(pivot, split_radius, depth) => {
                let right = done.pop().expect("right child finished before join");
                let left = done.pop().expect("left child finished before join");
                done.push(VpNode::Internal(Box::new(VpSplit {
                    pivot,
                    split_radius,
                    left,
                    right,
                    depth,
                })));
            }
        }
    }
    Ok(done.pop().expect("root finished"))
}

/// Take a random pivot out of `data` and split the rest at the median of
/// their distances to it.
fn split<T, F, M, R>(
    data: Vec<T>,
    metric: &M,
    removal: PivotRemoval,
    rng: &mut R,
) -> Result<(T, F, Vec<T>, Vec<T>), BuildError>
where
    T: PartialEq,
    F: Scalar,
    M: Metric<T, F>,
    R: Rng,
{
    let (pivot, rest) = take_pivot(data, removal, rng);
    let mut scored = rest
        .into_iter()
        .map(|p| {
            let d = check_distance(metric.distance(&p, &pivot))?;
            Ok((p, d))
        })
        .collect::<Result<Vec<(T, F)>, BuildError>>()?;

    // every point may have been a duplicate of the pivot
    let split_radius = median_by_key(&mut scored, |s| s.1).unwrap_or_else(F::zero);
    let mut left = Vec::with_capacity(scored.len() / 2 + 1);
    let mut right = Vec::with_capacity(scored.len() / 2 + 1);
    for (p, d) in scored {
        if d <= split_radius {
            left.push(p);
        } else {
            right.push(p);
        }
    }
    Ok((pivot, split_radius, left, right))
}

/// A vantage-point tree owning all of its points. Immutable once built.
#[derive(Debug)]
pub struct VpTree<T, F> {
    root: VpNode<T, F>,
    len: usize,
}

impl<T, F> VpTree<T, F>
where
    T: PartialEq,
    F: Scalar,
{
    /// Build a tree over `points`.
    ///
    /// An empty input gives a tree with a single empty leaf.
    pub fn build<M: Metric<T, F>>(
        points: Vec<T>,
        metric: &M,
        config: &TreeConfig,
    ) -> Result<VpTree<T, F>, BuildError> {
        config.validate()?;
        let mut rng = config.rng();
        check_sample(&points, metric, config.checks(), &mut rng)?;

        let n = points.len();
        let mut shape = Shape::default();
        let root = build_root(
            points,
            metric,
            config.leaf_size(),
            config.removal(),
            &mut rng,
            &mut shape,
        )?;
        let tree = VpTree {
            len: count(&root),
            root,
        };
        debug!(
            input = n,
            stored = tree.len,
            leaves = shape.leaves,
            splits = shape.splits,
            height = shape.height,
            "built vp tree"
        );
        Ok(tree)
    }
}

impl<T, F: Scalar> VpTree<T, F> {
    pub fn root(&self) -> &VpNode<T, F> {
        &self.root
    }

    /// Number of points stored, pivots included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Depth of the deepest node.
    pub fn height(&self) -> usize {
        nodes(&self.root).map(VpNode::depth).max().unwrap_or(0)
    }

    pub fn leaf_count(&self) -> usize {
        nodes(&self.root)
            .filter(|n| matches!(n, VpNode::Leaf(_)))
            .count()
    }

    /// Every stored point with the depth of the node holding it, pivot
    /// before children, left before right.
    pub fn points(&self) -> impl Iterator<Item = (&T, usize)> + '_ {
        let mut stack = vec![&self.root];
        let mut leaf: Option<(std::slice::Iter<'_, T>, usize)> = None;
        std::iter::from_fn(move || loop {
            if let Some((iter, depth)) = leaf.as_mut() {
                if let Some(p) = iter.next() {
                    return Some((p, *depth));
                }
                leaf = None;
            }
            match stack.pop()? {
                VpNode::Leaf(table) => leaf = Some((table.points().iter(), table.depth())),
                VpNode::Internal(split) => {
                    stack.push(&split.right);
                    stack.push(&split.left);
                    return Some((&split.pivot, split.depth));
                }
            }
        })
    }

    /// Lazily yield every point within `radius` of `query`.
    pub fn range_query<'t, 'q, M: Metric<T, F>>(
        &'t self,
        query: &'q T,
        radius: F,
        metric: &'q M,
    ) -> VpRangeQuery<'t, 'q, T, F, M> {
        self.root.range_query(query, radius, metric)
    }
}

impl<T: Debug, F: Scalar> VpTree<T, F> {
    /// Indented rendering of the tree, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            let indent = "  ".repeat(node.depth());
            match node {
                VpNode::Leaf(table) => {
                    let _ = writeln!(out, "{}leaf {:?}", indent, table.points());
                }
                VpNode::Internal(split) => {
                    let _ = writeln!(
                        out,
                        "{}vp {:?} mu={}",
                        indent, split.pivot, split.split_radius
                    );
                    stack.push(&split.right);
                    stack.push(&split.left);
                }
            }
        }
        out
    }
}

/// Depth-first walk over every node under `root`.
fn nodes<T, F>(root: &VpNode<T, F>) -> impl Iterator<Item = &VpNode<T, F>> + '_ {
    let mut stack = vec![root];
    std::iter::from_fn(move || {
        let node = stack.pop()?;
        if let VpNode::Internal(split) = node {
            stack.push(&split.right);
            stack.push(&split.left);
        }
        Some(node)
    })
}

fn count<T, F>(root: &VpNode<T, F>) -> usize {
    nodes(root)
        .map(|n| match n {
            VpNode::Leaf(table) => table.len(),
            VpNode::Internal(_) => 1,
        })
        .sum()
}

enum Step<'a, T, F> {
    /// Descend with pruning.
    Search(&'a VpNode<T, F>),
    /// Subtree lies inside the query ball; yield everything.
    Walk(&'a VpNode<T, F>),
}

/// Lazy range query over a [`VpTree`]. Yields hits depth-first, pivot before
/// children, left before right.
pub struct VpRangeQuery<'t, 'q, T, F, M> {
    query: &'q T,
    radius: F,
    metric: &'q M,
    stack: Vec<Step<'t, T, F>>,
    scan: Option<TableScan<'t, T>>,
    stats: QueryStats,
}

impl<'t, 'q, T, F, M> VpRangeQuery<'t, 'q, T, F, M> {
    pub fn stats(&self) -> QueryStats {
        self.stats
    }
}

impl<'t, 'q, T, F, M> Iterator for VpRangeQuery<'t, 'q, T, F, M>
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

            let step = self.stack.pop()?;
            self.stats.nodes_visited += 1;
            match step {
                Step::Search(VpNode::Leaf(table)) => self.scan = Some(table.scan(true)),
                Step::Walk(VpNode::Leaf(table)) => self.scan = Some(table.scan(false)),
                Step::Walk(VpNode::Internal(split)) => {
                    self.stack.push(Step::Walk(&split.right));
                    self.stack.push(Step::Walk(&split.left));
                    let distance = self.metric.distance(self.query, &split.pivot);
                    self.stats.distance_computations += 1;
                    return Some(RangeMatch {
                        point: &split.pivot,
                        distance,
                        depth: split.depth,
                    });
                }
                Step::Search(VpNode::Internal(split)) => {
                    let d = self.metric.distance(self.query, &split.pivot);
                    self.stats.distance_computations += 1;
                    let (r, mu) = (self.radius, split.split_radius);

                    // pushed in reverse of the order they are visited
                    if d + r > mu {
                        self.stack.push(Step::Search(&split.right));
                    }
                    if d + mu <= r {
                        self.stack.push(Step::Walk(&split.left));
                    } else if d - mu <= r {
                        self.stack.push(Step::Search(&split.left));
                    }

                    if d <= r {
                        return Some(RangeMatch {
                            point: &split.pivot,
                            distance: d,
                            depth: split.depth,
                        });
                    }
                }
            }
        }
    }
}
