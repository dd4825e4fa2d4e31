//! Range queries over arbitrary metric spaces.
//!
//! Two independent indexes are built over the same points: a
//! [vantage-point tree](VpTree) and a [generalized-hyperplane tree](GhTree).
//! Both only use the distance function and the triangle inequality to prune
//! subtrees, so any point type with a proper [`Metric`] works.
//!
//! ```
//! use metric_trees::{build_vp, query_vp, Euclidean};
//!
//! let points: Vec<[f64; 2]> = (0..100).map(|i| [(i % 10) as f64, (i / 10) as f64]).collect();
//! let tree = build_vp(points, &Euclidean, 10).unwrap();
//!
//! let hits: Vec<_> = query_vp(&tree, &[4.0, 4.0], 1.0, &Euclidean).collect();
//! assert_eq!(hits.len(), 5);
//! ```
extern crate num;
extern crate order_stat;
extern crate rand;
extern crate tracing;

pub mod config;
pub mod error;
pub mod ghtree;
pub mod median;
pub mod metric;
mod pivot;
pub mod query;
pub mod table;
pub mod vptree;

pub use config::{PivotRemoval, TreeConfig};
pub use error::BuildError;
pub use ghtree::{GhNode, GhRangeQuery, GhSplit, GhTree};
pub use median::median;
pub use metric::{edit_distance, EditDistance, Euclidean, Metric, Scalar};
pub use query::{QueryStats, RangeMatch};
pub use table::PivotTable;
pub use vptree::{VpNode, VpRangeQuery, VpSplit, VpTree};

/// Build a [`VpTree`] with default settings apart from the leaf size.
pub fn build_vp<T, F, M>(
    points: Vec<T>,
    metric: &M,
    max_leaf_size: usize,
) -> Result<VpTree<T, F>, BuildError>
where
    T: PartialEq,
    F: Scalar,
    M: Metric<T, F>,
{
    VpTree::build(points, metric, &TreeConfig::new().max_leaf_size(max_leaf_size))
}

/// Every point of `tree` within `radius` of `query`, with its distance and
/// the depth it was found at. A negative radius yields nothing.
pub fn query_vp<'t, 'q, T, F, M>(
    tree: &'t VpTree<T, F>,
    query: &'q T,
    radius: F,
    metric: &'q M,
) -> VpRangeQuery<'t, 'q, T, F, M>
where
    F: Scalar,
    M: Metric<T, F>,
{
    tree.range_query(query, radius, metric)
}

/// Build a [`GhTree`] with default settings apart from the leaf size.
pub fn build_gh<T, F, M>(
    points: Vec<T>,
    metric: &M,
    max_leaf_size: usize,
) -> Result<GhTree<T>, BuildError>
where
    T: PartialEq,
    F: Scalar,
    M: Metric<T, F>,
{
    GhTree::build(points, metric, &TreeConfig::new().max_leaf_size(max_leaf_size))
}

/// GH-tree counterpart of [`query_vp`].
pub fn query_gh<'t, 'q, T, F, M>(
    tree: &'t GhTree<T>,
    query: &'q T,
    radius: F,
    metric: &'q M,
) -> GhRangeQuery<'t, 'q, T, F, M>
where
    F: Scalar,
    M: Metric<T, F>,
{
    tree.range_query(query, radius, metric)
}
