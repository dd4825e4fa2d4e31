use std::slice;

use crate::metric::{Metric, Scalar};
use crate::query::{QueryStats, RangeMatch};

/// A leaf: a small bucket of points that is scanned linearly.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable<T> {
    points: Vec<T>,
    depth: usize,
}

impl<T> PivotTable<T> {
    pub fn new(points: Vec<T>, depth: usize) -> Self {
        PivotTable { points, depth }
    }

    pub fn points(&self) -> &[T] {
        &self.points
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Every point within `radius` of `query`, in storage order.
    pub fn range<'a, F, M>(
        &'a self,
        query: &'a T,
        radius: F,
        metric: &'a M,
    ) -> impl Iterator<Item = RangeMatch<'a, T, F>> + 'a
    where
        F: Scalar + 'a,
        M: Metric<T, F>,
    {
        let mut stats = QueryStats::default();
        let mut scan = self.scan(true);
        std::iter::from_fn(move || scan.next_match(query, radius, metric, &mut stats))
    }

    /// Resumable scan state for the tree iterators. With `filter` off every
    /// point matches.
    pub(crate) fn scan(&self, filter: bool) -> TableScan<'_, T> {
        TableScan {
            points: self.points.iter(),
            depth: self.depth,
            filter,
        }
    }
}

pub(crate) struct TableScan<'a, T> {
    points: slice::Iter<'a, T>,
    depth: usize,
    filter: bool,
}

impl<'a, T> TableScan<'a, T> {
    pub(crate) fn next_match<F, M>(
        &mut self,
        query: &T,
        radius: F,
        metric: &M,
        stats: &mut QueryStats,
    ) -> Option<RangeMatch<'a, T, F>>
    where
        F: Scalar,
        M: Metric<T, F>,
    {
        for point in &mut self.points {
            let distance = metric.distance(point, query);
            stats.distance_computations += 1;
            if !self.filter || distance <= radius {
                return Some(RangeMatch {
                    point,
                    distance,
                    depth: self.depth,
                });
            }
        }
        None
    }
}
