/// One range-query hit: a stored point, its distance to the query, and the
/// depth of the node holding it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeMatch<'a, T, F> {
    pub point: &'a T,
    pub distance: F,
    pub depth: usize,
}

/// Work done by a range query so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Nodes (leaves and internal) the query has entered.
    pub nodes_visited: usize,
    /// Calls made to the distance function.
    pub distance_computations: usize,
}

/// Radii that admit nothing, so the query can skip the tree entirely.
pub(crate) fn is_empty_radius<F: crate::metric::Scalar>(radius: F) -> bool {
    radius.is_nan() || radius < F::zero()
}
