use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::BuildError;

/// What to drop from the pool once a pivot has been picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotRemoval {
    /// Drop every point equal to the pivot. Duplicates of a pivot are stored
    /// once, as the pivot itself.
    AllEqual,
    /// Drop only the sampled instance. Duplicates stay in the tree.
    SampledOnly,
}

impl Default for PivotRemoval {
    fn default() -> Self {
        PivotRemoval::AllEqual
    }
}

/// Construction parameters shared by both tree kinds.
///
/// ```
/// use metric_trees::{PivotRemoval, TreeConfig};
/// let config = TreeConfig::new()
///     .max_leaf_size(4)
///     .seed(42)
///     .pivot_removal(PivotRemoval::SampledOnly);
/// assert_eq!(config.leaf_size(), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TreeConfig {
    max_leaf_size: usize,
    seed: Option<u64>,
    pivot_removal: PivotRemoval,
    metric_checks: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            max_leaf_size: 10,
            seed: None,
            pivot_removal: PivotRemoval::default(),
            metric_checks: 8,
        }
    }
}

impl TreeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest number of points a leaf may hold. Must be at least 1.
    pub fn max_leaf_size(mut self, max_leaf_size: usize) -> Self {
        self.max_leaf_size = max_leaf_size;
        self
    }

    /// Fix the pivot sampling seed so builds are reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn pivot_removal(mut self, pivot_removal: PivotRemoval) -> Self {
        self.pivot_removal = pivot_removal;
        self
    }

    /// Number of random point pairs checked for identity and symmetry
    /// before building. Zero turns the check off.
    pub fn metric_checks(mut self, metric_checks: usize) -> Self {
        self.metric_checks = metric_checks;
        self
    }

    pub fn leaf_size(&self) -> usize {
        self.max_leaf_size
    }

    pub fn removal(&self) -> PivotRemoval {
        self.pivot_removal
    }

    pub fn checks(&self) -> usize {
        self.metric_checks
    }

    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        if self.max_leaf_size == 0 {
            return Err(BuildError::InvalidLeafSize {
                max_leaf_size: self.max_leaf_size,
            });
        }
        Ok(())
    }

    pub(crate) fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
