use std::error::Error;
use std::fmt;

/// Reasons a tree build is refused.
///
/// Violations of the triangle inequality are not detected; they surface as
/// missing or extra query results.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// `max_leaf_size` was zero.
    InvalidLeafSize { max_leaf_size: usize },
    /// The metric returned a negative distance.
    NegativeDistance { distance: f64 },
    /// The metric returned NaN.
    NanDistance,
    /// `d(a, b)` and `d(b, a)` disagree for a sampled pair.
    AsymmetricMetric { forward: f64, backward: f64 },
    /// `d(a, a)` is not zero for a sampled point.
    NonZeroSelfDistance { distance: f64 },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::InvalidLeafSize { max_leaf_size } => {
                write!(f, "max_leaf_size must be at least 1, got {}", max_leaf_size)
            }
            BuildError::NegativeDistance { distance } => {
                write!(f, "distance function returned negative value {}", distance)
            }
            BuildError::NanDistance => write!(f, "distance function returned NaN"),
            BuildError::AsymmetricMetric { forward, backward } => write!(
                f,
                "distance function is not symmetric: d(a, b) = {}, d(b, a) = {}",
                forward, backward
            ),
            BuildError::NonZeroSelfDistance { distance } => {
                write!(f, "distance function gives d(a, a) = {}", distance)
            }
        }
    }
}

impl Error for BuildError {}
