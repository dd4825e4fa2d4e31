//! Distance functions over arbitrary point types.
//!
//! Both trees only ever talk to their points through a [`Metric`]. Pruning
//! relies on the triangle inequality holding exactly; a function that breaks
//! it silently produces wrong query results.
use std::fmt::{Debug, Display};

use rand::Rng;

pub use num::Float;

use crate::error::BuildError;

pub trait Scalar: Float + Debug + Display {}
impl<T: Float + Debug + Display> Scalar for T {}

/// A distance function `d(a, b)` over points of type `T`.
///
/// Implementations must satisfy `d(a, a) = 0`, `d(a, b) = d(b, a) >= 0` and
/// `d(a, c) <= d(a, b) + d(b, c)`.
pub trait Metric<T, F: Scalar> {
    fn distance(&self, a: &T, b: &T) -> F;
}

impl<T, F: Scalar, D> Metric<T, F> for D
where
    D: Fn(&T, &T) -> F,
{
    fn distance(&self, a: &T, b: &T) -> F {
        self(a, b)
    }
}

/// Euclidean norm of the difference of two fixed-length coordinate vectors.
///
/// Panics when the two points differ in dimension.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

fn euclidean<F: Scalar>(a: &[F], b: &[F]) -> F {
    assert_eq!(a.len(), b.len(), "points differ in dimension");
    a.iter()
        .zip(b.iter())
        .fold(F::zero(), |acc, (&x, &y)| acc + (x - y) * (x - y))
        .sqrt()
}

impl<F: Scalar> Metric<Vec<F>, F> for Euclidean {
    fn distance(&self, a: &Vec<F>, b: &Vec<F>) -> F {
        euclidean(a, b)
    }
}

impl<F: Scalar, const N: usize> Metric<[F; N], F> for Euclidean {
    fn distance(&self, a: &[F; N], b: &[F; N]) -> F {
        euclidean(a, b)
    }
}

/// Edit distance where a substitution costs as much as a deletion followed
/// by an insertion. See [`edit_distance`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EditDistance;

impl Metric<String, f64> for EditDistance {
    fn distance(&self, a: &String, b: &String) -> f64 {
        edit_distance(a, b) as f64
    }
}

impl<'s> Metric<&'s str, f64> for EditDistance {
    fn distance(&self, a: &&'s str, b: &&'s str) -> f64 {
        edit_distance(a, b) as f64
    }
}

/// Levenshtein distance over `char`s with insertion and deletion costing 1
/// and substitution costing 2.
///
/// With unit substitution the triangle inequality can fail on some inputs,
/// which breaks tree pruning.
///
/// ```
/// use metric_trees::edit_distance;
/// assert_eq!(edit_distance("kitten", "sitten"), 2);
/// assert_eq!(edit_distance("abc", "ab"), 1);
/// assert_eq!(edit_distance("", "abc"), 3);
/// ```
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // single rolling row of the DP table
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diag = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitute = diag + if ca == cb { 0 } else { 2 };
            let best = substitute.min(row[j] + 1).min(row[j + 1] + 1);
            diag = row[j + 1];
            row[j + 1] = best;
        }
    }
    row[b.len()]
}

/// Reject a distance value that can never come out of a metric.
pub(crate) fn check_distance<F: Scalar>(d: F) -> Result<F, BuildError> {
    if d.is_nan() {
        Err(BuildError::NanDistance)
    } else if d < F::zero() {
        Err(BuildError::NegativeDistance {
            distance: d.to_f64().unwrap_or(f64::NAN),
        })
    } else {
        Ok(d)
    }
}

/// Best-effort check of identity and symmetry on `samples` random pairs.
///
/// Passing says nothing about the triangle inequality.
pub(crate) fn check_sample<T, F, M, R>(
    points: &[T],
    metric: &M,
    samples: usize,
    rng: &mut R,
) -> Result<(), BuildError>
where
    F: Scalar,
    M: Metric<T, F>,
    R: Rng,
{
    if points.is_empty() {
        return Ok(());
    }
    let tolerance = F::epsilon().sqrt();
    for _ in 0..samples {
        let a = &points[rng.gen_range(0..points.len())];
        let b = &points[rng.gen_range(0..points.len())];

        let self_distance = check_distance(metric.distance(a, a))?;
        if self_distance > tolerance {
            return Err(BuildError::NonZeroSelfDistance {
                distance: self_distance.to_f64().unwrap_or(f64::NAN),
            });
        }

        let forward = check_distance(metric.distance(a, b))?;
        let backward = check_distance(metric.distance(b, a))?;
        if (forward - backward).abs() > tolerance * F::one().max(forward) {
            return Err(BuildError::AsymmetricMetric {
                forward: forward.to_f64().unwrap_or(f64::NAN),
                backward: backward.to_f64().unwrap_or(f64::NAN),
            });
        }
    }
    Ok(())
}
