use std::cmp::Ordering;

use crate::metric::Scalar;

/// Compare two distances, treating incomparable values as equal.
///
/// Distances are validated before they reach here, so NaN never shows up.
fn cmp_distance<F: Scalar>(x: &F, y: &F) -> Ordering {
    x.partial_cmp(y).unwrap_or(Ordering::Equal)
}

/// Median of a list of distances. For an even number of values this is the
/// mean of the two middle values. Returns `None` for an empty list.
///
/// Reorders `values` in place.
///
/// ```
/// use metric_trees::median;
/// assert_eq!(median(&mut [3.0]), Some(3.0));
/// assert_eq!(median(&mut [2.0, 1.0, 3.0]), Some(2.0));
/// assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
/// assert_eq!(median::<f64>(&mut []), None);
/// ```
pub fn median<F: Scalar>(values: &mut [F]) -> Option<F> {
    median_by_key(values, |v| *v)
}

/// [`median`] of `key` over `items`, reordering the items themselves so
/// each keeps its payload.
///
/// ```
/// use metric_trees::median::median_by_key;
/// let mut scored = vec![("c", 3.0), ("a", 1.0), ("b", 2.0)];
/// assert_eq!(median_by_key(&mut scored, |s| s.1), Some(2.0));
/// ```
pub fn median_by_key<E, F, K>(items: &mut [E], key: K) -> Option<F>
where
    F: Scalar,
    K: Fn(&E) -> F,
{
    let n = items.len();
    if n == 0 {
        return None;
    }

    let k = n / 2;
    order_stat::kth_by(items, k, |a, b| cmp_distance(&key(a), &key(b)));
    let upper = key(&items[k]);
    if n % 2 == 1 {
        return Some(upper);
    }

    // after selection everything left of k is <= upper
    let lower = items[..k]
        .iter()
        .map(&key)
        .fold(F::neg_infinity(), |acc, x| acc.max(x));
    Some((lower + upper) / (F::one() + F::one()))
}

#[cfg(test)]
mod tests {
    use super::{median, median_by_key};

    #[test]
    fn test_median_odd() {
        for i in 0..11 {
            let mut v: Vec<f64> = vec![2.0, 0.0, 4.0, 6.0, 5.0, 1.0, 3.0, 9.0, 7.0, 8.0, 10.0];
            v.rotate_left(i);
            assert_eq!(median(&mut v), Some(5.0));
        }
    }

    #[test]
    fn test_median_even() {
        let mut v = vec![1.0f32, 1.0, 2.0, 8.0];
        assert_eq!(median(&mut v), Some(1.5));
    }

    #[test]
    fn test_median_ties() {
        let mut v = vec![2.0, 2.0, 2.0, 2.0, 2.0];
        assert_eq!(median(&mut v), Some(2.0));
    }

    #[test]
    fn test_median_by_key_keeps_payload() {
        let mut scored = vec![(10, 4.0), (11, 1.0), (12, 3.0), (13, 2.0)];
        assert_eq!(median_by_key(&mut scored, |s| s.1), Some(2.5));
        scored.sort_by_key(|s| s.0);
        assert_eq!(scored, vec![(10, 4.0), (11, 1.0), (12, 3.0), (13, 2.0)]);
    }
}
