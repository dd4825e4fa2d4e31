//! Pivot selection and partitioning shared by both tree builders.
use rand::seq::index;
use rand::Rng;

use crate::config::PivotRemoval;

/// Pick one pivot uniformly at random and take it out of `data`.
///
/// `data` must not be empty.
pub(crate) fn take_pivot<T, R>(mut data: Vec<T>, removal: PivotRemoval, rng: &mut R) -> (T, Vec<T>)
where
    T: PartialEq,
    R: Rng,
{
    let i = rng.gen_range(0..data.len());
    let pivot = data.swap_remove(i);
    if removal == PivotRemoval::AllEqual {
        data.retain(|p| *p != pivot);
    }
    (pivot, data)
}

/// Pick two pivots at distinct positions, uniformly without replacement,
/// and take them out of `data`.
///
/// `data` must hold at least two points.
pub(crate) fn take_pivot_pair<T, R>(
    mut data: Vec<T>,
    removal: PivotRemoval,
    rng: &mut R,
) -> (T, T, Vec<T>)
where
    T: PartialEq,
    R: Rng,
{
    let picked = index::sample(rng, data.len(), 2);
    let (i, j) = (picked.index(0), picked.index(1));

    // remove the larger index first so the smaller one stays valid
    let (first, second) = if i > j {
        let c1 = data.swap_remove(i);
        let c2 = data.swap_remove(j);
        (c1, c2)
    } else {
        let c2 = data.swap_remove(j);
        let c1 = data.swap_remove(i);
        (c1, c2)
    };

    if removal == PivotRemoval::AllEqual {
        data.retain(|p| *p != first && *p != second);
    }
    (first, second, data)
}

/// Split `data` into two fresh buckets in one pass: points for which
/// `goes_left` holds, and the rest. Relative order is kept.
pub(crate) fn partition<T, P>(data: Vec<T>, mut goes_left: P) -> (Vec<T>, Vec<T>)
where
    P: FnMut(usize, &T) -> bool,
{
    let mut left = Vec::with_capacity(data.len() / 2 + 1);
    let mut right = Vec::with_capacity(data.len() / 2 + 1);
    for (i, point) in data.into_iter().enumerate() {
        if goes_left(i, &point) {
            left.push(point);
        } else {
            right.push(point);
        }
    }
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn single_pivot_removes_duplicates() {
        let mut rng = StdRng::seed_from_u64(1);
        let (pivot, rest) = take_pivot(vec![5, 5, 5, 5], PivotRemoval::AllEqual, &mut rng);
        assert_eq!(pivot, 5);
        assert!(rest.is_empty());

        let (pivot, rest) = take_pivot(vec![5, 5, 5, 5], PivotRemoval::SampledOnly, &mut rng);
        assert_eq!(pivot, 5);
        assert_eq!(rest, vec![5, 5, 5]);
    }

    #[test]
    fn pivot_pair_is_two_positions() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            let data: Vec<u32> = (0..6).collect();
            let (c1, c2, rest) = take_pivot_pair(data, PivotRemoval::AllEqual, &mut rng);
            assert_ne!(c1, c2);
            assert_eq!(rest.len(), 4);
            assert!(!rest.contains(&c1) && !rest.contains(&c2));
        }
    }

    #[test]
    fn pivot_pair_of_duplicates() {
        let mut rng = StdRng::seed_from_u64(3);
        let (c1, c2, rest) = take_pivot_pair(vec![1, 1, 1, 2], PivotRemoval::SampledOnly, &mut rng);
        let mut all = rest.clone();
        all.push(c1);
        all.push(c2);
        all.sort();
        assert_eq!(all, vec![1, 1, 1, 2]);
    }

    #[test]
    fn partition_keeps_everything() {
        let (left, right) = partition((0..10).collect::<Vec<i32>>(), |_, x| x % 3 == 0);
        assert_eq!(left, vec![0, 3, 6, 9]);
        assert_eq!(right, vec![1, 2, 4, 5, 7, 8]);
    }
}
