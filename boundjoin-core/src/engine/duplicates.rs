//! Detection of taxa with identical distance rows.

use std::{
    collections::HashMap,
    hash::{DefaultHasher, Hash, Hasher},
};

use rayon::prelude::*;

use crate::Real;

/// Groups rows whose entries are all equal, in order of first appearance.
///
/// Rows are hashed in parallel and then compared exactly, so a hash collision
/// never merges distinct rows. Only groups with at least two members are
/// returned.
pub(super) fn identical_rows<'a, T, R>(row_count: usize, row: R) -> Vec<Vec<usize>>
where
    T: Real,
    R: Fn(usize) -> &'a [T] + Sync,
{
    let hashes: Vec<u64> = (0..row_count)
        .into_par_iter()
        .map(|index| row_hash(row(index)))
        .collect();

    let mut buckets: HashMap<u64, Vec<Vec<usize>>> = HashMap::new();
    let mut order: Vec<(u64, usize)> = Vec::new();
    for (index, hash) in hashes.into_iter().enumerate() {
        let classes = buckets.entry(hash).or_default();
        match classes
            .iter_mut()
            .find(|class| class.first().is_some_and(|&first| row(first) == row(index)))
        {
            Some(class) => class.push(index),
            None => {
                order.push((hash, classes.len()));
                classes.push(vec![index]);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|(hash, slot)| {
            let class = buckets.get_mut(&hash)?.get_mut(slot)?;
            (class.len() > 1).then(|| std::mem::take(class))
        })
        .collect()
}

fn row_hash<T: Real>(values: &[T]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for &value in values {
        // -0.0 and 0.0 compare equal, so they must hash alike.
        let canonical = if value == T::ZERO { T::ZERO } else { value };
        canonical.to_bits_u64().hash(&mut hasher);
    }
    hasher.finish()
}
