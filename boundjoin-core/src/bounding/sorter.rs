//! The sorted distance rows (S) and their cluster index rows (I).
//!
//! Both live in contiguous arenas with one fixed-stride slot per engine row.
//! Each row holds the distances from its cluster to clusters with smaller
//! ids, sorted ascending by `(distance, cluster)`, followed by a sentinel of
//! positive infinity paired with the row's own cluster.

use std::cmp::Ordering;

use rayon::prelude::*;

use super::{bookkeeping::ClusterBook, pool::WorkerPool};
use crate::Real;

/// How a single row is sorted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SortMode {
    Sequential,
    Parallel,
}

#[derive(Clone, Debug)]
pub(crate) struct SortedRows<T> {
    stride: usize,
    values: Vec<T>,
    clusters: Vec<usize>,
    lengths: Vec<usize>,
}

impl<T: Real> SortedRows<T> {
    /// Allocates room for `rows` rows of up to `rows - 1` entries each.
    pub(crate) fn new(rows: usize) -> Self {
        let stride = rows.max(1);
        Self {
            stride,
            values: vec![T::INFINITY; stride * rows],
            clusters: vec![0; stride * rows],
            lengths: vec![0; rows],
        }
    }

    pub(crate) fn row_count(&self) -> usize {
        self.lengths.len()
    }

    /// Number of entries before the sentinel.
    pub(crate) fn len(&self, row: usize) -> usize {
        self.lengths[row]
    }

    /// Sorted distances of `row`, sentinel included.
    pub(crate) fn values(&self, row: usize) -> &[T] {
        let start = row * self.stride;
        &self.values[start..=start + self.lengths[row]]
    }

    /// Cluster ids matching [`SortedRows::values`], sentinel included.
    pub(crate) fn clusters(&self, row: usize) -> &[usize] {
        let start = row * self.stride;
        &self.clusters[start..=start + self.lengths[row]]
    }

    /// Rebuilds every row in parallel from the engine's distance rows.
    ///
    /// Row `r` keeps clusters with ids below its own, so each pair is stored
    /// exactly once, in the row of its larger cluster.
    pub(crate) fn fill_all<'a, R>(&mut self, pool: &WorkerPool, row_to_cluster: &[usize], source: R)
    where
        R: Fn(usize) -> &'a [T] + Sync,
        T: 'a,
    {
        let stride = self.stride;
        let rows = self.lengths.len();
        self.values
            .par_chunks_mut(stride)
            .zip(self.clusters.par_chunks_mut(stride))
            .zip(self.lengths.par_iter_mut())
            .enumerate()
            .with_min_len(if pool.is_parallel(rows) { 1 } else { rows.max(1) })
            .for_each_init(Vec::new, |scratch, (row, ((values, clusters), length))| {
                let bound = row_to_cluster[row];
                *length = fill(
                    values,
                    clusters,
                    source(row),
                    row_to_cluster,
                    row,
                    bound,
                    scratch,
                    SortMode::Sequential,
                );
            });
    }

    /// Rebuilds one row from `source_row`, keeping clusters below `bound`.
    pub(crate) fn fill_row(
        &mut self,
        row: usize,
        source_row: &[T],
        row_to_cluster: &[usize],
        bound: usize,
        mode: SortMode,
    ) {
        let start = row * self.stride;
        let end = start + self.stride;
        let mut scratch = Vec::with_capacity(source_row.len());
        self.lengths[row] = fill(
            &mut self.values[start..end],
            &mut self.clusters[start..end],
            source_row,
            row_to_cluster,
            row,
            bound,
            &mut scratch,
            mode,
        );
    }

    /// Drops row `row`, moving the last row into its place.
    pub(crate) fn remove_row(&mut self, row: usize) {
        let last = self.lengths.len() - 1;
        if row != last {
            let from = last * self.stride;
            let to = row * self.stride;
            let span = self.lengths[last] + 1;
            self.values.copy_within(from..from + span, to);
            self.clusters.copy_within(from..from + span, to);
            self.lengths[row] = self.lengths[last];
        }
        self.lengths.pop();
    }

    /// Removes stale entries from every row, preserving sorted order.
    ///
    /// Returns the number of entries dropped.
    pub(crate) fn purge(&mut self, pool: &WorkerPool, book: &ClusterBook<T>) -> usize {
        let stride = self.stride;
        let rows = self.lengths.len();
        self.values
            .par_chunks_mut(stride)
            .zip(self.clusters.par_chunks_mut(stride))
            .zip(self.lengths.par_iter_mut())
            .with_min_len(if pool.is_parallel(rows) { 1 } else { rows.max(1) })
            .map(|((values, clusters), length)| purge_row(values, clusters, length, book))
            .sum()
    }
}

#[expect(
    clippy::too_many_arguments,
    reason = "row slices and the sort inputs travel together"
)]
fn fill<T: Real>(
    values: &mut [T],
    clusters: &mut [usize],
    source_row: &[T],
    row_to_cluster: &[usize],
    row: usize,
    bound: usize,
    scratch: &mut Vec<(T, usize)>,
    mode: SortMode,
) -> usize {
    scratch.clear();
    scratch.extend(
        source_row
            .iter()
            .zip(row_to_cluster)
            .enumerate()
            .filter(|&(column, (_, &cluster))| column != row && cluster < bound)
            .map(|(_, (&distance, &cluster))| (distance, cluster)),
    );
    mirror_sort(scratch, mode);
    let length = scratch.len();
    for (slot, &(distance, cluster)) in scratch.iter().enumerate() {
        values[slot] = distance;
        clusters[slot] = cluster;
    }
    values[length] = T::INFINITY;
    clusters[length] = row_to_cluster[row];
    length
}

fn purge_row<T: Real>(
    values: &mut [T],
    clusters: &mut [usize],
    length: &mut usize,
    book: &ClusterBook<T>,
) -> usize {
    let mut kept = 0;
    for read in 0..*length {
        if book.is_live(clusters[read]) {
            values[kept] = values[read];
            clusters[kept] = clusters[read];
            kept += 1;
        }
    }
    values[kept] = T::INFINITY;
    clusters[kept] = clusters[*length];
    let dropped = *length - kept;
    *length = kept;
    dropped
}

/// Sorts `(distance, cluster)` pairs so both columns move together.
pub(crate) fn mirror_sort<T: Real>(entries: &mut [(T, usize)], mode: SortMode) {
    match mode {
        SortMode::Sequential => entries.sort_unstable_by(compare_entries),
        SortMode::Parallel => entries.par_sort_unstable_by(compare_entries),
    }
}

fn compare_entries<T: Real>(left: &(T, usize), right: &(T, usize)) -> Ordering {
    left.0.total_cmp(&right.0).then_with(|| left.1.cmp(&right.1))
}
