//! Unpruned row walk used as the reference for the bounded search.
//!
//! Reads the same sorted rows and bookkeeping as the search, but visits
//! every entry up to the sentinel. Any difference from the pruned walk is a
//! pruning error rather than a storage error.

use crate::{
    bounding::{bookkeeping::ClusterBook, sorter::SortedRows},
    engine::{RowMinimum, criterion},
};

/// Best candidate of `row` over every live entry, keeping the first of any
/// tied entries in walk order.
pub(super) fn unpruned_row_minimum(
    row: usize,
    sorted: &SortedRows<f64>,
    book: &ClusterBook<f64>,
    row_cluster: usize,
) -> RowMinimum<f64> {
    let scaled_row = book.scaled_total(row_cluster);
    sorted
        .values(row)
        .iter()
        .zip(sorted.clusters(row))
        .take(sorted.len(row))
        .filter_map(|(&distance, &cluster)| {
            let other = book.row_of(cluster)?;
            let value = criterion(distance, book.scaled_total(cluster), scaled_row);
            Some(RowMinimum::pair(row, other, value))
        })
        .fold(RowMinimum::none(row), |best, candidate| {
            if candidate.value() < best.value() {
                candidate
            } else {
                best
            }
        })
}

/// Number of live pairs stored across all rows.
pub(super) fn live_entries(sorted: &SortedRows<f64>, book: &ClusterBook<f64>) -> usize {
    (0..sorted.row_count())
        .map(|row| {
            sorted.clusters(row)[..sorted.len(row)]
                .iter()
                .filter(|&&cluster| book.is_live(cluster))
                .count()
        })
        .sum()
}
