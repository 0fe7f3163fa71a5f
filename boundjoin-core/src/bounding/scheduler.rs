//! Row scan ordering and the starting bound for each search.
//!
//! The previous iteration's row minima are still mostly valid pairs after a
//! join. Re-evaluating them gives an attainable criterion value to start the
//! search from, and scanning their rows first tends to tighten the bound
//! before the bulk of the rows are visited. Neither affects which pair wins.

use rayon::prelude::*;

use super::{BoundingConfig, bookkeeping::ClusterBook, pool::WorkerPool};
use crate::{
    Real,
    engine::{ClusteringEngine, RowMinimum, criterion},
};

/// Scratch buffers reused across iterations.
#[derive(Clone, Debug)]
pub(crate) struct ScanScratch<T> {
    pub(crate) row_minima: Vec<RowMinimum<T>>,
    pub(crate) scan_order: Vec<usize>,
    chosen: Vec<bool>,
}

impl<T> Default for ScanScratch<T> {
    fn default() -> Self {
        Self {
            row_minima: Vec::new(),
            scan_order: Vec::new(),
            chosen: Vec::new(),
        }
    }
}

/// Orders `scratch.scan_order` for the next search and returns the seed bound.
pub(crate) fn decide_scan_order<T, E>(
    scratch: &mut ScanScratch<T>,
    engine: &E,
    book: &ClusterBook<T>,
    pool: &WorkerPool,
    config: &BoundingConfig,
) -> T
where
    T: Real,
    E: ClusteringEngine<T>,
{
    let rows = engine.row_count();
    let seed = if config.seed_bound_from_previous {
        probe_previous_minima(&scratch.row_minima, engine, book, pool)
    } else {
        T::INFINITY
    };

    scratch.scan_order.clear();
    scratch.chosen.clear();
    scratch.chosen.resize(rows, false);
    if config.order_rows_by_previous {
        tournament(&mut scratch.row_minima, pool);
        let row_to_cluster = engine.row_to_cluster();
        for minimum in &scratch.row_minima {
            if !minimum.is_found() || minimum.row() >= rows {
                continue;
            }
            let (a, b) = (minimum.row(), minimum.column());
            let row = if row_to_cluster[a] > row_to_cluster[b] { a } else { b };
            if !scratch.chosen[row] {
                scratch.chosen[row] = true;
                scratch.scan_order.push(row);
            }
        }
    }
    for row in 0..rows {
        if !scratch.chosen[row] {
            scratch.scan_order.push(row);
        }
    }
    seed
}

/// Smallest current criterion among previous minima that still name two
/// live rows.
fn probe_previous_minima<T, E>(
    minima: &[RowMinimum<T>],
    engine: &E,
    book: &ClusterBook<T>,
    pool: &WorkerPool,
) -> T
where
    T: Real,
    E: ClusteringEngine<T>,
{
    let rows = engine.row_count();
    let row_to_cluster = engine.row_to_cluster();
    pool.map_partitions(minima, |slice| {
        let mut best = T::INFINITY;
        for minimum in slice {
            let (a, b) = (minimum.row(), minimum.column());
            if !minimum.is_found() || a >= rows {
                continue;
            }
            let value = criterion(
                engine.row(a)[b],
                book.scaled_total(row_to_cluster[a]),
                book.scaled_total(row_to_cluster[b]),
            );
            if value < best {
                best = value;
            }
        }
        best
    })
    .into_iter()
    .fold(T::INFINITY, |best, value| if value < best { value } else { best })
}

/// Moves the lowest minima towards the front by repeated halving.
///
/// Each round compares element `i` with element `i + gap` over the leading
/// `len` entries and keeps the lower one in front. The result is not a full
/// sort; it only needs the best candidates early.
fn tournament<T: Real>(minima: &mut [RowMinimum<T>], pool: &WorkerPool) {
    let mut len = minima.len();
    while len > 1 {
        let half = len / 2;
        let gap = len - half;
        let (front, back) = minima[..len].split_at_mut(gap);
        if pool.is_parallel(half) {
            front[..half]
                .par_iter_mut()
                .zip(back.par_iter_mut())
                .for_each(|(left, right)| swap_if_lower(left, right));
        } else {
            front[..half]
                .iter_mut()
                .zip(back.iter_mut())
                .for_each(|(left, right)| swap_if_lower(left, right));
        }
        len = gap;
    }
}

fn swap_if_lower<T: Real>(left: &mut RowMinimum<T>, right: &mut RowMinimum<T>) {
    if *right < *left {
        std::mem::swap(left, right);
    }
}
