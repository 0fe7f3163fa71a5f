//! Branch-and-bound search for the global criterion minimum.

use rayon::prelude::*;

use super::{bookkeeping::ClusterBook, pool::WorkerPool, scheduler::ScanScratch, sorter::SortedRows};
use crate::{
    Real,
    engine::{ClusteringEngine, RowMinimum, criterion},
};

/// Result of one full search.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SearchOutcome<T> {
    pub(crate) best: RowMinimum<T>,
    pub(crate) scanned: usize,
}

/// Largest distance in a row that could still beat `q_best`.
///
/// The bound is widened by a few ulps of its operands so that rounding in
/// the criterion never prunes an entry whose value equals `q_best`. A row
/// whose cluster has no live predecessor holds only stale entries, so its
/// bound is `-∞` and the walk stops after the first entry.
#[inline]
fn row_bound<T: Real>(q_best: T, max_earlier: T, scaled_row: T) -> T {
    if !max_earlier.is_finite() {
        return T::NEG_INFINITY;
    }
    let offset = max_earlier + scaled_row;
    let slack = T::EPSILON * T::from_usize(8) * (q_best.abs() + offset.abs());
    q_best + offset + slack
}

/// Minimum of one sorted row, pruned against the running bound `q_best`.
///
/// Entries are walked in ascending distance order. The walk stops at the
/// sentinel, or at the first entry past the first whose distance exceeds the
/// bound. Entries naming clusters that are no longer live are skipped.
/// Criterion ties within the row keep the entry met first, so the smaller
/// distance wins. `q_best` is lowered whenever the row finds a better value.
/// Returns the row's best candidate and the number of entries examined.
pub(crate) fn bounded_row_minimum<T: Real>(
    row: usize,
    sorted: &SortedRows<T>,
    book: &ClusterBook<T>,
    row_cluster: usize,
    q_best: &mut T,
) -> (RowMinimum<T>, usize) {
    let scaled_row = book.scaled_total(row_cluster);
    let max_earlier = book.scaled_max_earlier(row_cluster);
    let mut bound = row_bound(*q_best, max_earlier, scaled_row);
    let mut best = RowMinimum::none(row);
    let mut scanned = 0;
    for (index, (&distance, &cluster)) in sorted
        .values(row)
        .iter()
        .zip(sorted.clusters(row))
        .enumerate()
    {
        if distance == T::INFINITY || (index > 0 && distance > bound) {
            break;
        }
        scanned += 1;
        let Some(other) = book.row_of(cluster) else {
            continue;
        };
        let value = criterion(distance, book.scaled_total(cluster), scaled_row);
        if value < best.value() {
            best = RowMinimum::pair(row, other, value);
            if value < *q_best {
                *q_best = value;
                bound = row_bound(value, max_earlier, scaled_row);
            }
        }
    }
    (best, scanned)
}

/// Searches every row in `scratch.scan_order`, writing each row's candidate
/// into `scratch.row_minima`.
///
/// Rows are split into one contiguous run per worker. Each run starts from
/// `seed` and carries its tightened bound from row to row.
pub(crate) fn search_rows<T, E>(
    engine: &E,
    sorted: &SortedRows<T>,
    book: &ClusterBook<T>,
    pool: &WorkerPool,
    scratch: &mut ScanScratch<T>,
    seed: T,
) -> SearchOutcome<T>
where
    T: Real,
    E: ClusteringEngine<T>,
{
    let rows = scratch.scan_order.len();
    let row_to_cluster = engine.row_to_cluster();
    let run = if pool.is_parallel(rows) {
        rows.div_ceil(pool.threads())
    } else {
        rows.max(1)
    };
    scratch.row_minima.clear();
    scratch.row_minima.resize(rows, RowMinimum::none(0));
    let scanned = scratch
        .row_minima
        .par_chunks_mut(run)
        .zip(scratch.scan_order.par_chunks(run))
        .map(|(minima, order)| {
            let mut q_best = seed;
            let mut scanned = 0;
            for (slot, &row) in minima.iter_mut().zip(order) {
                let (minimum, examined) =
                    bounded_row_minimum(row, sorted, book, row_to_cluster[row], &mut q_best);
                *slot = minimum;
                scanned += examined;
            }
            scanned
        })
        .sum();
    let best = scratch
        .row_minima
        .iter()
        .copied()
        .min()
        .unwrap_or(RowMinimum::none(0));
    SearchOutcome { best, scanned }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::{
        engine::Nj,
        test_utils::{matrix_from_rows, two_cherries},
    };

    struct Fixture {
        engine: Nj<f64>,
        book: ClusterBook<f64>,
        sorted: SortedRows<f64>,
        pool: WorkerPool,
    }

    /// Row 3 ties at -8 with partners 0 (d = 4) and 1 (d = 2); row 2 ties at
    /// -8 with partners 0 (d = 5) and 1 (d = 3).
    fn crossed_ties() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 3.0, 5.0, 4.0],
            vec![3.0, 0.0, 3.0, 2.0],
            vec![5.0, 3.0, 0.0, 6.0],
            vec![4.0, 2.0, 6.0, 0.0],
        ]
    }

    fn cherries() -> Fixture {
        fixture(&two_cherries())
    }

    fn fixture(rows: &[Vec<f64>]) -> Fixture {
        let engine = Nj::new(matrix_from_rows::<f64>(rows));
        let pool = WorkerPool::new(NonZeroUsize::MIN, 128).expect("pool must build");
        let mut book = ClusterBook::new(engine.row_to_cluster(), engine.row_totals());
        book.rescale(engine.row_count());
        let mut sorted = SortedRows::new(engine.row_count());
        sorted.fill_all(&pool, engine.row_to_cluster(), |row| engine.row(row));
        Fixture {
            engine,
            book,
            sorted,
            pool,
        }
    }

    #[test]
    fn row_walk_stops_once_the_bound_is_exceeded() {
        let fixture = cherries();
        let mut q_best = f64::INFINITY;
        let (minimum, scanned) =
            bounded_row_minimum(3, &fixture.sorted, &fixture.book, 3, &mut q_best);
        assert_eq!((minimum.row(), minimum.column()), (3, 2));
        assert_eq!(minimum.value(), -8.0);
        assert_eq!(q_best, -8.0);
        assert_eq!(scanned, 1);
    }

    #[test]
    fn entries_equal_to_the_seed_are_still_reported() {
        let fixture = cherries();
        let mut q_best = -8.0;
        let (minimum, _) = bounded_row_minimum(3, &fixture.sorted, &fixture.book, 3, &mut q_best);
        assert_eq!((minimum.row(), minimum.column()), (3, 2));
        assert_eq!(minimum.value(), -8.0);
    }

    #[test]
    fn search_selects_the_lowest_tied_pair() {
        let fixture = cherries();
        let mut scratch = ScanScratch::default();
        scratch.scan_order = vec![3, 2, 1, 0];
        let outcome = search_rows(
            &fixture.engine,
            &fixture.sorted,
            &fixture.book,
            &fixture.pool,
            &mut scratch,
            f64::INFINITY,
        );
        assert_eq!((outcome.best.row(), outcome.best.column()), (1, 0));
        assert_eq!(outcome.best.value(), -8.0);
        assert_eq!(scratch.row_minima.len(), 4);
        assert!(outcome.scanned < 6);
    }

    #[test]
    fn row_ties_keep_the_smaller_distance() {
        let fixture = fixture(&crossed_ties());
        let mut q_best = f64::INFINITY;
        let (minimum, _) = bounded_row_minimum(3, &fixture.sorted, &fixture.book, 3, &mut q_best);
        assert_eq!((minimum.row(), minimum.column()), (3, 1));
        assert_eq!(minimum.value(), -8.0);

        let (minimum, _) = bounded_row_minimum(2, &fixture.sorted, &fixture.book, 2, &mut q_best);
        assert_eq!((minimum.row(), minimum.column()), (2, 1));
    }

    #[test]
    fn search_agrees_with_the_full_scan_on_row_ties() {
        let fixture = fixture(&crossed_ties());
        let mut scratch = ScanScratch::default();
        scratch.scan_order = vec![3, 2, 1, 0];
        let outcome = search_rows(
            &fixture.engine,
            &fixture.sorted,
            &fixture.book,
            &fixture.pool,
            &mut scratch,
            f64::INFINITY,
        );
        let naive = fixture.engine.minimum_entry();
        assert_eq!((outcome.best.row(), outcome.best.column()), (2, 1));
        assert_eq!(outcome.best, naive);
    }

    #[test]
    fn rows_without_live_predecessors_stop_after_one_entry() {
        let mut fixture = cherries();
        fixture.book.record_join(0, 1, 4, 0, Some((3, 1)));
        fixture.book.refresh_totals(&[4, 3, 2], &[5.0, 3.0, 7.0]);
        fixture.book.rescale(3);
        assert_eq!(fixture.book.scaled_max_earlier(2), f64::NEG_INFINITY);

        let mut q_best = f64::INFINITY;
        let (minimum, scanned) =
            bounded_row_minimum(2, &fixture.sorted, &fixture.book, 2, &mut q_best);
        assert!(!minimum.is_found());
        assert_eq!(scanned, 1);
        assert_eq!(q_best, f64::INFINITY);
    }
}
