//! Property 1: pruning never changes a row's answer.
//!
//! Drives a bounded run one join at a time. Before each join, every row is
//! walked both pruned and unpruned, the row minima are folded into a global
//! minimum, and that minimum is compared with the naive engine's full scan
//! and with the scheduled search.

use proptest::test_runner::{TestCaseError, TestCaseResult};

use super::{
    oracle::{live_entries, unpruned_row_minimum},
    types::JoinFixture,
};
use crate::{
    bounding::{
        BoundingConfig, RapidNj, scheduler,
        search::{bounded_row_minimum, search_rows},
        sorter::{SortMode, mirror_sort},
    },
    engine::{ClusteringEngine, Nj, RowMinimum},
};

pub(super) fn run_pruning_equivalence_property(fixture: &JoinFixture) -> TestCaseResult {
    let mut rapid = RapidNj::new(
        Nj::new(fixture.matrix()),
        BoundingConfig::default().with_parallel_threshold_per_thread(4),
    )
    .map_err(|err| fail(fixture, format!("construction failed: {err}")))?;
    rapid
        .prepare()
        .map_err(|err| fail(fixture, format!("prepare failed: {err}")))?;

    while rapid.row_count() > 3 {
        check_iteration(&mut rapid, fixture)?;
        rapid
            .step()
            .map_err(|err| fail(fixture, format!("step failed: {err}")))?;
    }
    Ok(())
}

fn check_iteration(rapid: &mut RapidNj<f64>, fixture: &JoinFixture) -> TestCaseResult {
    let rows = rapid.engine.row_count();
    rapid.book.rescale(rows);
    let row_to_cluster = rapid.engine.row_to_cluster();

    let stored = live_entries(&rapid.sorted, &rapid.book);
    if stored != rows * (rows - 1) / 2 {
        return Err(fail(
            fixture,
            format!("{stored} live entries stored for {rows} rows"),
        ));
    }

    let mut oracle_best = RowMinimum::none(0);
    for (row, &cluster) in row_to_cluster.iter().enumerate() {
        let expected = unpruned_row_minimum(row, &rapid.sorted, &rapid.book, cluster);
        let mut unseeded = f64::INFINITY;
        let (found, _) = bounded_row_minimum(row, &rapid.sorted, &rapid.book, cluster, &mut unseeded);
        if found != expected {
            return Err(fail(
                fixture,
                format!("row {row} of {rows}: pruned {found:?}, unpruned {expected:?}"),
            ));
        }
        if expected.is_found() {
            let mut seeded = expected.value();
            let (again, _) =
                bounded_row_minimum(row, &rapid.sorted, &rapid.book, cluster, &mut seeded);
            if again != expected {
                return Err(fail(
                    fixture,
                    format!("row {row} of {rows}: seeded walk gave {again:?}, expected {expected:?}"),
                ));
            }
        }
        oracle_best = oracle_best.min(expected);
    }

    let naive = rapid.engine.minimum_entry();
    if oracle_best != naive {
        return Err(fail(
            fixture,
            format!("{rows} rows: oracle {oracle_best:?}, naive {naive:?}"),
        ));
    }

    let seed = scheduler::decide_scan_order(
        &mut rapid.scratch,
        &rapid.engine,
        &rapid.book,
        &rapid.pool,
        &rapid.config,
    );
    if seed < naive.value() {
        return Err(fail(
            fixture,
            format!("seed {seed} lies below the minimum {}", naive.value()),
        ));
    }
    let outcome = search_rows(
        &rapid.engine,
        &rapid.sorted,
        &rapid.book,
        &rapid.pool,
        &mut rapid.scratch,
        seed,
    );
    if outcome.best != naive {
        return Err(fail(
            fixture,
            format!("{rows} rows: search {:?}, naive {naive:?}", outcome.best),
        ));
    }
    Ok(())
}

/// Sorting a row is deterministic and idempotent in either mode.
pub(super) fn run_sort_consistency_property(fixture: &JoinFixture) -> TestCaseResult {
    for (row, distances) in fixture.rows.iter().enumerate() {
        let entries: Vec<(f64, usize)> = distances
            .iter()
            .copied()
            .zip(0..)
            .filter(|&(_, column)| column != row)
            .collect();
        let mut sequential = entries.clone();
        mirror_sort(&mut sequential, SortMode::Sequential);
        let mut parallel = entries;
        mirror_sort(&mut parallel, SortMode::Parallel);
        if sequential != parallel {
            return Err(fail(fixture, format!("row {row}: sort modes disagree")));
        }
        let mut resorted = sequential.clone();
        mirror_sort(&mut resorted, SortMode::Sequential);
        if resorted != sequential {
            return Err(fail(fixture, format!("row {row}: sort is not idempotent")));
        }
        if sequential
            .windows(2)
            .any(|pair| (pair[0].0, pair[0].1) > (pair[1].0, pair[1].1))
        {
            return Err(fail(fixture, format!("row {row}: entries out of order")));
        }
    }
    Ok(())
}

pub(super) fn fail(fixture: &JoinFixture, message: String) -> TestCaseError {
    TestCaseError::fail(format!(
        "{message} (distribution={:?}, taxa={})",
        fixture.distribution,
        fixture.taxa(),
    ))
}
