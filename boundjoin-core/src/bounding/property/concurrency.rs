//! Property 3: the worker count never changes a run.
//!
//! Runs the same fixture on one worker and on several workers with every
//! region forced parallel, then compares the join sequence and the tree.

use std::num::NonZeroUsize;

use proptest::test_runner::TestCaseResult;

use super::{pruning::fail, types::JoinFixture};
use crate::{
    bounding::{BoundingConfig, JoinRecord, RapidNj},
    engine::Nj,
    error::Result,
    tree::ClusterTree,
};

/// Worker counts compared against the single-worker baseline.
const WORKER_COUNTS: [usize; 2] = [3, 8];

pub(super) fn run_thread_invariance_property(fixture: &JoinFixture) -> TestCaseResult {
    let (baseline_records, baseline_tree) = run_with(fixture, NonZeroUsize::MIN)
        .map_err(|err| fail(fixture, format!("single worker run failed: {err}")))?;

    for workers in WORKER_COUNTS.into_iter().filter_map(NonZeroUsize::new) {
        let (records, tree) = run_with(fixture, workers)
            .map_err(|err| fail(fixture, format!("{workers} worker run failed: {err}")))?;
        if let Some(index) = records
            .iter()
            .zip(&baseline_records)
            .position(|(left, right)| left != right)
        {
            return Err(fail(
                fixture,
                format!(
                    "{workers} workers diverged at join {index}: {:?} vs {:?}",
                    records[index], baseline_records[index],
                ),
            ));
        }
        if records.len() != baseline_records.len() || tree != baseline_tree {
            return Err(fail(fixture, format!("{workers} workers built a different tree")));
        }
    }
    Ok(())
}

fn run_with(
    fixture: &JoinFixture,
    workers: NonZeroUsize,
) -> Result<(Vec<JoinRecord<f64>>, ClusterTree<f64>)> {
    let config = BoundingConfig::default()
        .with_threads(workers)
        .with_parallel_threshold_per_thread(1);
    let mut rapid = RapidNj::new(Nj::new(fixture.matrix()), config)?;
    let mut records = rapid.prepare()?;
    while rapid.row_count() > 3 {
        records.push(rapid.step()?);
    }
    let tree = rapid.finish()?;
    Ok((records, tree))
}
