//! Property 2: whole runs agree with the naive engines.
//!
//! Without identical rows the bounded search must make exactly the joins the
//! naive search makes, so the trees compare equal bit for bit. Additive
//! inputs must also be reconstructed with their original path lengths.

use proptest::test_runner::TestCaseResult;

use super::{
    pruning::fail,
    types::{DistanceDistribution, JoinFixture},
};
use crate::{
    bounding::{BoundingConfig, BoundingMatrix, RapidBionj, RapidNj},
    engine::{Bionj, Nj},
};

/// Relative tolerance when comparing reconstructed path lengths.
const PATH_TOLERANCE: f64 = 1e-9;

pub(super) fn run_naive_agreement_property(fixture: &JoinFixture) -> TestCaseResult {
    let config = BoundingConfig::default().with_parallel_threshold_per_thread(4);

    let rapid = RapidNj::new(Nj::new(fixture.matrix()), config.clone())
        .and_then(BoundingMatrix::construct_tree)
        .map_err(|err| fail(fixture, format!("bounded NJ failed: {err}")))?;
    let rapid_bionj = RapidBionj::new(Bionj::new(fixture.matrix()), config)
        .and_then(BoundingMatrix::construct_tree)
        .map_err(|err| fail(fixture, format!("bounded BIONJ failed: {err}")))?;

    if fixture.distribution.is_duplicate_free() {
        let naive = Nj::new(fixture.matrix())
            .construct_tree()
            .map_err(|err| fail(fixture, format!("naive NJ failed: {err}")))?;
        if rapid != naive {
            return Err(fail(fixture, "bounded NJ tree differs from naive".to_owned()));
        }
        let naive_bionj = Bionj::new(fixture.matrix())
            .construct_tree()
            .map_err(|err| fail(fixture, format!("naive BIONJ failed: {err}")))?;
        if rapid_bionj != naive_bionj {
            return Err(fail(fixture, "bounded BIONJ tree differs from naive".to_owned()));
        }
    }

    for tree in [&rapid, &rapid_bionj] {
        if tree.leaf_count() != fixture.taxa() || tree.len() != 2 * fixture.taxa() - 2 {
            return Err(fail(
                fixture,
                format!("tree has {} leaves and {} clusters", tree.leaf_count(), tree.len()),
            ));
        }
    }

    if fixture.distribution == DistanceDistribution::Additive {
        for (name, tree) in [("NJ", &rapid), ("BIONJ", &rapid_bionj)] {
            let reconstructed = tree.leaf_distances();
            for (row, (expected, actual)) in fixture.rows.iter().zip(&reconstructed).enumerate() {
                for (column, (&want, &got)) in expected.iter().zip(actual).enumerate() {
                    if (want - got).abs() > PATH_TOLERANCE * want.max(1.0) {
                        return Err(fail(
                            fixture,
                            format!("{name} path ({row}, {column}) is {got}, expected {want}"),
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}
