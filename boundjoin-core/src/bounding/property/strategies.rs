//! Matrix generators for the bounded search properties.
//!
//! Each generator returns a symmetric matrix with a zero diagonal. Sizes
//! stay modest so that the per-iteration oracle checks remain cheap.

use proptest::prelude::*;
use rand::{Rng, SeedableRng, rngs::SmallRng};

use super::types::{DistanceDistribution, JoinFixture};

/// Minimum taxon count for generated matrices.
const MIN_TAXA: usize = 5;
/// Maximum taxon count for generated matrices.
const MAX_TAXA: usize = 40;

pub(super) fn join_fixture_strategy() -> impl Strategy<Value = JoinFixture> {
    (any::<DistanceDistribution>(), any::<u64>()).prop_map(|(distribution, seed)| {
        let mut rng = SmallRng::seed_from_u64(seed);
        generate_fixture(distribution, &mut rng)
    })
}

/// Generates a fixture for a specific distribution.
pub(super) fn generate_fixture(distribution: DistanceDistribution, rng: &mut SmallRng) -> JoinFixture {
    let taxa = rng.gen_range(MIN_TAXA..=MAX_TAXA);
    let rows = match distribution {
        DistanceDistribution::Continuous => symmetric(taxa, |_, _| rng.gen_range(0.5..50.0)),
        DistanceDistribution::ManyTies => {
            symmetric(taxa, |_, _| f64::from(rng.gen_range(1_u8..=4)))
        }
        DistanceDistribution::Additive => additive(taxa, rng),
        DistanceDistribution::Duplicates => duplicated(taxa, rng),
    };
    JoinFixture { rows, distribution }
}

fn symmetric(taxa: usize, mut draw: impl FnMut(usize, usize) -> f64) -> Vec<Vec<f64>> {
    let mut rows = vec![vec![0.0; taxa]; taxa];
    for row in 1..taxa {
        for column in 0..row {
            let value = draw(row, column);
            rows[row][column] = value;
            rows[column][row] = value;
        }
    }
    rows
}

/// Path lengths of a tree built by joining random pairs of subtrees.
fn additive(taxa: usize, rng: &mut SmallRng) -> Vec<Vec<f64>> {
    let mut rows = vec![vec![0.0; taxa]; taxa];
    // Each subtree lists its leaves with their depth below the subtree root.
    let mut subtrees: Vec<Vec<(usize, f64)>> = (0..taxa).map(|leaf| vec![(leaf, 0.0)]).collect();
    while subtrees.len() > 1 {
        let first = subtrees.swap_remove(rng.gen_range(0..subtrees.len()));
        let second = subtrees.swap_remove(rng.gen_range(0..subtrees.len()));
        let first_length: f64 = rng.gen_range(0.5..5.0);
        let second_length: f64 = rng.gen_range(0.5..5.0);
        for &(a, depth_a) in &first {
            for &(b, depth_b) in &second {
                let distance = depth_a + first_length + depth_b + second_length;
                rows[a][b] = distance;
                rows[b][a] = distance;
            }
        }
        let merged = first
            .into_iter()
            .map(|(leaf, depth)| (leaf, depth + first_length))
            .chain(
                second
                    .into_iter()
                    .map(|(leaf, depth)| (leaf, depth + second_length)),
            )
            .collect();
        subtrees.push(merged);
    }
    rows
}

/// Continuous distances over a smaller set of distinct taxa, with the
/// remaining taxa copying one of them exactly.
fn duplicated(taxa: usize, rng: &mut SmallRng) -> Vec<Vec<f64>> {
    let distinct = rng.gen_range(3..taxa);
    let base = symmetric(distinct, |_, _| rng.gen_range(0.5..50.0));
    let origin: Vec<usize> = (0..taxa)
        .map(|taxon| {
            if taxon < distinct {
                taxon
            } else {
                rng.gen_range(0..distinct)
            }
        })
        .collect();
    symmetric(taxa, |row, column| base[origin[row]][origin[column]])
}

// Biased towards ties, the case most likely to expose an ordering slip.
impl proptest::arbitrary::Arbitrary for DistanceDistribution {
    type Parameters = ();
    type Strategy = proptest::strategy::TupleUnion<(
        proptest::strategy::WA<proptest::strategy::Just<Self>>,
        proptest::strategy::WA<proptest::strategy::Just<Self>>,
        proptest::strategy::WA<proptest::strategy::Just<Self>>,
        proptest::strategy::WA<proptest::strategy::Just<Self>>,
    )>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            2 => Just(Self::Continuous),
            3 => Just(Self::ManyTies),
            2 => Just(Self::Additive),
            1 => Just(Self::Duplicates),
        ]
    }
}
