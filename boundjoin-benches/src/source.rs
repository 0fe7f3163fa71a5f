//! Synthetic distance source for benchmarking.
//!
//! Provides [`SyntheticSource`], a [`DistanceSource`] over pre-generated
//! points in the unit hypercube with Euclidean distance. Data is seeded for
//! reproducibility across benchmark runs.

use boundjoin_core::{DistanceSource, SourceError};
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Errors that may occur during synthetic source generation.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum SyntheticError {
    /// The requested taxon count was zero.
    #[error("taxon count must be greater than zero")]
    ZeroTaxa,
    /// The requested dimension count was zero.
    #[error("dimension count must be greater than zero")]
    ZeroDimensions,
}

/// Configuration for synthetic point generation.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Number of taxa to generate.
    pub taxa: usize,
    /// Dimensionality of each point.
    pub dimensions: usize,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

/// A [`DistanceSource`] of random Euclidean points for benchmarking.
///
/// Points are stored in a flat row-major `Vec<f64>` and generated eagerly
/// from a seeded RNG. Continuous coordinates make exact distance ties and
/// duplicate taxa vanishingly unlikely.
///
/// # Examples
///
/// ```
/// use boundjoin_benches::source::{SyntheticConfig, SyntheticSource};
/// use boundjoin_core::DistanceSource;
///
/// let config = SyntheticConfig { taxa: 10, dimensions: 4, seed: 42 };
/// let source = SyntheticSource::generate(&config).expect("valid config");
/// assert_eq!(source.len(), 10);
/// assert_eq!(source.label(3).expect("label exists"), "s3");
/// ```
#[derive(Clone, Debug)]
pub struct SyntheticSource {
    data: Vec<f64>,
    taxa: usize,
    dimensions: usize,
}

impl SyntheticSource {
    /// Generates points eagerly from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SyntheticError::ZeroTaxa`] if `taxa` is zero, or
    /// [`SyntheticError::ZeroDimensions`] if `dimensions` is zero.
    pub fn generate(config: &SyntheticConfig) -> Result<Self, SyntheticError> {
        if config.taxa == 0 {
            return Err(SyntheticError::ZeroTaxa);
        }
        if config.dimensions == 0 {
            return Err(SyntheticError::ZeroDimensions);
        }

        let total = config.taxa.saturating_mul(config.dimensions);
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let data: Vec<f64> = (0..total).map(|_| rng.gen_range(0.0..1.0)).collect();

        Ok(Self {
            data,
            taxa: config.taxa,
            dimensions: config.dimensions,
        })
    }

    /// Returns the dimensionality of each point.
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn point(&self, index: usize) -> Result<&[f64], SourceError> {
        let start = index
            .checked_mul(self.dimensions)
            .ok_or(SourceError::OutOfBounds { index })?;
        let end = start
            .checked_add(self.dimensions)
            .ok_or(SourceError::OutOfBounds { index })?;
        self.data
            .get(start..end)
            .ok_or(SourceError::OutOfBounds { index })
    }
}

impl DistanceSource for SyntheticSource {
    fn len(&self) -> usize {
        self.taxa
    }

    #[expect(
        clippy::unnecessary_literal_bound,
        reason = "DistanceSource trait constrains the return type to &str"
    )]
    fn name(&self) -> &str {
        "synthetic"
    }

    fn label(&self, index: usize) -> Result<String, SourceError> {
        if index < self.taxa {
            Ok(format!("s{index}"))
        } else {
            Err(SourceError::OutOfBounds { index })
        }
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "Euclidean distance requires arithmetic on f64 values"
    )]
    fn distance(&self, left: usize, right: usize) -> Result<f64, SourceError> {
        let left_point = self.point(left)?;
        let right_point = self.point(right)?;
        let sum_sq = left_point
            .iter()
            .zip(right_point)
            .fold(0.0_f64, |acc, (a, b)| {
                let diff = a - b;
                acc + diff * diff
            });
        Ok(sum_sq.sqrt())
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "distance comparison assertions require float arithmetic"
)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn default_config(taxa: usize, dimensions: usize) -> SyntheticConfig {
        SyntheticConfig {
            taxa,
            dimensions,
            seed: 42,
        }
    }

    #[rstest]
    #[case::small(10, 4)]
    #[case::medium(100, 16)]
    fn generates_correct_taxon_count(#[case] taxa: usize, #[case] dimensions: usize) {
        let source = SyntheticSource::generate(&default_config(taxa, dimensions))
            .expect("generation must succeed");
        assert_eq!(source.len(), taxa);
        assert_eq!(source.dimensions(), dimensions);
    }

    #[rstest]
    fn rows_form_a_valid_distance_matrix() {
        let source =
            SyntheticSource::generate(&default_config(12, 8)).expect("generation must succeed");
        for i in 0..source.len() {
            let row = source.row(i).expect("row must load");
            assert_eq!(row.get(i).copied(), Some(0.0), "d({i},{i}) must be zero");
            for (j, &d_ij) in row.iter().enumerate() {
                let d_ji = source.distance(j, i).expect("distance must succeed");
                assert_eq!(d_ij, d_ji, "distance must be symmetric at ({i},{j})");
                assert!(d_ij >= 0.0);
            }
        }
    }

    #[rstest]
    fn deterministic_with_same_seed() {
        let config = default_config(50, 8);
        let a = SyntheticSource::generate(&config).expect("generation must succeed");
        let b = SyntheticSource::generate(&config).expect("generation must succeed");
        assert_eq!(
            a.distance(0, 1).expect("distance must succeed"),
            b.distance(0, 1).expect("distance must succeed"),
        );
    }

    #[rstest]
    fn different_seeds_produce_different_data() {
        let a = SyntheticSource::generate(&SyntheticConfig {
            seed: 1,
            ..default_config(50, 8)
        })
        .expect("generation must succeed");
        let b = SyntheticSource::generate(&SyntheticConfig {
            seed: 2,
            ..default_config(50, 8)
        })
        .expect("generation must succeed");
        let d_a = a.distance(0, 1).expect("distance must succeed");
        let d_b = b.distance(0, 1).expect("distance must succeed");
        assert!((d_a - d_b).abs() > f64::EPSILON);
    }

    #[rstest]
    #[case(0, 8, SyntheticError::ZeroTaxa)]
    #[case(10, 0, SyntheticError::ZeroDimensions)]
    fn rejects_empty_configurations(
        #[case] taxa: usize,
        #[case] dimensions: usize,
        #[case] expected: SyntheticError,
    ) {
        let err = SyntheticSource::generate(&default_config(taxa, dimensions))
            .expect_err("configuration must be rejected");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case(10, 0, 10)]
    #[case(0, 10, 10)]
    fn rejects_out_of_bounds_index(
        #[case] left: usize,
        #[case] right: usize,
        #[case] expected_index: usize,
    ) {
        let source =
            SyntheticSource::generate(&default_config(5, 4)).expect("generation must succeed");
        let err = source
            .distance(left, right)
            .expect_err("out-of-bounds index must be rejected");
        assert_eq!(err, SourceError::OutOfBounds {
            index: expected_index
        });
        assert!(source.label(5).is_err());
    }

    #[rstest]
    fn synthetic_sources_build_trees() {
        let source =
            SyntheticSource::generate(&default_config(30, 6)).expect("generation must succeed");
        let tree = boundjoin_core::JoinerBuilder::new()
            .with_threads(2)
            .build()
            .expect("configuration must be valid")
            .run(&source)
            .expect("run must succeed");
        assert_eq!(tree.tree().leaf_count(), 30);
    }
}
