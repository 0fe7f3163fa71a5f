//! Shared test utilities for `boundjoin-core`.

use boundjoin_test_support::ci::property_test_profile::ProptestRunProfile;
use proptest::test_runner::Config as ProptestConfig;
use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::{DistanceMatrix, Real, error::SourceError, source::DistanceSource};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Builds a standard proptest configuration from the shared CI profile.
///
/// This keeps property suites aligned on the same `BOUNDJOIN_PBT_CASES` and
/// `BOUNDJOIN_PBT_FORK` interpretation.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// Labels `t0..tn` for fixtures.
pub(crate) fn labels(count: usize) -> Vec<String> {
    (0..count).map(|index| format!("t{index}")).collect()
}

/// Symmetric matrix of uniformly drawn off-diagonal distances in `[1, 100)`.
///
/// Continuous draws make exact criterion ties vanishingly unlikely, so two
/// search strategies over the same matrix must agree pair for pair.
pub(crate) fn random_rows(size: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut rows = vec![vec![0.0; size]; size];
    for row in 0..size {
        for column in 0..row {
            let value = rng.gen_range(1.0..100.0);
            rows[row][column] = value;
            rows[column][row] = value;
        }
    }
    rows
}

/// Converts fixture rows into a validated matrix of the requested precision.
pub(crate) fn matrix_from_rows<T: Real>(rows: &[Vec<f64>]) -> DistanceMatrix<T> {
    let converted = rows
        .iter()
        .map(|row| row.iter().copied().map(T::from_f64).collect())
        .collect();
    DistanceMatrix::from_rows(labels(rows.len()), converted).expect("fixture rows must validate")
}

/// Four taxa where A-B and C-D are the only close pairs.
pub(crate) fn two_cherries() -> Vec<Vec<f64>> {
    vec![
        vec![0.0, 1.0, 4.0, 4.0],
        vec![1.0, 0.0, 4.0, 4.0],
        vec![4.0, 4.0, 0.0, 1.0],
        vec![4.0, 4.0, 1.0, 0.0],
    ]
}

/// [`DistanceSource`] over points on a line that records distance invocations.
///
/// # Examples
/// ```ignore
/// use std::sync::{Arc, atomic::AtomicUsize};
/// use boundjoin_core::DistanceSource;
/// use boundjoin_core::test_utils::CountingSource;
///
/// let counter = Arc::new(AtomicUsize::new(0));
/// let source = CountingSource::new(vec![0.0, 1.0], Arc::clone(&counter));
/// assert_eq!(source.distance(0, 1)?, 1.0);
/// assert_eq!(counter.load(std::sync::atomic::Ordering::Relaxed), 1);
/// # Ok::<(), boundjoin_core::SourceError>(())
/// ```
#[derive(Clone)]
pub(crate) struct CountingSource {
    data: Vec<f64>,
    calls: Arc<AtomicUsize>,
    name: &'static str,
}

impl CountingSource {
    /// Creates a counting source with the default "counting" name.
    #[must_use]
    pub(crate) fn new(data: Vec<f64>, calls: Arc<AtomicUsize>) -> Self {
        Self::with_name("counting", data, calls)
    }

    /// Creates a counting source with a specific display name.
    #[must_use]
    pub(crate) fn with_name(name: &'static str, data: Vec<f64>, calls: Arc<AtomicUsize>) -> Self {
        Self { data, calls, name }
    }

    /// Returns the backing distance counter for assertions.
    #[must_use]
    pub(crate) fn calls(&self) -> &Arc<AtomicUsize> {
        &self.calls
    }
}

impl DistanceSource for CountingSource {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn name(&self) -> &str {
        self.name
    }

    fn label(&self, index: usize) -> Result<String, SourceError> {
        self.data
            .get(index)
            .map(|_| format!("p{index}"))
            .ok_or(SourceError::OutOfBounds { index })
    }

    fn distance(&self, left: usize, right: usize) -> Result<f64, SourceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let a = self
            .data
            .get(left)
            .ok_or(SourceError::OutOfBounds { index: left })?;
        let b = self
            .data
            .get(right)
            .ok_or(SourceError::OutOfBounds { index: right })?;
        Ok((a - b).abs())
    }
}
