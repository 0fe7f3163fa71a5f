//! Fixture types for the bounded search properties.

use crate::{DistanceMatrix, test_utils::matrix_from_rows};

/// Distance distribution used to generate a fixture.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum DistanceDistribution {
    /// Off-diagonal distances drawn from a continuous range.
    Continuous,
    /// Small integer distances, so many criterion values tie exactly.
    ManyTies,
    /// Path lengths of a random tree with positive branch lengths.
    Additive,
    /// Continuous distances where several taxa share identical rows.
    Duplicates,
}

impl DistanceDistribution {
    /// Returns `true` when the rows are free of identical pairs, so the
    /// naive engine sees the same joins as the bounded one.
    pub(super) fn is_duplicate_free(self) -> bool {
        self != Self::Duplicates
    }
}

/// Generated matrix together with the distribution that produced it.
#[derive(Clone, Debug)]
pub(super) struct JoinFixture {
    /// Symmetric rows with a zero diagonal.
    pub rows: Vec<Vec<f64>>,
    /// Distribution used during generation.
    pub distribution: DistanceDistribution,
}

impl JoinFixture {
    pub(super) fn taxa(&self) -> usize {
        self.rows.len()
    }

    pub(super) fn matrix(&self) -> DistanceMatrix<f64> {
        matrix_from_rows(&self.rows)
    }
}
