//! Un-accelerated neighbour-joining engines.
//!
//! [`ClusteringEngine`] is the seam between the row storage and join formulas
//! on one side and the search strategy on the other. [`NeighbourJoining`]
//! implements it once; the per-join arithmetic that distinguishes plain
//! neighbour joining from BIONJ is supplied by a [`JoinFormula`].

mod bionj;
mod duplicates;
mod nj;

use std::cmp::Ordering;

use crate::{Real, error::Result, tree::ClusterTree};

pub use self::{
    bionj::BionjFormula,
    nj::{NeighbourJoining, NjFormula},
};

/// Plain neighbour joining.
pub type Nj<T> = NeighbourJoining<T, NjFormula>;

/// Gascuel's BIONJ, weighting each join by the variance matrix.
pub type Bionj<T> = NeighbourJoining<T, BionjFormula<T>>;

/// Candidate pair for the next join.
///
/// Pairs are stored in canonical form with `row > column`. Ordering is by
/// criterion value under IEEE total order, then by row, then by column, so
/// every reduction across rows selects the same pair. Within a row, searches
/// keep the first of tied entries in ascending distance order instead.
#[derive(Clone, Copy, Debug)]
pub struct RowMinimum<T> {
    row: usize,
    column: usize,
    value: T,
}

impl<T: Real> RowMinimum<T> {
    /// Builds a candidate for the pair `(first, second)` in canonical order.
    #[must_use]
    pub fn pair(first: usize, second: usize, value: T) -> Self {
        Self {
            row: first.max(second),
            column: first.min(second),
            value,
        }
    }

    /// Candidate reported by a row without a live partner.
    #[must_use]
    pub fn none(row: usize) -> Self {
        Self {
            row,
            column: row,
            value: T::INFINITY,
        }
    }

    /// Returns the larger row index of the pair.
    #[must_use]
    #[rustfmt::skip]
    pub fn row(&self) -> usize { self.row }

    /// Returns the smaller row index of the pair.
    #[must_use]
    #[rustfmt::skip]
    pub fn column(&self) -> usize { self.column }

    /// Returns the criterion value.
    #[must_use]
    #[rustfmt::skip]
    pub fn value(&self) -> T { self.value }

    /// Returns `true` when the candidate names a real pair.
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.value.is_finite() && self.row != self.column
    }
}

impl<T: Real> PartialEq for RowMinimum<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Real> Eq for RowMinimum<T> {}

impl<T: Real> Ord for RowMinimum<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| self.row.cmp(&other.row))
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl<T: Real> PartialOrd for RowMinimum<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Effect of one join on the engine's row layout.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct JoinOutcome {
    /// Cluster id allocated for the merged cluster.
    pub merged: usize,
    /// Row now holding the merged cluster.
    pub row: usize,
    /// Row that was vacated by the join.
    pub vacated: usize,
    /// Former index of the row moved into `vacated`, if any.
    pub moved: Option<usize>,
}

/// Row storage and join arithmetic driven by a search strategy.
///
/// Rows are indexed `0..row_count()`. Each live row holds one cluster; the
/// mapping is exposed through [`ClusteringEngine::row_to_cluster`]. A join
/// rewrites the lower row with the merged cluster and moves the last row into
/// the vacated one.
pub trait ClusteringEngine<T: Real>: Send + Sync {
    /// Short algorithm name used in logs.
    fn algorithm_name(&self) -> &'static str;

    /// Number of live rows.
    fn row_count(&self) -> usize;

    /// Live prefix of distance row `row`.
    fn row(&self, row: usize) -> &[T];

    /// Row totals, indexed by row.
    fn row_totals(&self) -> &[T];

    /// Cluster id held by each live row.
    fn row_to_cluster(&self) -> &[usize];

    /// Number of cluster ids allocated so far, which is also the next id.
    fn cluster_count(&self) -> usize;

    /// Groups of cluster ids whose distance rows are identical.
    fn duplicate_groups(&self) -> Vec<Vec<usize>>;

    /// Global minimum of the criterion found by scanning every pair.
    fn minimum_entry(&self) -> RowMinimum<T>;

    /// Joins rows `a < b`.
    ///
    /// # Errors
    /// Returns [`crate::JoinError::InvariantViolation`] when the rows are not
    /// a valid live pair or fewer than three rows remain.
    fn cluster(&mut self, a: usize, b: usize) -> Result<JoinOutcome>;

    /// Resolves the remaining rows into the root and returns the tree.
    ///
    /// # Errors
    /// Returns [`crate::JoinError::InvariantViolation`] when more than three
    /// rows remain.
    fn finish(self) -> Result<ClusterTree<T>>
    where
        Self: Sized;
}

/// Per-join arithmetic that distinguishes the neighbour-joining variants.
pub trait JoinFormula<T: Real>: Send + Sync {
    /// Algorithm name reported by the engine.
    const NAME: &'static str;

    /// Weight given to row `a` when averaging the merged distances.
    fn lambda(&self, a: usize, b: usize, row_count: usize) -> T;

    /// Updates formula state for the join of `a` and `b` into `a`.
    fn join(&mut self, a: usize, b: usize, lambda: T, row_count: usize);

    /// Drops row `b`, moving the last live row into its place.
    fn remove_row(&mut self, b: usize);
}

/// Factor scaling row totals into criterion terms, `1 / (row_count - 2)`.
pub(crate) fn total_scale<T: Real>(row_count: usize) -> T {
    T::ONE / T::from_usize(row_count.saturating_sub(2))
}

/// Neighbour-joining criterion from a distance and two scaled totals.
///
/// Every search evaluates pairs through this function so that a pair yields
/// the same bits whichever row it is reached from.
#[inline]
pub(crate) fn criterion<T: Real>(distance: T, scaled_a: T, scaled_b: T) -> T {
    distance - (scaled_a + scaled_b)
}
