//! Row storage and the neighbour-joining update shared by every formula.

use std::cmp::Ordering;

use rayon::prelude::*;
use tracing::{debug, instrument};

use super::{
    ClusteringEngine, JoinFormula, JoinOutcome, RowMinimum, criterion, duplicates, total_scale,
};
use crate::{
    DistanceMatrix, JoinError, Real,
    error::Result,
    matrix::SquareMatrix,
    tree::{ClusterId, ClusterTree, Link},
};

/// Formula for plain neighbour joining: merged distances are the unweighted
/// average of the two joined rows.
#[derive(Clone, Copy, Debug, Default)]
pub struct NjFormula;

impl<T: Real> JoinFormula<T> for NjFormula {
    const NAME: &'static str = "NJ";

    fn lambda(&self, _a: usize, _b: usize, _row_count: usize) -> T {
        T::HALF
    }

    fn join(&mut self, _a: usize, _b: usize, _lambda: T, _row_count: usize) {}

    fn remove_row(&mut self, _b: usize) {}
}

/// Neighbour-joining engine over a dense distance matrix.
///
/// The engine owns the distance rows, their totals and the growing cluster
/// tree. On its own it performs the classic cubic search through
/// [`NeighbourJoining::construct_tree`]; the bounding layer drives the same
/// engine with a pruned search instead.
#[derive(Clone, Debug)]
pub struct NeighbourJoining<T: Real, F = NjFormula> {
    distances: SquareMatrix<T>,
    row_totals: Vec<T>,
    row_to_cluster: Vec<usize>,
    tree: ClusterTree<T>,
    formula: F,
}

impl<T: Real> NeighbourJoining<T, NjFormula> {
    /// Creates a plain neighbour-joining engine. Labels are discarded.
    #[must_use]
    pub fn new(matrix: DistanceMatrix<T>) -> Self {
        let (_, distances, _) = matrix.into_parts();
        Self::from_parts(distances, NjFormula)
    }
}

impl<T: Real, F: JoinFormula<T>> NeighbourJoining<T, F> {
    pub(super) fn from_parts(distances: SquareMatrix<T>, formula: F) -> Self {
        let size = distances.size();
        let row_totals = (0..size)
            .map(|row| {
                distances
                    .row(row)
                    .iter()
                    .fold(T::ZERO, |total, &value| total + value)
            })
            .collect();
        Self {
            distances,
            row_totals,
            row_to_cluster: (0..size).collect(),
            tree: ClusterTree::with_leaves(size),
            formula,
        }
    }

    /// Builds the tree by repeatedly joining the global criterion minimum.
    ///
    /// # Errors
    /// Returns [`JoinError::InvariantViolation`] if no finite candidate exists
    /// while more than three rows remain.
    #[instrument(
        name = "core.naive_join",
        skip(self),
        fields(algorithm = F::NAME, taxa = self.row_count()),
    )]
    pub fn construct_tree(mut self) -> Result<ClusterTree<T>> {
        while self.row_count() > 3 {
            let best = self.minimum_entry();
            if !best.is_found() {
                return Err(JoinError::invariant(
                    "finite candidate",
                    format_args!("no finite pair among {} rows", self.row_count()),
                ));
            }
            self.cluster(best.column(), best.row())?;
        }
        debug!(clusters = self.cluster_count(), "resolving final rows");
        self.finish()
    }

    fn check_join(&self, a: usize, b: usize) -> Result<()> {
        let rows = self.row_count();
        if a < b && b < rows && rows >= 3 {
            return Ok(());
        }
        Err(JoinError::invariant(
            "join rows",
            format_args!("cannot join rows {a} and {b} with {rows} rows live"),
        ))
    }

    fn remove_row(&mut self, b: usize) -> Option<usize> {
        let last = self.row_count() - 1;
        self.distances.remove_row_and_column(b);
        self.formula.remove_row(b);
        self.row_to_cluster.swap_remove(b);
        self.row_totals.swap_remove(b);
        (b != last).then_some(last)
    }
}

impl<T: Real, F: JoinFormula<T>> ClusteringEngine<T> for NeighbourJoining<T, F> {
    fn algorithm_name(&self) -> &'static str {
        F::NAME
    }

    fn row_count(&self) -> usize {
        self.distances.size()
    }

    fn row(&self, row: usize) -> &[T] {
        self.distances.row(row)
    }

    fn row_totals(&self) -> &[T] {
        &self.row_totals
    }

    fn row_to_cluster(&self) -> &[usize] {
        &self.row_to_cluster
    }

    fn cluster_count(&self) -> usize {
        self.tree.len()
    }

    fn duplicate_groups(&self) -> Vec<Vec<usize>> {
        duplicates::identical_rows(self.row_count(), |row| self.row(row))
            .into_iter()
            .map(|group| group.into_iter().map(|row| self.row_to_cluster[row]).collect())
            .collect()
    }

    fn minimum_entry(&self) -> RowMinimum<T> {
        let rows = self.row_count();
        if rows < 3 {
            return RowMinimum::none(0);
        }
        let scale = total_scale::<T>(rows);
        let totals = &self.row_totals;
        let clusters = &self.row_to_cluster;
        (0..rows)
            .into_par_iter()
            .map(|row| {
                let scaled_row = totals[row] * scale;
                let cluster = clusters[row];
                // Each pair is scored once, in the row of its later cluster.
                // Ties keep the smaller distance, then the earlier cluster.
                self.distances.row(row)[..rows]
                    .iter()
                    .enumerate()
                    .filter(|&(column, _)| clusters[column] < cluster)
                    .map(|(column, &distance)| {
                        let value = criterion(distance, totals[column] * scale, scaled_row);
                        (value, distance, clusters[column], column)
                    })
                    .min_by(|left, right| {
                        left.0
                            .partial_cmp(&right.0)
                            .unwrap_or(Ordering::Equal)
                            .then_with(|| left.1.total_cmp(&right.1))
                            .then_with(|| left.2.cmp(&right.2))
                    })
                    .map_or(RowMinimum::none(row), |(value, _, _, column)| {
                        RowMinimum::pair(row, column, value)
                    })
            })
            .min()
            .unwrap_or(RowMinimum::none(0))
    }

    fn cluster(&mut self, a: usize, b: usize) -> Result<JoinOutcome> {
        self.check_join(a, b)?;
        let rows = self.row_count();
        let scale = total_scale::<T>(rows);
        let d_ab = self.distances.get(a, b);
        let fudge = (self.row_totals[a] - self.row_totals[b]) * T::HALF * scale;
        let length_a = d_ab * T::HALF + fudge;
        let length_b = d_ab * T::HALF - fudge;
        let lambda = self.formula.lambda(a, b, rows);
        let mu = T::ONE - lambda;
        let correction = -(lambda * length_a + mu * length_b);

        let mut merged_total = T::ZERO;
        for other in 0..rows {
            if other == a || other == b {
                continue;
            }
            let d_ai = self.distances.get(a, other);
            let d_bi = self.distances.get(b, other);
            let d_ci = lambda * d_ai + mu * d_bi + correction;
            self.distances.set_symmetric(a, other, d_ci);
            self.row_totals[other] += d_ci - d_ai - d_bi;
            merged_total += d_ci;
        }
        self.row_totals[a] = merged_total;
        self.formula.join(a, b, lambda, rows);

        let merged = self.tree.join(vec![
            Link {
                child: ClusterId::new(self.row_to_cluster[a]),
                length: length_a,
            },
            Link {
                child: ClusterId::new(self.row_to_cluster[b]),
                length: length_b,
            },
        ]);
        self.row_to_cluster[a] = merged.index();
        let moved = self.remove_row(b);
        Ok(JoinOutcome {
            merged: merged.index(),
            row: a,
            vacated: b,
            moved,
        })
    }

    fn finish(mut self) -> Result<ClusterTree<T>> {
        let d = |a: usize, b: usize| self.distances.get(a, b);
        let child = |row: usize| ClusterId::new(self.row_to_cluster[row]);
        let links = match self.row_count() {
            1 => return Ok(self.tree),
            2 => {
                let half = d(0, 1) * T::HALF;
                vec![
                    Link { child: child(0), length: half },
                    Link { child: child(1), length: half },
                ]
            }
            3 => {
                let (d01, d02, d12) = (d(0, 1), d(0, 2), d(1, 2));
                vec![
                    Link { child: child(0), length: (d01 + d02 - d12) * T::HALF },
                    Link { child: child(1), length: (d01 + d12 - d02) * T::HALF },
                    Link { child: child(2), length: (d02 + d12 - d01) * T::HALF },
                ]
            }
            rows => {
                return Err(JoinError::invariant(
                    "final rows",
                    format_args!("cannot resolve {rows} rows into a root"),
                ));
            }
        };
        self.tree.join(links);
        Ok(self.tree)
    }
}
