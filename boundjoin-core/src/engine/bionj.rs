//! BIONJ: neighbour joining weighted by a variance matrix.

use super::{JoinFormula, NeighbourJoining};
use crate::{DistanceMatrix, Real, matrix::SquareMatrix};

/// Formula that picks the merge weight minimising the variance of the new
/// distances, and keeps the variance matrix in step with the distances.
#[derive(Clone, Debug)]
pub struct BionjFormula<T: Real> {
    variances: SquareMatrix<T>,
}

impl<T: Real> NeighbourJoining<T, BionjFormula<T>> {
    /// Creates a BIONJ engine. Without an attached variance matrix the
    /// distances double as variances. Labels are discarded.
    #[must_use]
    pub fn new(matrix: DistanceMatrix<T>) -> Self {
        let (_, distances, variances) = matrix.into_parts();
        let variances = variances.unwrap_or_else(|| distances.clone());
        Self::from_parts(distances, BionjFormula { variances })
    }
}

impl<T: Real> JoinFormula<T> for BionjFormula<T> {
    const NAME: &'static str = "BIONJ";

    fn lambda(&self, a: usize, b: usize, row_count: usize) -> T {
        let v_ab = self.variances.get(a, b);
        if v_ab == T::ZERO || row_count < 3 {
            return T::HALF;
        }
        let row_a = self.variances.row(a);
        let row_b = self.variances.row(b);
        let mut spread = T::ZERO;
        for other in 0..row_count {
            if other != a && other != b {
                spread += row_b[other] - row_a[other];
            }
        }
        let lambda = T::HALF + spread / (T::from_usize(2 * (row_count - 2)) * v_ab);
        if lambda < T::ZERO {
            T::ZERO
        } else if lambda > T::ONE {
            T::ONE
        } else {
            lambda
        }
    }

    fn join(&mut self, a: usize, b: usize, lambda: T, row_count: usize) {
        let mu = T::ONE - lambda;
        let shared = lambda * mu * self.variances.get(a, b);
        for other in 0..row_count {
            if other == a || other == b {
                continue;
            }
            let v_ci =
                lambda * self.variances.get(a, other) + mu * self.variances.get(b, other) - shared;
            self.variances.set_symmetric(a, other, v_ci);
        }
    }

    fn remove_row(&mut self, b: usize) {
        self.variances.remove_row_and_column(b);
    }
}
