//! Validated distance matrices and their contiguous row storage.

use std::sync::Arc;

use crate::{
    Real,
    error::{JoinError, MatrixError, SourceError},
    source::DistanceSource,
};

/// Square matrix stored as one contiguous buffer with a fixed row stride.
///
/// Only the leading `size × size` block is live. Removing a row moves the
/// last live row (and column) into the vacated slot, so the buffer is never
/// reallocated while clustering.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SquareMatrix<T> {
    stride: usize,
    size: usize,
    data: Vec<T>,
}

impl<T: Real> SquareMatrix<T> {
    pub(crate) fn from_flat(size: usize, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), size.saturating_mul(size));
        Self {
            stride: size,
            size,
            data,
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub(crate) fn get(&self, row: usize, column: usize) -> T {
        self.data[row * self.stride + column]
    }

    #[inline]
    pub(crate) fn set_symmetric(&mut self, row: usize, column: usize, value: T) {
        self.data[row * self.stride + column] = value;
        self.data[column * self.stride + row] = value;
    }

    #[inline]
    pub(crate) fn row(&self, row: usize) -> &[T] {
        let start = row * self.stride;
        &self.data[start..start + self.size]
    }

    /// Drops row and column `index`, moving the last live row and column into
    /// their place.
    pub(crate) fn remove_row_and_column(&mut self, index: usize) {
        let last = self.size - 1;
        if index != last {
            let source = last * self.stride;
            self.data
                .copy_within(source..source + self.size, index * self.stride);
            for row in 0..self.size {
                let base = row * self.stride;
                self.data[base + index] = self.data[base + last];
            }
        }
        self.size = last;
    }
}

/// A validated, exactly symmetric distance matrix with taxon labels and an
/// optional variance matrix.
///
/// # Examples
/// ```
/// use boundjoin_core::DistanceMatrix;
///
/// let matrix = DistanceMatrix::from_rows(
///     vec!["a".into(), "b".into(), "c".into()],
///     vec![
///         vec![0.0, 2.0, 4.0],
///         vec![2.0, 0.0, 3.0],
///         vec![4.0, 3.0, 0.0_f64],
///     ],
/// )?;
/// assert_eq!(matrix.len(), 3);
/// assert_eq!(matrix.distance(2, 1), Some(3.0));
/// # Ok::<(), boundjoin_core::MatrixError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrix<T: Real> {
    labels: Vec<String>,
    distances: SquareMatrix<T>,
    variances: Option<SquareMatrix<T>>,
}

impl<T: Real> DistanceMatrix<T> {
    /// Validates `rows` and builds a matrix.
    ///
    /// Mirrored entries that differ are replaced by their mean so the stored
    /// matrix is exactly symmetric.
    ///
    /// # Errors
    /// Returns [`MatrixError::Empty`] for zero rows,
    /// [`MatrixError::LabelCountMismatch`] when labels and rows disagree,
    /// [`MatrixError::NotSquare`] for ragged rows, [`MatrixError::NonFinite`]
    /// for NaN or infinite entries and [`MatrixError::NonZeroDiagonal`] when a
    /// self-distance is not zero.
    pub fn from_rows(labels: Vec<String>, rows: Vec<Vec<T>>) -> Result<Self, MatrixError> {
        if rows.is_empty() {
            return Err(MatrixError::Empty);
        }
        if labels.len() != rows.len() {
            return Err(MatrixError::LabelCountMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }
        let distances = validated_square(&rows)?;
        Ok(Self {
            labels,
            distances,
            variances: None,
        })
    }

    /// Attaches a variance matrix used by the bias-corrected variant.
    ///
    /// # Errors
    /// Returns [`MatrixError::VarianceShapeMismatch`] when the row count
    /// differs, plus the same validation errors as [`Self::from_rows`].
    pub fn with_variances(mut self, rows: Vec<Vec<T>>) -> Result<Self, MatrixError> {
        if rows.len() != self.len() {
            return Err(MatrixError::VarianceShapeMismatch {
                expected: self.len(),
                actual: rows.len(),
            });
        }
        self.variances = Some(validated_square(&rows)?);
        Ok(self)
    }

    /// Loads every distance (and variance, when present) from a
    /// [`DistanceSource`].
    ///
    /// A variance the source leaves undefined in one direction is taken from
    /// the mirrored entry. Pairs undefined in both directions fall back to
    /// the distance.
    ///
    /// # Errors
    /// Returns [`JoinError::Source`] when the source fails and
    /// [`JoinError::Matrix`] when the loaded values fail validation.
    pub fn from_source<S: DistanceSource + ?Sized>(source: &S) -> Result<Self, JoinError> {
        let wrap = |error: SourceError| JoinError::Source {
            data_source: Arc::from(source.name()),
            error,
        };
        let count = source.len();
        let labels = (0..count)
            .map(|index| source.label(index))
            .collect::<Result<Vec<_>, _>>()
            .map_err(wrap)?;
        let mut raw_rows = Vec::with_capacity(count);
        let mut reported = Vec::with_capacity(count);
        for row in 0..count {
            let distances = source.row(row).map_err(wrap)?;
            let variance_row = (0..distances.len())
                .map(|column| source.variance(row, column))
                .collect::<Result<Vec<_>, _>>()
                .map_err(wrap)?;
            raw_rows.push(distances);
            reported.push(variance_row);
        }
        let any_variance = reported.iter().flatten().any(Option::is_some);
        let variances = resolve_variances(&raw_rows, &reported);
        let rows = raw_rows
            .into_iter()
            .map(|row| row.into_iter().map(T::from_f64).collect())
            .collect();
        let matrix = Self::from_rows(labels, rows)?;
        if any_variance {
            Ok(matrix.with_variances(variances)?)
        } else {
            Ok(matrix)
        }
    }

    /// Returns the number of taxa.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` when the matrix has no taxa. Validated matrices are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns the taxon labels in row order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the distance between two taxa, or `None` when out of range.
    #[must_use]
    pub fn distance(&self, row: usize, column: usize) -> Option<T> {
        (row < self.len() && column < self.len()).then(|| self.distances.get(row, column))
    }

    /// Returns the variance between two taxa when a variance matrix is attached.
    #[must_use]
    pub fn variance(&self, row: usize, column: usize) -> Option<T> {
        let variances = self.variances.as_ref()?;
        (row < self.len() && column < self.len()).then(|| variances.get(row, column))
    }

    /// Returns `true` when a variance matrix is attached.
    #[must_use]
    pub fn has_variances(&self) -> bool {
        self.variances.is_some()
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, SquareMatrix<T>, Option<SquareMatrix<T>>) {
        (self.labels, self.distances, self.variances)
    }
}

fn resolve_variances<T: Real>(
    distances: &[Vec<f64>],
    reported: &[Vec<Option<f64>>],
) -> Vec<Vec<T>> {
    let reported_at = |row: usize, column: usize| {
        reported
            .get(row)
            .and_then(|values| values.get(column))
            .copied()
            .flatten()
    };
    distances
        .iter()
        .enumerate()
        .map(|(row, values)| {
            values
                .iter()
                .enumerate()
                .map(|(column, &distance)| {
                    let variance = reported_at(row, column)
                        .or_else(|| reported_at(column, row))
                        .unwrap_or(distance);
                    T::from_f64(variance)
                })
                .collect()
        })
        .collect()
}

fn validated_square<T: Real>(rows: &[Vec<T>]) -> Result<SquareMatrix<T>, MatrixError> {
    let size = rows.len();
    let mut data = Vec::with_capacity(size.saturating_mul(size));
    for (row, values) in rows.iter().enumerate() {
        if values.len() != size {
            return Err(MatrixError::NotSquare {
                row,
                expected: size,
                actual: values.len(),
            });
        }
        for (column, value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err(MatrixError::NonFinite { row, column });
            }
        }
        let diagonal = values[row];
        if diagonal != T::ZERO {
            return Err(MatrixError::NonZeroDiagonal {
                index: row,
                value: diagonal.to_f64(),
            });
        }
        data.extend_from_slice(values);
    }
    let mut matrix = SquareMatrix::from_flat(size, data);
    for row in 0..size {
        for column in 0..row {
            let upper = matrix.get(column, row);
            let lower = matrix.get(row, column);
            if upper != lower {
                matrix.set_symmetric(row, column, (upper + lower) * T::HALF);
            }
        }
    }
    Ok(matrix)
}
