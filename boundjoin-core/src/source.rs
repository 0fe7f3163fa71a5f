//! Distance source abstractions consumed by [`crate::Joiner`].

use crate::error::SourceError;

/// Abstraction over a collection of taxa that can yield pairwise distances.
///
/// # Examples
/// ```
/// use boundjoin_core::{DistanceSource, SourceError};
///
/// struct Line(Vec<f64>);
///
/// impl DistanceSource for Line {
///     fn len(&self) -> usize { self.0.len() }
///     fn name(&self) -> &str { "line" }
///     fn label(&self, index: usize) -> Result<String, SourceError> {
///         self.0.get(index).map(|_| format!("t{index}")).ok_or(SourceError::OutOfBounds { index })
///     }
///     fn distance(&self, i: usize, j: usize) -> Result<f64, SourceError> {
///         let a = self.0.get(i).ok_or(SourceError::OutOfBounds { index: i })?;
///         let b = self.0.get(j).ok_or(SourceError::OutOfBounds { index: j })?;
///         Ok((a - b).abs())
///     }
/// }
///
/// let src = Line(vec![1.0, 2.0, 4.0]);
/// assert_eq!(src.len(), 3);
/// assert_eq!(src.distance(0, 2)?, 3.0);
/// assert_eq!(src.row(1)?, [1.0, 0.0, 2.0]);
/// assert_eq!(src.variance(0, 1)?, None);
/// # Ok::<(), SourceError>(())
/// ```
pub trait DistanceSource {
    /// Returns number of taxa in the source.
    fn len(&self) -> usize;

    /// Returns whether the source contains no taxa.
    #[must_use]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a human-readable name.
    fn name(&self) -> &str;

    /// Returns the label of a taxon.
    fn label(&self, index: usize) -> Result<String, SourceError>;

    /// Returns the distance between two taxa.
    fn distance(&self, i: usize, j: usize) -> Result<f64, SourceError>;

    /// Returns the variance estimate for a pair of taxa, if the source carries one.
    ///
    /// The default implementation reports no variance, in which case the
    /// bias-corrected variant falls back to the distances themselves.
    fn variance(&self, _i: usize, _j: usize) -> Result<Option<f64>, SourceError> {
        Ok(None)
    }

    /// Collects the full distance row of `index`.
    ///
    /// # Errors
    /// Returns any [`SourceError`] surfaced by [`DistanceSource::distance`].
    fn row(&self, index: usize) -> Result<Vec<f64>, SourceError> {
        (0..self.len())
            .map(|column| self.distance(index, column))
            .collect()
    }
}
