//! Pairs a distance matrix with a variance matrix read from a second file.

use boundjoin_core::{DistanceSource, SourceError};

/// A [`DistanceSource`] whose variances come from a second source.
///
/// Both sources must describe the same taxa in the same order; the caller
/// checks that before pairing them.
pub struct VarianceSource<D, V> {
    distances: D,
    variances: V,
}

impl<D: DistanceSource, V: DistanceSource> VarianceSource<D, V> {
    /// Pairs `distances` with `variances`.
    #[must_use]
    pub fn new(distances: D, variances: V) -> Self {
        Self {
            distances,
            variances,
        }
    }
}

impl<D: DistanceSource, V: DistanceSource> DistanceSource for VarianceSource<D, V> {
    fn len(&self) -> usize {
        self.distances.len()
    }

    fn name(&self) -> &str {
        self.distances.name()
    }

    fn label(&self, index: usize) -> Result<String, SourceError> {
        self.distances.label(index)
    }

    fn distance(&self, i: usize, j: usize) -> Result<f64, SourceError> {
        self.distances.distance(i, j)
    }

    fn variance(&self, i: usize, j: usize) -> Result<Option<f64>, SourceError> {
        self.variances.distance(i, j).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use boundjoin_providers_phylip::PhylipMatrix;

    use super::*;

    fn phylip(name: &str, text: &str) -> PhylipMatrix {
        PhylipMatrix::try_from_reader(name, Cursor::new(text)).expect("matrix must parse")
    }

    #[test]
    fn variances_come_from_the_second_source() {
        let source = VarianceSource::new(
            phylip("distances", "2\na\nb 4.0\n"),
            phylip("variances", "2\na\nb 0.5\n"),
        );
        assert_eq!(source.name(), "distances");
        assert_eq!(source.distance(0, 1), Ok(4.0));
        assert_eq!(source.variance(1, 0), Ok(Some(0.5)));
        assert_eq!(
            source.variance(0, 2),
            Err(SourceError::OutOfBounds { index: 2 })
        );
    }
}
