//! PHYLIP distance-matrix provider implementing [`DistanceSource`].
//!
//! Reads the relaxed PHYLIP layout: a taxon count on the first line, then
//! one whitespace-separated label per taxon followed by its distances.
//! Square, lower-triangular and upper-triangular bodies are accepted.

mod errors;
mod parse;

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use boundjoin_core::{DistanceSource, SourceError};
use tracing::debug;

pub use errors::PhylipError;
pub use parse::PhylipShape;

/// A distance matrix read from PHYLIP text.
#[derive(Clone, Debug)]
pub struct PhylipMatrix {
    name: String,
    labels: Vec<String>,
    distances: Vec<f64>,
    shape: PhylipShape,
}

impl PhylipMatrix {
    /// Parses a matrix from `reader`.
    ///
    /// # Errors
    /// Returns [`PhylipError`] when the header, a row or a value is malformed,
    /// when rows are missing or trail the last taxon, or when reading fails.
    ///
    /// # Examples
    /// ```
    /// use std::io::Cursor;
    ///
    /// use boundjoin_core::DistanceSource;
    /// use boundjoin_providers_phylip::{PhylipMatrix, PhylipShape};
    ///
    /// let text = "3\nA\nB 2.0\nC 4.0 3.0\n";
    /// let matrix = PhylipMatrix::try_from_reader("demo", Cursor::new(text))?;
    /// assert_eq!(matrix.shape(), PhylipShape::Lower);
    /// assert_eq!(matrix.distance(0, 2)?, 4.0);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_from_reader<R: BufRead>(
        name: impl Into<String>,
        reader: R,
    ) -> Result<Self, PhylipError> {
        let name = name.into();
        let parsed = parse::parse(reader)?;
        debug!(
            data_source = %name,
            taxa = parsed.labels.len(),
            shape = ?parsed.shape,
            "PHYLIP matrix parsed",
        );
        Ok(Self {
            name,
            labels: parsed.labels,
            distances: parsed.distances,
            shape: parsed.shape,
        })
    }

    /// Opens and parses the file at `path`, naming the source after it.
    ///
    /// # Errors
    /// Returns [`PhylipError::Io`] when the file cannot be opened, otherwise
    /// as [`PhylipMatrix::try_from_reader`].
    pub fn try_from_path(path: impl AsRef<Path>) -> Result<Self, PhylipError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::try_from_reader(path.display().to_string(), BufReader::new(file))
    }

    /// Returns the taxon labels in file order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the body layout detected while parsing.
    #[must_use]
    pub fn shape(&self) -> PhylipShape {
        self.shape
    }

    fn check(&self, index: usize) -> Result<usize, SourceError> {
        if index < self.labels.len() {
            Ok(index)
        } else {
            Err(SourceError::OutOfBounds { index })
        }
    }
}

impl DistanceSource for PhylipMatrix {
    fn len(&self) -> usize {
        self.labels.len()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn label(&self, index: usize) -> Result<String, SourceError> {
        self.labels
            .get(index)
            .cloned()
            .ok_or(SourceError::OutOfBounds { index })
    }

    fn distance(&self, i: usize, j: usize) -> Result<f64, SourceError> {
        let row = self.check(i)?;
        let column = self.check(j)?;
        self.distances
            .get(row * self.labels.len() + column)
            .copied()
            .ok_or(SourceError::OutOfBounds { index: i.max(j) })
    }
}
