//! Tree construction entry point.
//!
//! Provides the [`Joiner`] runtime, which loads a distance source into a
//! validated matrix and dispatches to the configured algorithm.

use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::{
    BoundingConfig, DistanceMatrix, DistanceSource, Real, Result,
    bounding::{RapidBionj, RapidNj, WorkerPool},
    builder::Algorithm,
    engine::{Bionj, JoinFormula, NeighbourJoining, Nj},
    tree::{ClusterTree, PhyloTree},
};

/// Runs a configured tree-building algorithm.
///
/// # Examples
/// ```
/// use boundjoin_core::{DistanceSource, JoinerBuilder, SourceError};
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
/// let joiner = JoinerBuilder::new().with_threads(1).build()?;
/// let tree = joiner.run(&Line(vec![0.0, 1.0, 5.0, 6.0]))?;
/// assert_eq!(tree.labels().len(), 4);
/// assert_eq!(tree.tree().leaf_count(), 4);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Joiner {
    algorithm: Algorithm,
    config: BoundingConfig,
}

impl Joiner {
    pub(crate) fn new(algorithm: Algorithm, config: BoundingConfig) -> Self {
        Self { algorithm, config }
    }

    /// Returns the algorithm this joiner runs.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns the validated search configuration.
    #[must_use]
    pub fn config(&self) -> &BoundingConfig {
        &self.config
    }

    /// Builds a tree from `source` in double precision.
    ///
    /// # Errors
    /// Returns [`crate::JoinError::Source`] when the source fails,
    /// [`crate::JoinError::Matrix`] when its values are not a valid distance
    /// matrix, and [`crate::JoinError::ThreadPool`] or
    /// [`crate::JoinError::InvariantViolation`] when the run itself fails.
    pub fn run<S: DistanceSource + ?Sized>(&self, source: &S) -> Result<PhyloTree<f64>> {
        self.run_as::<f64, S>(source)
    }

    /// Builds a tree from `source` with element type `T`.
    ///
    /// # Errors
    /// As [`Joiner::run`].
    #[instrument(
        name = "core.run",
        err,
        skip(self, source),
        fields(
            data_source = %source.name(),
            taxa = source.len(),
            algorithm = self.algorithm.as_str(),
            precision = std::any::type_name::<T>(),
        ),
    )]
    pub fn run_as<T: Real, S: DistanceSource + ?Sized>(&self, source: &S) -> Result<PhyloTree<T>> {
        if source.is_empty() {
            warn!(data_source = source.name(), "distance source is empty");
        }
        let matrix = DistanceMatrix::<T>::from_source(source)?;
        self.construct(matrix)
    }

    /// Builds a tree from an already validated matrix.
    ///
    /// # Errors
    /// Returns [`crate::JoinError::ThreadPool`] or
    /// [`crate::JoinError::InvariantViolation`] when the run fails.
    #[instrument(
        name = "core.run_matrix",
        err,
        skip(self, matrix),
        fields(taxa = matrix.len(), algorithm = self.algorithm.as_str()),
    )]
    pub fn run_matrix<T: Real>(&self, matrix: DistanceMatrix<T>) -> Result<PhyloTree<T>> {
        self.construct(matrix)
    }

    fn construct<T: Real>(&self, matrix: DistanceMatrix<T>) -> Result<PhyloTree<T>> {
        let labels = matrix.labels().to_vec();
        let started = Instant::now();
        let tree = match self.algorithm {
            Algorithm::Nj => self.naive(Nj::new(matrix))?,
            Algorithm::Bionj => self.naive(Bionj::new(matrix))?,
            Algorithm::RapidNj => {
                RapidNj::new(Nj::new(matrix), self.config.clone())?.construct_tree()?
            }
            Algorithm::RapidBionj => {
                RapidBionj::new(Bionj::new(matrix), self.config.clone())?.construct_tree()?
            }
        };
        info!(
            taxa = labels.len(),
            algorithm = self.algorithm.as_str(),
            elapsed = ?started.elapsed(),
            "tree constructed",
        );
        Ok(PhyloTree::new(labels, tree))
    }

    fn naive<T: Real, F: JoinFormula<T>>(
        &self,
        engine: NeighbourJoining<T, F>,
    ) -> Result<ClusterTree<T>> {
        let pool = WorkerPool::new(
            self.config.threads(),
            self.config.parallel_threshold_per_thread(),
        )?;
        pool.install(move || engine.construct_tree())
    }
}
