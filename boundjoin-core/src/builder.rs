//! Builder utilities for configuring tree construction.
//!
//! Exposes the algorithm selection surface and the validation performed
//! before a [`Joiner`] is constructed.

use std::num::NonZeroUsize;

use crate::{BoundingConfig, Result, error::JoinError, joiner::Joiner};

/// Tree-building algorithm run by a [`Joiner`].
///
/// The accelerated variants produce exactly the trees their naive
/// counterparts produce; they only examine fewer matrix entries.
///
/// # Examples
/// ```
/// use boundjoin_core::Algorithm;
///
/// assert_eq!(Algorithm::default(), Algorithm::RapidNj);
/// assert!(Algorithm::RapidBionj.is_bounded());
/// assert!(!Algorithm::Bionj.is_bounded());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Neighbour joining with a full scan per join.
    Nj,
    /// BIONJ with a full scan per join.
    Bionj,
    /// Neighbour joining with the branch-and-bound search.
    #[default]
    RapidNj,
    /// BIONJ with the branch-and-bound search.
    RapidBionj,
}

impl Algorithm {
    /// Returns `true` for the branch-and-bound variants.
    #[must_use]
    pub const fn is_bounded(self) -> bool {
        matches!(self, Self::RapidNj | Self::RapidBionj)
    }

    /// Returns the name used in logs and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nj => "nj",
            Self::Bionj => "bionj",
            Self::RapidNj => "rapid-nj",
            Self::RapidBionj => "rapid-bionj",
        }
    }
}

/// Configures and constructs [`Joiner`] instances.
///
/// # Examples
/// ```
/// use boundjoin_core::{Algorithm, JoinerBuilder};
///
/// let joiner = JoinerBuilder::new()
///     .with_algorithm(Algorithm::RapidBionj)
///     .with_threads(2)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(joiner.algorithm(), Algorithm::RapidBionj);
/// assert_eq!(joiner.config().threads().get(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct JoinerBuilder {
    algorithm: Algorithm,
    threads: Option<usize>,
    config: BoundingConfig,
}

impl Default for JoinerBuilder {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            threads: None,
            config: BoundingConfig::default(),
        }
    }
}

impl JoinerBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use boundjoin_core::{Algorithm, JoinerBuilder};
    ///
    /// let builder = JoinerBuilder::new();
    /// assert_eq!(builder.algorithm(), Algorithm::RapidNj);
    /// assert_eq!(builder.purge_fraction(), (2, 3));
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Returns the configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Overrides the worker count. Zero is rejected by [`JoinerBuilder::build`].
    ///
    /// # Examples
    /// ```
    /// use boundjoin_core::JoinerBuilder;
    ///
    /// let builder = JoinerBuilder::new().with_threads(4);
    /// assert_eq!(builder.threads(), Some(4));
    /// ```
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Returns the explicitly requested worker count, if any.
    #[must_use]
    pub fn threads(&self) -> Option<usize> {
        self.threads
    }

    /// Purges stale sorted entries each time the row count falls to
    /// `numerator / denominator` of its value at the previous purge.
    #[must_use]
    pub fn with_purge_fraction(mut self, numerator: usize, denominator: usize) -> Self {
        self.config = self.config.with_purge_fraction(numerator, denominator);
        self
    }

    /// Returns the purge fraction as `(numerator, denominator)`.
    #[must_use]
    pub fn purge_fraction(&self) -> (usize, usize) {
        self.config.purge_fraction()
    }

    /// Sets how many items each worker must have before a region fans out.
    #[must_use]
    pub fn with_parallel_threshold_per_thread(mut self, items: usize) -> Self {
        self.config = self.config.with_parallel_threshold_per_thread(items);
        self
    }

    /// Enables or disables seeding each search from the previous minima.
    #[must_use]
    pub fn with_seed_bound_from_previous(mut self, enabled: bool) -> Self {
        self.config = self.config.with_seed_bound_from_previous(enabled);
        self
    }

    /// Enables or disables scanning the previous best rows first.
    #[must_use]
    pub fn with_order_rows_by_previous(mut self, enabled: bool) -> Self {
        self.config = self.config.with_order_rows_by_previous(enabled);
        self
    }

    /// Validates the configuration and constructs a [`Joiner`].
    ///
    /// # Errors
    /// Returns [`JoinError::InvalidThreadCount`] when zero threads were
    /// requested and [`JoinError::InvalidPurgeFraction`] when the purge
    /// fraction does not lie strictly between zero and one.
    ///
    /// # Examples
    /// ```
    /// use boundjoin_core::{JoinErrorCode, JoinerBuilder};
    ///
    /// let err = JoinerBuilder::new().with_threads(0).build().unwrap_err();
    /// assert_eq!(err.code(), JoinErrorCode::InvalidThreadCount);
    /// ```
    pub fn build(self) -> Result<Joiner> {
        let mut config = self.config;
        if let Some(got) = self.threads {
            let threads = NonZeroUsize::new(got).ok_or(JoinError::InvalidThreadCount { got })?;
            config = config.with_threads(threads);
        }
        config.validate()?;
        Ok(Joiner::new(self.algorithm, config))
    }
}
