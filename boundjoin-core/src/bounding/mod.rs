//! Branch-and-bound acceleration of neighbour joining.
//!
//! [`BoundingMatrix`] drives any [`ClusteringEngine`] with a pruned search.
//! Each row keeps its distances to lower-numbered clusters sorted ascending,
//! so a row scan can stop as soon as the distance alone rules out beating
//! the best criterion seen so far. Joins are delegated to the engine, and the
//! sorted rows are kept in step with the engine's row layout.

mod bookkeeping;
mod pool;
mod scheduler;
mod search;
mod sorter;

use std::num::NonZeroUsize;

use tracing::{debug, info, instrument};

use self::{
    bookkeeping::ClusterBook,
    scheduler::ScanScratch,
    sorter::{SortMode, SortedRows},
};
use crate::{
    JoinError, Real,
    engine::{Bionj, ClusteringEngine, Nj},
    error::Result,
    tree::{ClusterId, ClusterTree},
};

pub(crate) use self::pool::WorkerPool;

/// Accelerated plain neighbour joining.
pub type RapidNj<T> = BoundingMatrix<T, Nj<T>>;

/// Accelerated BIONJ.
pub type RapidBionj<T> = BoundingMatrix<T, Bionj<T>>;

/// Tuning knobs for the bounded search.
///
/// None of these change the resulting tree; they only trade memory traffic
/// against pruning.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
/// use boundjoin_core::BoundingConfig;
///
/// let config = BoundingConfig::default()
///     .with_threads(NonZeroUsize::MIN)
///     .with_purge_fraction(1, 2);
/// assert_eq!(config.threads().get(), 1);
/// assert_eq!(config.purge_fraction(), (1, 2));
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoundingConfig {
    threads: NonZeroUsize,
    purge_fraction: (usize, usize),
    parallel_threshold_per_thread: usize,
    seed_bound_from_previous: bool,
    order_rows_by_previous: bool,
}

impl Default for BoundingConfig {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
            purge_fraction: (2, 3),
            parallel_threshold_per_thread: 128,
            seed_bound_from_previous: true,
            order_rows_by_previous: true,
        }
    }
}

impl BoundingConfig {
    /// Sets the worker count.
    #[must_use]
    pub fn with_threads(mut self, threads: NonZeroUsize) -> Self {
        self.threads = threads;
        self
    }

    /// Returns the worker count.
    #[must_use]
    pub fn threads(&self) -> NonZeroUsize {
        self.threads
    }

    /// Purges stale entries each time the row count falls to
    /// `numerator / denominator` of its value at the previous purge.
    #[must_use]
    pub fn with_purge_fraction(mut self, numerator: usize, denominator: usize) -> Self {
        self.purge_fraction = (numerator, denominator);
        self
    }

    /// Returns the purge fraction as `(numerator, denominator)`.
    #[must_use]
    pub fn purge_fraction(&self) -> (usize, usize) {
        self.purge_fraction
    }

    /// Sets how many items each worker must have before a region fans out.
    #[must_use]
    pub fn with_parallel_threshold_per_thread(mut self, items: usize) -> Self {
        self.parallel_threshold_per_thread = items;
        self
    }

    /// Returns the per-worker parallel threshold.
    #[must_use]
    pub fn parallel_threshold_per_thread(&self) -> usize {
        self.parallel_threshold_per_thread
    }

    /// Enables seeding each search with the previous minima re-evaluated.
    #[must_use]
    pub fn with_seed_bound_from_previous(mut self, enabled: bool) -> Self {
        self.seed_bound_from_previous = enabled;
        self
    }

    /// Enables scanning the rows of the previous best minima first.
    #[must_use]
    pub fn with_order_rows_by_previous(mut self, enabled: bool) -> Self {
        self.order_rows_by_previous = enabled;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let (numerator, denominator) = self.purge_fraction;
        if numerator == 0 || numerator >= denominator {
            return Err(JoinError::InvalidPurgeFraction {
                numerator,
                denominator,
            });
        }
        Ok(())
    }
}

/// Lifecycle of a [`BoundingMatrix`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Engine loaded; sorted rows not built yet.
    Initialized,
    /// Every row sorted; duplicates consolidated.
    FullySorted,
    /// At least one search step has run.
    Clustering,
    /// Stale entries are being dropped from the sorted rows.
    Purging,
    /// The tree has been resolved.
    Finalized,
}

/// One join performed by the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JoinRecord<T> {
    /// Cluster held by the lower row.
    pub left: ClusterId,
    /// Cluster held by the higher row.
    pub right: ClusterId,
    /// Newly created cluster.
    pub merged: ClusterId,
    /// Criterion value of the pair, or `None` for a duplicate consolidation.
    pub criterion: Option<T>,
}

/// Work counters for a run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SearchStats {
    /// Search iterations performed.
    pub iterations: usize,
    /// Sorted entries examined across all searches.
    pub entries_scanned: usize,
    /// Sorted entries present across all searches.
    pub entries_available: usize,
    /// Purges performed.
    pub purges: usize,
    /// Stale entries dropped by purges.
    pub entries_purged: usize,
    /// Joins made while consolidating identical rows.
    pub duplicates_merged: usize,
}

impl SearchStats {
    /// Fraction of available entries that the bound ruled out.
    #[must_use]
    pub fn pruning_ratio(&self) -> f64 {
        if self.entries_available == 0 {
            return 0.0;
        }
        1.0 - self.entries_scanned as f64 / self.entries_available as f64
    }
}

/// Branch-and-bound search layered over a [`ClusteringEngine`].
///
/// # Examples
/// ```
/// use boundjoin_core::{BoundingConfig, DistanceMatrix, Nj, RapidNj};
///
/// let matrix = DistanceMatrix::from_rows(
///     (0..4).map(|i| format!("t{i}")).collect(),
///     vec![
///         vec![0.0, 1.0, 4.0, 4.0],
///         vec![1.0, 0.0, 4.0, 4.0],
///         vec![4.0, 4.0, 0.0, 1.0],
///         vec![4.0, 4.0, 1.0, 0.0_f64],
///     ],
/// )?;
/// let rapid = RapidNj::new(Nj::new(matrix), BoundingConfig::default())?;
/// let tree = rapid.construct_tree()?;
/// assert_eq!(tree.leaf_count(), 4);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct BoundingMatrix<T: Real, E> {
    engine: E,
    config: BoundingConfig,
    pool: WorkerPool,
    sorted: SortedRows<T>,
    book: ClusterBook<T>,
    scratch: ScanScratch<T>,
    phase: Phase,
    next_purge: usize,
    stats: SearchStats,
}

impl<T: Real, E: ClusteringEngine<T>> BoundingMatrix<T, E> {
    /// Wraps `engine`, building a worker pool sized from `config`.
    ///
    /// # Errors
    /// Returns [`JoinError::InvalidPurgeFraction`] for an unusable purge
    /// fraction and [`JoinError::ThreadPool`] if the pool cannot start.
    pub fn new(engine: E, config: BoundingConfig) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.threads, config.parallel_threshold_per_thread)?;
        let rows = engine.row_count();
        Ok(Self {
            sorted: SortedRows::new(0),
            book: ClusterBook::new(&[], &[]),
            scratch: ScanScratch::default(),
            phase: Phase::Initialized,
            next_purge: purge_target(rows, config.purge_fraction),
            stats: SearchStats::default(),
            engine,
            config,
            pool,
        })
    }

    /// Returns the current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the wrapped engine.
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns the number of live rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.engine.row_count()
    }

    /// Returns the work counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Sorts every row and consolidates taxa with identical distance rows.
    ///
    /// Returns the consolidation joins. Calling it again is a no-op.
    ///
    /// # Errors
    /// Returns [`JoinError::InvariantViolation`] if a duplicate group names a
    /// cluster that is not live.
    pub fn prepare(&mut self) -> Result<Vec<JoinRecord<T>>> {
        let pool = self.pool.clone();
        pool.install(|| self.prepare_in_pool())
    }

    /// Runs one search and joins the winning pair.
    ///
    /// # Errors
    /// Returns [`JoinError::InvariantViolation`] when three or fewer rows
    /// remain, or when the bookkeeping and the engine disagree.
    pub fn step(&mut self) -> Result<JoinRecord<T>> {
        let pool = self.pool.clone();
        pool.install(|| {
            self.prepare_in_pool()?;
            self.step_in_pool()
        })
    }

    /// Joins until three rows remain and resolves the tree.
    ///
    /// # Errors
    /// Propagates any failure from [`BoundingMatrix::prepare`],
    /// [`BoundingMatrix::step`] or the engine's final resolution.
    #[instrument(
        name = "core.bounded_join",
        skip(self),
        fields(algorithm = self.engine.algorithm_name(), taxa = self.engine.row_count()),
    )]
    pub fn construct_tree(mut self) -> Result<ClusterTree<T>> {
        let pool = self.pool.clone();
        pool.install(move || {
            self.prepare_in_pool()?;
            while self.engine.row_count() > 3 {
                self.step_in_pool()?;
            }
            self.finish()
        })
    }

    fn prepare_in_pool(&mut self) -> Result<Vec<JoinRecord<T>>> {
        if self.phase != Phase::Initialized {
            return Ok(Vec::new());
        }
        let rows = self.engine.row_count();
        self.book = ClusterBook::new(self.engine.row_to_cluster(), self.engine.row_totals());
        self.sorted = SortedRows::new(rows);
        let engine = &self.engine;
        self.sorted
            .fill_all(&self.pool, engine.row_to_cluster(), |row| engine.row(row));
        self.phase = Phase::FullySorted;
        debug!(rows, threads = self.pool.threads(), "sorted rows built");

        let records = self.consolidate_duplicates()?;
        self.next_purge = purge_target(self.engine.row_count(), self.config.purge_fraction);
        Ok(records)
    }

    fn consolidate_duplicates(&mut self) -> Result<Vec<JoinRecord<T>>> {
        let mut records = Vec::new();
        'groups: for group in self.engine.duplicate_groups() {
            let Some((&first, rest)) = group.split_first() else {
                continue;
            };
            let mut accumulated = first;
            for &cluster in rest {
                if self.engine.row_count() <= 3 {
                    break 'groups;
                }
                let (Some(a), Some(b)) = (self.book.row_of(accumulated), self.book.row_of(cluster))
                else {
                    return Err(JoinError::invariant(
                        "duplicate clusters live",
                        format_args!("clusters {accumulated} and {cluster}"),
                    ));
                };
                let record = self.join_rows(a.min(b), a.max(b), None)?;
                accumulated = record.merged.index();
                records.push(record);
            }
        }
        self.stats.duplicates_merged = records.len();
        if !records.is_empty() {
            debug!(joins = records.len(), "identical rows consolidated");
        }
        Ok(records)
    }

    fn step_in_pool(&mut self) -> Result<JoinRecord<T>> {
        let rows = self.engine.row_count();
        if rows <= 3 {
            return Err(JoinError::invariant(
                "rows remaining",
                format_args!("search requested with {rows} rows"),
            ));
        }
        if self.book.live_count() != rows {
            return Err(JoinError::invariant(
                "live cluster count",
                format_args!("{} live clusters for {rows} rows", self.book.live_count()),
            ));
        }
        self.phase = Phase::Clustering;
        self.book.rescale(rows);
        let seed = scheduler::decide_scan_order(
            &mut self.scratch,
            &self.engine,
            &self.book,
            &self.pool,
            &self.config,
        );
        let outcome = search::search_rows(
            &self.engine,
            &self.sorted,
            &self.book,
            &self.pool,
            &mut self.scratch,
            seed,
        );
        let best = outcome.best;
        if !best.is_found() || best.row() >= rows {
            return Err(JoinError::invariant(
                "finite candidate",
                format_args!("no live pair found among {rows} rows"),
            ));
        }

        let available: usize = (0..rows).map(|row| self.sorted.len(row)).sum();
        self.stats.iterations += 1;
        self.stats.entries_scanned += outcome.scanned;
        self.stats.entries_available += available;
        record_iteration(outcome.scanned);

        let record = self.join_rows(best.column(), best.row(), Some(best.value()))?;
        self.purge_if_due();
        Ok(record)
    }

    fn join_rows(&mut self, a: usize, b: usize, criterion: Option<T>) -> Result<JoinRecord<T>> {
        let rows = self.engine.row_count();
        let row_to_cluster = self.engine.row_to_cluster();
        let (left, right) = (row_to_cluster[a], row_to_cluster[b]);
        if self.book.row_of(left) != Some(a) || self.book.row_of(right) != Some(b) {
            return Err(JoinError::invariant(
                "selected clusters live",
                format_args!("rows {a} and {b} hold clusters {left} and {right}"),
            ));
        }
        let last = rows - 1;
        let moved_cluster = (b != last).then(|| row_to_cluster[last]);

        let outcome = self.engine.cluster(a, b)?;
        let expected_move = (b != last).then_some(last);
        if outcome.row != a || outcome.vacated != b || outcome.moved != expected_move {
            return Err(JoinError::invariant(
                "engine row layout",
                format_args!("{outcome:?} for rows {a} and {b} of {rows}"),
            ));
        }

        self.book.record_join(
            left,
            right,
            outcome.merged,
            a,
            moved_cluster.map(|cluster| (cluster, b)),
        );
        self.sorted.remove_row(b);
        let mode = if self.pool.is_parallel(rows) {
            SortMode::Parallel
        } else {
            SortMode::Sequential
        };
        self.sorted.fill_row(
            a,
            self.engine.row(a),
            self.engine.row_to_cluster(),
            outcome.merged,
            mode,
        );
        self.book
            .refresh_totals(self.engine.row_to_cluster(), self.engine.row_totals());

        Ok(JoinRecord {
            left: ClusterId::new(left),
            right: ClusterId::new(right),
            merged: ClusterId::new(outcome.merged),
            criterion,
        })
    }

    fn purge_if_due(&mut self) {
        let rows = self.engine.row_count();
        if rows > self.next_purge {
            return;
        }
        self.phase = Phase::Purging;
        let dropped = self.sorted.purge(&self.pool, &self.book);
        self.stats.purges += 1;
        self.stats.entries_purged += dropped;
        self.next_purge = purge_target(rows, self.config.purge_fraction);
        record_purge();
        debug!(rows, dropped, next = self.next_purge, "purged stale entries");
        self.phase = Phase::Clustering;
    }

    fn finish(mut self) -> Result<ClusterTree<T>> {
        self.phase = Phase::Finalized;
        let stats = self.stats;
        info!(
            algorithm = self.engine.algorithm_name(),
            iterations = stats.iterations,
            entries_scanned = stats.entries_scanned,
            pruning_ratio = stats.pruning_ratio(),
            purges = stats.purges,
            duplicates = stats.duplicates_merged,
            "bounded search finished",
        );
        self.engine.finish()
    }
}

fn purge_target(rows: usize, (numerator, denominator): (usize, usize)) -> usize {
    rows.saturating_mul(numerator) / denominator.max(1)
}

#[cfg(feature = "metrics")]
fn record_iteration(scanned: usize) {
    metrics::counter!("boundjoin_iterations_total").increment(1);
    metrics::counter!("boundjoin_entries_scanned_total").increment(scanned as u64);
}

#[cfg(not(feature = "metrics"))]
fn record_iteration(_scanned: usize) {}

#[cfg(feature = "metrics")]
fn record_purge() {
    metrics::counter!("boundjoin_purges_total").increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_purge() {}

#[cfg(test)]
mod property;
