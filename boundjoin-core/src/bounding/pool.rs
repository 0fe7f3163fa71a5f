//! Fixed-size worker pool shared by every parallel region of a run.

use std::{num::NonZeroUsize, sync::Arc};

use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use tracing::{Dispatch, Span, dispatcher};

use crate::{JoinError, error::Result};

/// Rayon pool plus the item count below which regions stay sequential.
///
/// Cloning is cheap and shares the underlying threads.
#[derive(Clone, Debug)]
pub(crate) struct WorkerPool {
    pool: Arc<ThreadPool>,
    threads: usize,
    threshold: usize,
}

impl WorkerPool {
    /// Builds a pool of `threads` workers. Regions with at most
    /// `threads * per_thread` items run on the calling thread.
    pub(crate) fn new(threads: NonZeroUsize, per_thread: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.get())
            .thread_name(|index| format!("boundjoin-worker-{index}"))
            .build()
            .map_err(|error| JoinError::ThreadPool {
                message: Arc::from(error.to_string()),
            })?;
        Ok(Self {
            pool: Arc::new(pool),
            threads: threads.get(),
            threshold: threads.get().saturating_mul(per_thread),
        })
    }

    pub(crate) fn threads(&self) -> usize {
        self.threads
    }

    /// Returns `true` when a region over `items` should fan out.
    pub(crate) fn is_parallel(&self, items: usize) -> bool {
        items > self.threshold
    }

    /// Runs `op` inside the pool so nested rayon calls use its workers.
    ///
    /// The caller's subscriber and current span travel with `op`, so events
    /// raised on the worker stay attached to the calling context.
    pub(crate) fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        let dispatch = dispatcher::get_default(Dispatch::clone);
        let span = Span::current();
        self.pool
            .install(move || dispatcher::with_default(&dispatch, || span.in_scope(op)))
    }

    /// Splits `items` into one contiguous partition per worker and maps each.
    ///
    /// Results come back in partition order. Small inputs map as a single
    /// partition on the calling thread.
    pub(crate) fn map_partitions<I, R, F>(&self, items: &[I], map: F) -> Vec<R>
    where
        I: Sync,
        R: Send,
        F: Fn(&[I]) -> R + Sync + Send,
    {
        if !self.is_parallel(items.len()) {
            return vec![map(items)];
        }
        items
            .par_chunks(items.len().div_ceil(self.threads))
            .map(map)
            .collect()
    }
}
