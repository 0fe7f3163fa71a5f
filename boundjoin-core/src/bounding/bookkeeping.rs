//! Per-cluster state consulted by the bounded search.
//!
//! Everything here is indexed by cluster id rather than row, because the
//! sorted rows refer to partners by cluster id. Clusters that have been
//! joined away keep their slot with a total of negative infinity, so any
//! criterion computed from them is positive infinity.

use crate::{Real, engine::total_scale};

#[derive(Clone, Debug)]
pub(crate) struct ClusterBook<T> {
    cluster_to_row: Vec<Option<usize>>,
    cluster_totals: Vec<T>,
    scaled_totals: Vec<T>,
    scaled_max_earlier: Vec<T>,
    live: usize,
}

impl<T: Real> ClusterBook<T> {
    pub(crate) fn new(row_to_cluster: &[usize], row_totals: &[T]) -> Self {
        let clusters = row_to_cluster.iter().copied().max().map_or(0, |max| max + 1);
        let mut book = Self {
            cluster_to_row: vec![None; clusters],
            cluster_totals: vec![T::NEG_INFINITY; clusters],
            scaled_totals: vec![T::NEG_INFINITY; clusters],
            scaled_max_earlier: vec![T::NEG_INFINITY; clusters],
            live: row_to_cluster.len(),
        };
        for (row, &cluster) in row_to_cluster.iter().enumerate() {
            book.cluster_to_row[cluster] = Some(row);
        }
        book.refresh_totals(row_to_cluster, row_totals);
        book
    }

    #[inline]
    pub(crate) fn is_live(&self, cluster: usize) -> bool {
        self.row_of(cluster).is_some()
    }

    #[inline]
    pub(crate) fn row_of(&self, cluster: usize) -> Option<usize> {
        self.cluster_to_row.get(cluster).copied().flatten()
    }

    #[inline]
    pub(crate) fn scaled_total(&self, cluster: usize) -> T {
        self.scaled_totals[cluster]
    }

    /// Largest scaled total among live clusters with a smaller id.
    #[inline]
    pub(crate) fn scaled_max_earlier(&self, cluster: usize) -> T {
        self.scaled_max_earlier[cluster]
    }

    pub(crate) fn live_count(&self) -> usize {
        self.live
    }

    pub(crate) fn cluster_count(&self) -> usize {
        self.cluster_to_row.len()
    }

    /// Records that `left` and `right` became `merged` in row `row`.
    ///
    /// `moved` names the cluster whose row was relocated into the vacated row,
    /// together with that row.
    pub(crate) fn record_join(
        &mut self,
        left: usize,
        right: usize,
        merged: usize,
        row: usize,
        moved: Option<(usize, usize)>,
    ) {
        for cluster in [left, right] {
            self.cluster_to_row[cluster] = None;
            self.cluster_totals[cluster] = T::NEG_INFINITY;
            self.scaled_totals[cluster] = T::NEG_INFINITY;
        }
        if let Some((cluster, to)) = moved {
            self.cluster_to_row[cluster] = Some(to);
        }
        if merged >= self.cluster_to_row.len() {
            let len = merged + 1;
            self.cluster_to_row.resize(len, None);
            self.cluster_totals.resize(len, T::NEG_INFINITY);
            self.scaled_totals.resize(len, T::NEG_INFINITY);
            self.scaled_max_earlier.resize(len, T::NEG_INFINITY);
        }
        self.cluster_to_row[merged] = Some(row);
        self.live -= 1;
    }

    /// Copies the engine's row totals onto the live clusters.
    pub(crate) fn refresh_totals(&mut self, row_to_cluster: &[usize], row_totals: &[T]) {
        for (&cluster, &total) in row_to_cluster.iter().zip(row_totals) {
            self.cluster_totals[cluster] = total;
        }
    }

    /// Recomputes scaled totals for `row_count` live rows, along with the
    /// running maximum over live clusters with smaller ids.
    pub(crate) fn rescale(&mut self, row_count: usize) {
        let scale = total_scale::<T>(row_count);
        let mut running = T::NEG_INFINITY;
        for cluster in 0..self.cluster_to_row.len() {
            let scaled = self.cluster_totals[cluster] * scale;
            self.scaled_totals[cluster] = scaled;
            self.scaled_max_earlier[cluster] = running;
            if self.cluster_to_row[cluster].is_some() && running < scaled {
                running = scaled;
            }
        }
    }
}
