//! Cluster trees produced by the joining engines and their Newick rendering.

use crate::Real;

/// Identifier of a cluster in a [`ClusterTree`].
///
/// Leaves occupy `0..leaf_count` in input order. Every join allocates the next
/// identifier, so identifiers grow monotonically with merge order.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ClusterId(usize);

impl ClusterId {
    /// Wraps a raw cluster index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw cluster index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Edge from a cluster to one of its children.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link<T> {
    /// The child cluster.
    pub child: ClusterId,
    /// Branch length to the child.
    pub length: T,
}

/// A node in a [`ClusterTree`]. Leaves carry no links.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster<T> {
    links: Vec<Link<T>>,
}

impl<T> Cluster<T> {
    /// Returns the child links in join order.
    #[must_use]
    pub fn links(&self) -> &[Link<T>] {
        &self.links
    }

    /// Returns `true` for input taxa.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.links.is_empty()
    }
}

/// Arena of clusters in creation order. The last cluster is the root.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterTree<T> {
    leaves: usize,
    clusters: Vec<Cluster<T>>,
}

impl<T: Real> ClusterTree<T> {
    pub(crate) fn with_leaves(leaves: usize) -> Self {
        let mut clusters = Vec::with_capacity(leaves.saturating_mul(2));
        clusters.resize_with(leaves, || Cluster { links: Vec::new() });
        Self { leaves, clusters }
    }

    /// Appends an internal cluster joining `links` and returns its identifier.
    pub(crate) fn join(&mut self, links: Vec<Link<T>>) -> ClusterId {
        let id = ClusterId(self.clusters.len());
        self.clusters.push(Cluster { links });
        id
    }

    /// Returns the number of input taxa.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaves
    }

    /// Returns the number of clusters, leaves included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Returns `true` when the tree holds no clusters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Returns the root cluster, or `None` for an empty tree.
    #[must_use]
    pub fn root(&self) -> Option<ClusterId> {
        self.clusters.len().checked_sub(1).map(ClusterId)
    }

    /// Looks up a cluster by identifier.
    #[must_use]
    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster<T>> {
        self.clusters.get(id.0)
    }

    /// Iterates over internal clusters in merge order.
    pub fn merges(&self) -> impl Iterator<Item = (ClusterId, &Cluster<T>)> + '_ {
        self.clusters
            .iter()
            .enumerate()
            .skip(self.leaves)
            .map(|(index, cluster)| (ClusterId(index), cluster))
    }

    /// Widens every branch length to double precision.
    #[must_use]
    pub fn to_f64(&self) -> ClusterTree<f64> {
        ClusterTree {
            leaves: self.leaves,
            clusters: self
                .clusters
                .iter()
                .map(|cluster| Cluster {
                    links: cluster
                        .links
                        .iter()
                        .map(|link| Link {
                            child: link.child,
                            length: link.length.to_f64(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Path lengths between every pair of leaves.
    #[must_use]
    pub fn leaf_distances(&self) -> Vec<Vec<T>> {
        let mut parent: Vec<Option<(usize, T)>> = vec![None; self.clusters.len()];
        for (index, cluster) in self.clusters.iter().enumerate() {
            for link in &cluster.links {
                parent[link.child.0] = Some((index, link.length));
            }
        }
        let mut distances = vec![vec![T::ZERO; self.leaves]; self.leaves];
        let mut depth_from_a: Vec<Option<T>> = vec![None; self.clusters.len()];
        for a in 0..self.leaves {
            depth_from_a.iter_mut().for_each(|slot| *slot = None);
            let mut node = a;
            let mut travelled = T::ZERO;
            depth_from_a[node] = Some(travelled);
            while let Some((up, length)) = parent[node] {
                travelled += length;
                node = up;
                depth_from_a[node] = Some(travelled);
            }
            for b in (a + 1)..self.leaves {
                let mut node = b;
                let mut travelled = T::ZERO;
                let total = loop {
                    if let Some(depth) = depth_from_a[node] {
                        break depth + travelled;
                    }
                    match parent[node] {
                        Some((up, length)) => {
                            travelled += length;
                            node = up;
                        }
                        None => break T::INFINITY,
                    }
                };
                distances[a][b] = total;
                distances[b][a] = total;
            }
        }
        distances
    }
}

/// A [`ClusterTree`] paired with its taxon labels.
#[derive(Clone, Debug, PartialEq)]
pub struct PhyloTree<T> {
    labels: Vec<String>,
    tree: ClusterTree<T>,
}

enum Step<T> {
    Visit { id: ClusterId, length: Option<T> },
    Separator,
    Close { length: Option<T> },
}

impl<T: Real> PhyloTree<T> {
    pub(crate) fn new(labels: Vec<String>, tree: ClusterTree<T>) -> Self {
        debug_assert_eq!(labels.len(), tree.leaf_count());
        Self { labels, tree }
    }

    /// Returns the taxon labels in input order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the underlying cluster tree.
    #[must_use]
    pub fn tree(&self) -> &ClusterTree<T> {
        &self.tree
    }

    /// Widens every branch length to double precision.
    #[must_use]
    pub fn to_f64(&self) -> PhyloTree<f64> {
        PhyloTree {
            labels: self.labels.clone(),
            tree: self.tree.to_f64(),
        }
    }

    /// Renders the tree in Newick format with `decimals` digits per branch length.
    ///
    /// The walk uses an explicit stack, so caterpillar trees of any depth are
    /// rendered without recursion.
    ///
    /// # Examples
    /// ```
    /// use boundjoin_core::{DistanceMatrix, JoinerBuilder};
    ///
    /// let matrix = DistanceMatrix::from_rows(
    ///     vec!["a".into(), "b".into()],
    ///     vec![vec![0.0, 2.0], vec![2.0, 0.0_f64]],
    /// )?;
    /// let tree = JoinerBuilder::new().build()?.run_matrix(matrix)?;
    /// assert_eq!(tree.to_newick(1), "(a:1.0,b:1.0);");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[must_use]
    pub fn to_newick(&self, decimals: usize) -> String {
        let mut out = String::new();
        let Some(root) = self.tree.root() else {
            out.push(';');
            return out;
        };
        let mut stack = vec![Step::Visit {
            id: root,
            length: None,
        }];
        while let Some(step) = stack.pop() {
            match step {
                Step::Visit { id, length } => {
                    let links = self
                        .tree
                        .cluster(id)
                        .map(Cluster::links)
                        .unwrap_or_default();
                    if links.is_empty() {
                        let label = self.labels.get(id.0).map_or("", String::as_str);
                        push_label(&mut out, label);
                        push_length(&mut out, length, decimals);
                        continue;
                    }
                    out.push('(');
                    stack.push(Step::Close { length });
                    for (position, link) in links.iter().enumerate().rev() {
                        stack.push(Step::Visit {
                            id: link.child,
                            length: Some(link.length),
                        });
                        if position > 0 {
                            stack.push(Step::Separator);
                        }
                    }
                }
                Step::Separator => out.push(','),
                Step::Close { length } => {
                    out.push(')');
                    push_length(&mut out, length, decimals);
                }
            }
        }
        out.push(';');
        out
    }
}

fn push_length<T: Real>(out: &mut String, length: Option<T>, decimals: usize) {
    if let Some(length) = length {
        out.push_str(&format!(":{:.*}", decimals, length.to_f64()));
    }
}

fn push_label(out: &mut String, label: &str) {
    let needs_quotes = label.is_empty()
        || label
            .chars()
            .any(|c| c.is_whitespace() || "()[]':;,".contains(c));
    if !needs_quotes {
        out.push_str(label);
        return;
    }
    out.push('\'');
    out.push_str(&label.replace('\'', "''"));
    out.push('\'');
}
