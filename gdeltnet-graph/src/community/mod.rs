// Copyright 2025 The gdeltnet Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Community detection
//!
//! A [`CommunityAlgorithm`] turns a graph into a [`Partition`]. The available
//! algorithms form a closed set selected by [`CommunityAlgorithmKind`]:
//!
//! - `louvain`: greedy modularity optimisation with graph aggregation
//! - `walktrap`: agglomeration driven by random-walk distances
//!
//! [`CommunityDetector`] filters the partition and elects one representative
//! per retained community.

mod detector;
mod louvain;
mod walktrap;

pub use detector::{CommunityDetector, CommunityRecord};
pub use louvain::Louvain;
pub use walktrap::Walktrap;

use crate::graph::WeightedGraph;
use gdeltnet_core::{AnalysisConfig, CommunityAlgorithmKind};
use std::collections::BTreeSet;

/// Disjoint communities of node indices.
///
/// Communities are sorted by their smallest member and members are sorted,
/// so equal partitions compare equal regardless of how they were produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partition {
    communities: Vec<Vec<usize>>,
}

impl Partition {
    pub fn new(communities: Vec<Vec<usize>>) -> Self {
        let mut communities: Vec<Vec<usize>> = communities
            .into_iter()
            .filter(|c| !c.is_empty())
            .map(|mut c| {
                c.sort_unstable();
                c.dedup();
                c
            })
            .collect();
        communities.sort_by_key(|c| c[0]);
        Self { communities }
    }

    /// Every node in its own community.
    pub fn singletons(n: usize) -> Self {
        Self {
            communities: (0..n).map(|u| vec![u]).collect(),
        }
    }

    /// Group nodes by label; `labels[u]` is the community of node `u`.
    pub fn from_labels(labels: &[usize]) -> Self {
        let mut groups: std::collections::BTreeMap<usize, Vec<usize>> = Default::default();
        for (node, &label) in labels.iter().enumerate() {
            groups.entry(label).or_default().push(node);
        }
        Self::new(groups.into_values().collect())
    }

    pub fn communities(&self) -> &[Vec<usize>] {
        &self.communities
    }

    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    /// Nodes covered by some community.
    pub fn covered(&self) -> BTreeSet<usize> {
        self.communities.iter().flatten().copied().collect()
    }

    /// Community label of every node; uncovered nodes get `None`.
    pub fn labels(&self, n: usize) -> Vec<Option<usize>> {
        let mut labels = vec![None; n];
        for (c, members) in self.communities.iter().enumerate() {
            for &u in members {
                if u < n {
                    labels[u] = Some(c);
                }
            }
        }
        labels
    }

    /// Newman modularity with resolution `gamma`:
    /// `sum_c [ L_c / m - gamma * (d_c / 2m)^2 ]`. 0 on a graph without edges.
    pub fn modularity(&self, graph: &dyn WeightedGraph, gamma: f64) -> f64 {
        let m = graph.total_weight();
        if m <= 0.0 {
            return 0.0;
        }
        let labels = self.labels(graph.node_count());
        let mut internal = vec![0.0; self.communities.len()];
        let mut degree = vec![0.0; self.communities.len()];
        for u in 0..graph.node_count() {
            let Some(cu) = labels[u] else { continue };
            for &(v, w) in graph.neighbors(u) {
                degree[cu] += w;
                if u < v && labels[v] == Some(cu) {
                    internal[cu] += w;
                }
            }
        }
        internal
            .iter()
            .zip(&degree)
            .map(|(l, d)| l / m - gamma * (d / (2.0 * m)).powi(2))
            .sum()
    }
}

/// A community detection algorithm.
pub trait CommunityAlgorithm: Send + Sync {
    fn name(&self) -> &'static str;

    fn detect(&self, graph: &dyn WeightedGraph) -> Partition;
}

/// Algorithm selected by `config.community_algorithm`.
pub fn algorithm_for(config: &AnalysisConfig) -> Box<dyn CommunityAlgorithm> {
    match config.community_algorithm {
        CommunityAlgorithmKind::Louvain => Box::new(Louvain::new(config.louvain)),
        CommunityAlgorithmKind::Walktrap => Box::new(Walktrap::new(config.walktrap)),
    }
}
