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

//! Louvain modularity optimisation.
//!
//! Each level moves nodes one at a time to the neighbouring community with
//! the best modularity gain until no move helps, then collapses every
//! community into a single node (internal weight becomes a self-loop) and
//! repeats. Stops when a level gains no more than `threshold` modularity.

use super::{CommunityAlgorithm, Partition};
use crate::graph::WeightedGraph;
use gdeltnet_core::LouvainConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::debug;

/// Louvain community detection.
///
/// Node visiting order is shuffled by a `StdRng` seeded from
/// `LouvainConfig::seed`, so a given seed always yields the same partition.
/// Partitions are not comparable with other Louvain implementations run
/// with the same seed number: their random streams differ, and on graphs
/// without a clear community structure the resulting partitions may too.
#[derive(Debug, Clone, Copy, Default)]
pub struct Louvain {
    config: LouvainConfig,
}

impl Louvain {
    pub fn new(config: LouvainConfig) -> Self {
        Self { config }
    }
}

/// Working graph of one aggregation level.
struct LevelGraph {
    /// Neighbours without self-loops.
    nbrs: Vec<Vec<(usize, f64)>>,
    self_loop: Vec<f64>,
    /// Weighted degree, self-loop counted twice.
    degree: Vec<f64>,
}

impl LevelGraph {
    fn from_graph(graph: &dyn WeightedGraph) -> Self {
        let n = graph.node_count();
        let nbrs: Vec<Vec<(usize, f64)>> = (0..n).map(|u| graph.neighbors(u).to_vec()).collect();
        let degree = nbrs
            .iter()
            .map(|list| list.iter().map(|(_, w)| w).sum())
            .collect();
        Self {
            nbrs,
            self_loop: vec![0.0; n],
            degree,
        }
    }

    fn len(&self) -> usize {
        self.nbrs.len()
    }

    /// Collapse nodes with the same label (labels are `0..k`).
    fn aggregate(&self, labels: &[usize], k: usize) -> Self {
        let mut self_loop = vec![0.0; k];
        let mut edges: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); k];
        for u in 0..self.len() {
            let cu = labels[u];
            self_loop[cu] += self.self_loop[u];
            for &(v, w) in &self.nbrs[u] {
                if u >= v {
                    continue;
                }
                let cv = labels[v];
                if cu == cv {
                    self_loop[cu] += w;
                } else {
                    *edges[cu].entry(cv).or_insert(0.0) += w;
                    *edges[cv].entry(cu).or_insert(0.0) += w;
                }
            }
        }
        let nbrs: Vec<Vec<(usize, f64)>> = edges.into_iter().map(|e| e.into_iter().collect()).collect();
        let degree = nbrs
            .iter()
            .zip(&self_loop)
            .map(|(list, l)| list.iter().map(|(_, w)| w).sum::<f64>() + 2.0 * l)
            .collect();
        Self {
            nbrs,
            self_loop,
            degree,
        }
    }

    fn modularity(&self, labels: &[usize], k: usize, m: f64, gamma: f64) -> f64 {
        let mut internal = vec![0.0; k];
        let mut degree = vec![0.0; k];
        for u in 0..self.len() {
            let cu = labels[u];
            internal[cu] += self.self_loop[u];
            degree[cu] += self.degree[u];
            for &(v, w) in &self.nbrs[u] {
                if u < v && labels[v] == cu {
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

/// One level of local moves. Returns compact labels `0..k`, `k`, and
/// whether any node moved.
fn one_level(level: &LevelGraph, m: f64, gamma: f64, rng: &mut StdRng) -> (Vec<usize>, usize, bool) {
    let n = level.len();
    let mut node2com: Vec<usize> = (0..n).collect();
    let mut stot = level.degree.clone();
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let two_m_sq = 2.0 * m * m;
    let mut weights = vec![0.0; n];
    let mut touched: Vec<usize> = Vec::new();
    let mut improved = false;

    loop {
        let mut moves = 0;
        for &u in &order {
            let degree = level.degree[u];
            let current = node2com[u];

            for &(v, w) in &level.nbrs[u] {
                let c = node2com[v];
                if weights[c] == 0.0 && !touched.contains(&c) {
                    touched.push(c);
                }
                weights[c] += w;
            }

            stot[current] -= degree;
            let remove_cost = -weights[current] / m + gamma * (stot[current] * degree) / two_m_sq;
            let mut best = current;
            let mut best_gain = 0.0;
            for &c in &touched {
                let gain = remove_cost + weights[c] / m - gamma * (stot[c] * degree) / two_m_sq;
                if gain > best_gain {
                    best_gain = gain;
                    best = c;
                }
            }
            stot[best] += degree;

            for &c in &touched {
                weights[c] = 0.0;
            }
            touched.clear();

            if best != current {
                node2com[u] = best;
                improved = true;
                moves += 1;
            }
        }
        if moves == 0 {
            break;
        }
    }

    // Renumber the surviving communities in ascending order of their id.
    let mut compact = vec![usize::MAX; n];
    let mut k = 0;
    for c in 0..n {
        if node2com.contains(&c) {
            compact[c] = k;
            k += 1;
        }
    }
    let labels = node2com.iter().map(|&c| compact[c]).collect();
    (labels, k, improved)
}

impl CommunityAlgorithm for Louvain {
    fn name(&self) -> &'static str {
        "louvain"
    }

    fn detect(&self, graph: &dyn WeightedGraph) -> Partition {
        let n = graph.node_count();
        let m = graph.total_weight();
        if m <= 0.0 {
            return Partition::singletons(n);
        }
        let gamma = self.config.resolution;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let mut level = LevelGraph::from_graph(graph);
        let mut members: Vec<Vec<usize>> = (0..n).map(|u| vec![u]).collect();
        let mut modularity = Partition::singletons(n).modularity(graph, gamma);
        let mut depth = 0;

        loop {
            let (labels, k, improved) = one_level(&level, m, gamma, &mut rng);
            let mut next: Vec<Vec<usize>> = vec![Vec::new(); k];
            for (node, &c) in labels.iter().enumerate() {
                next[c].extend_from_slice(&members[node]);
            }
            members = next;
            depth += 1;

            let new_modularity = level.modularity(&labels, k, m, gamma);
            debug!(depth, communities = k, modularity = new_modularity, "louvain level");
            if !improved || new_modularity - modularity <= self.config.threshold {
                break;
            }
            modularity = new_modularity;
            level = level.aggregate(&labels, k);
        }

        Partition::new(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjacencyGraph;

    fn clique_edges(nodes: &[usize], w: f64) -> Vec<(usize, usize, f64)> {
        let mut out = Vec::new();
        for (a, &u) in nodes.iter().enumerate() {
            for &v in &nodes[a + 1..] {
                out.push((u, v, w));
            }
        }
        out
    }

    fn two_cliques() -> AdjacencyGraph {
        let mut edges = clique_edges(&[0, 1, 2, 3, 4], 1.0);
        edges.extend(clique_edges(&[5, 6, 7, 8, 9], 1.0));
        edges.push((4, 5, 0.1));
        AdjacencyGraph::from_edges(10, edges).unwrap()
    }

    #[test]
    fn test_two_cliques_are_found() {
        let partition = Louvain::default().detect(&two_cliques());
        assert_eq!(
            partition.communities(),
            &[vec![0, 1, 2, 3, 4], vec![5, 6, 7, 8, 9]]
        );
    }

    #[test]
    fn test_covers_every_node() {
        let mut edges = clique_edges(&[0, 1, 2], 1.0);
        edges.push((3, 4, 1.0));
        let g = AdjacencyGraph::from_edges(6, edges).unwrap();
        let partition = Louvain::default().detect(&g);
        assert_eq!(partition.covered().len(), 6);
        // Isolated node 5 stays alone.
        assert!(partition.communities().contains(&vec![5]));
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let g = two_cliques();
        let config = LouvainConfig {
            seed: 1234,
            ..LouvainConfig::default()
        };
        let a = Louvain::new(config).detect(&g);
        let b = Louvain::new(config).detect(&g);
        assert_eq!(a, b);
    }

    #[test]
    fn test_clear_structure_is_seed_independent() {
        let g = two_cliques();
        for seed in [0, 7, 1234, u64::MAX] {
            let config = LouvainConfig {
                seed,
                ..LouvainConfig::default()
            };
            let partition = Louvain::new(config).detect(&g);
            assert_eq!(
                partition.communities(),
                &[vec![0, 1, 2, 3, 4], vec![5, 6, 7, 8, 9]],
                "seed {}",
                seed
            );
        }
    }

    #[test]
    fn test_no_edges_gives_singletons() {
        let g = AdjacencyGraph::from_edges(4, Vec::new()).unwrap();
        assert_eq!(Louvain::default().detect(&g), Partition::singletons(4));
    }

    #[test]
    fn test_modularity_does_not_decrease() {
        let g = two_cliques();
        let partition = Louvain::default().detect(&g);
        let q = partition.modularity(&g, 1.0);
        assert!(q > Partition::singletons(10).modularity(&g, 1.0));
        assert!(q > 0.4);
    }
}
