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

//! Undirected weighted graph built from a non-negative adjacency matrix
//!
//! ## Layout
//!
//! Compressed sparse rows: `offsets[u]..offsets[u + 1]` indexes the slice of
//! `adjacency` holding the neighbours of `u`, sorted by neighbour index.
//! Every undirected edge appears twice, once per endpoint. Self-loops are
//! never stored.
//!
//! The graph is read-only after construction and is shared between the
//! metric and community stages.

use crate::centrality;
use crate::clustering;
use crate::community::{CommunityAlgorithm, Partition};
use gdeltnet_core::{GdeltNetError, PathMetric, Result, SignedMatrix};
use serde::{Deserialize, Serialize};

/// One undirected edge with `source < target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

/// Read-only capability over an undirected, non-negatively weighted graph.
///
/// Implementors provide the adjacency; every metric and the community
/// partition are derived from it.
pub trait WeightedGraph: Send + Sync {
    fn node_count(&self) -> usize;

    /// Neighbours of `node` with the connecting weight, sorted by index.
    fn neighbors(&self, node: usize) -> &[(usize, f64)];

    fn degree(&self, node: usize) -> usize {
        self.neighbors(node).len()
    }

    /// Sum of incident edge weights.
    fn strength(&self, node: usize) -> f64 {
        self.neighbors(node).iter().map(|(_, w)| w).sum()
    }

    /// Weight of the edge between `a` and `b`, 0 when absent.
    fn weight(&self, a: usize, b: usize) -> f64 {
        let nbrs = self.neighbors(a);
        match nbrs.binary_search_by_key(&b, |(v, _)| *v) {
            Ok(pos) => nbrs[pos].1,
            Err(_) => 0.0,
        }
    }

    fn has_edge(&self, a: usize, b: usize) -> bool {
        self.weight(a, b) > 0.0
    }

    fn edge_count(&self) -> usize {
        (0..self.node_count()).map(|u| self.degree(u)).sum::<usize>() / 2
    }

    /// Sum of all edge weights, each edge counted once.
    fn total_weight(&self) -> f64 {
        self.edges().iter().map(|e| e.weight).sum()
    }

    /// Edges with `source < target`, sorted.
    fn edges(&self) -> Vec<Edge> {
        let mut out = Vec::with_capacity(self.edge_count());
        for u in 0..self.node_count() {
            for &(v, weight) in self.neighbors(u) {
                if u < v {
                    out.push(Edge {
                        source: u,
                        target: v,
                        weight,
                    });
                }
            }
        }
        out
    }

    /// Fraction of off-diagonal node pairs without an edge.
    fn sparsity_ratio(&self) -> f64 {
        let n = self.node_count();
        if n < 2 {
            return 0.0;
        }
        let pairs = (n * (n - 1)) as f64;
        let zero = pairs - 2.0 * self.edge_count() as f64;
        zero / pairs
    }

    fn betweenness_centrality(&self, metric: PathMetric) -> Vec<f64> {
        centrality::betweenness(self, metric)
    }

    fn closeness_centrality(&self, metric: PathMetric) -> Vec<f64> {
        centrality::closeness(self, metric)
    }

    fn harmonic_centrality(&self, metric: PathMetric) -> Vec<f64> {
        centrality::harmonic(self, metric)
    }

    fn clustering(&self) -> Vec<f64> {
        clustering::local_clustering(self)
    }

    fn average_clustering(&self) -> f64 {
        clustering::average_clustering(self)
    }

    fn transitivity(&self) -> f64 {
        clustering::transitivity(self)
    }

    fn partition(&self, algorithm: &dyn CommunityAlgorithm) -> Partition
    where
        Self: Sized,
    {
        algorithm.detect(self)
    }
}

/// Adjacency graph backed by CSR arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyGraph {
    offsets: Vec<usize>,
    adjacency: Vec<(usize, f64)>,
}

impl AdjacencyGraph {
    /// Build from a square matrix. Edges are the strictly positive cells of
    /// the upper triangle; the diagonal is ignored.
    pub fn from_matrix(matrix: &SignedMatrix) -> Result<Self> {
        let (rows, cols) = matrix.dim();
        if rows != cols {
            return Err(GdeltNetError::DimensionMismatch {
                expected: rows,
                actual: format!("{}x{}", rows, cols),
            });
        }
        let n = rows;
        let mut lists: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for i in 0..n {
            for j in (i + 1)..n {
                let w = matrix[[i, j]];
                if w > 0.0 {
                    lists[i].push((j, w));
                    lists[j].push((i, w));
                }
            }
        }
        Ok(Self::from_lists(lists))
    }

    /// Build from an edge list over `n` nodes. Self-loops and non-positive
    /// weights are dropped; parallel edges are summed.
    pub fn from_edges<I>(n: usize, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut lists: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for (a, b, w) in edges {
            if a >= n || b >= n {
                return Err(GdeltNetError::Validation(format!(
                    "edge ({}, {}) out of range for {} nodes",
                    a, b, n
                )));
            }
            if a == b || !(w > 0.0) {
                continue;
            }
            lists[a].push((b, w));
            lists[b].push((a, w));
        }
        for list in &mut lists {
            list.sort_by_key(|(v, _)| *v);
            list.dedup_by(|next, kept| {
                if next.0 == kept.0 {
                    kept.1 += next.1;
                    true
                } else {
                    false
                }
            });
        }
        Ok(Self::from_lists(lists))
    }

    fn from_lists(lists: Vec<Vec<(usize, f64)>>) -> Self {
        let mut offsets = Vec::with_capacity(lists.len() + 1);
        let mut adjacency = Vec::with_capacity(lists.iter().map(Vec::len).sum());
        offsets.push(0);
        for list in lists {
            adjacency.extend(list);
            offsets.push(adjacency.len());
        }
        Self { offsets, adjacency }
    }
}

impl WeightedGraph for AdjacencyGraph {
    fn node_count(&self) -> usize {
        self.offsets.len() - 1
    }

    fn neighbors(&self, node: usize) -> &[(usize, f64)] {
        &self.adjacency[self.offsets[node]..self.offsets[node + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_matrix() {
        let m = array![[0.7, 0.5, 0.0], [0.5, 0.0, 0.2], [0.0, 0.2, 0.0]];
        let g = AdjacencyGraph::from_matrix(&m).unwrap();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.neighbors(1), &[(0, 0.5), (2, 0.2)]);
        assert_eq!(g.weight(2, 1), 0.2);
        assert_eq!(g.weight(0, 2), 0.0);
        assert!(!g.has_edge(0, 0));
        assert!((g.strength(1) - 0.7).abs() < 1e-12);
        assert!((g.total_weight() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_edges_listing() {
        let m = array![[0.0, 0.5, 0.3], [0.5, 0.0, 0.0], [0.3, 0.0, 0.0]];
        let g = AdjacencyGraph::from_matrix(&m).unwrap();
        let edges = g.edges();
        assert_eq!(
            edges,
            vec![
                Edge { source: 0, target: 1, weight: 0.5 },
                Edge { source: 0, target: 2, weight: 0.3 },
            ]
        );
    }

    #[test]
    fn test_sparsity() {
        let m = array![[0.0, 0.5, 0.0], [0.5, 0.0, 0.0], [0.0, 0.0, 0.0]];
        let g = AdjacencyGraph::from_matrix(&m).unwrap();
        assert!((g.sparsity_ratio() - 4.0 / 6.0).abs() < 1e-12);

        let single = AdjacencyGraph::from_edges(1, Vec::new()).unwrap();
        assert_eq!(single.sparsity_ratio(), 0.0);
        let empty = AdjacencyGraph::from_edges(0, Vec::new()).unwrap();
        assert_eq!(empty.node_count(), 0);
        assert_eq!(empty.sparsity_ratio(), 0.0);
    }

    #[test]
    fn test_from_edges_merges_and_filters() {
        let g = AdjacencyGraph::from_edges(3, vec![(0, 1, 1.0), (1, 0, 2.0), (2, 2, 5.0), (1, 2, 0.0)])
            .unwrap();
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.weight(0, 1), 3.0);
        assert!(AdjacencyGraph::from_edges(2, vec![(0, 5, 1.0)]).is_err());
    }

    #[test]
    fn test_non_square_rejected() {
        let m = ndarray::Array2::<f64>::zeros((2, 3));
        assert!(AdjacencyGraph::from_matrix(&m).is_err());
    }
}
