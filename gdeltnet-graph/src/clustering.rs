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

//! Triangle based measures: local clustering, average clustering, transitivity.
//!
//! These are topological: an edge either exists (weight > 0) or not.

use crate::graph::WeightedGraph;

/// Triangles through `node`.
fn triangles<G: WeightedGraph + ?Sized>(graph: &G, node: usize) -> usize {
    let nbrs = graph.neighbors(node);
    let mut count = 0;
    for (a, &(u, _)) in nbrs.iter().enumerate() {
        for &(v, _) in &nbrs[a + 1..] {
            if graph.has_edge(u, v) {
                count += 1;
            }
        }
    }
    count
}

/// `2 T(u) / (k(u) (k(u) - 1))`, 0 when the degree is below 2.
pub fn local_clustering<G: WeightedGraph + ?Sized>(graph: &G) -> Vec<f64> {
    (0..graph.node_count())
        .map(|u| {
            let k = graph.degree(u);
            if k < 2 {
                return 0.0;
            }
            let t = triangles(graph, u) as f64;
            2.0 * t / (k as f64 * (k - 1) as f64)
        })
        .collect()
}

/// Mean local clustering over all nodes; 0 for an empty graph.
pub fn average_clustering<G: WeightedGraph + ?Sized>(graph: &G) -> f64 {
    let n = graph.node_count();
    if n == 0 {
        return 0.0;
    }
    local_clustering(graph).iter().sum::<f64>() / n as f64
}

/// `3 * triangles / connected triples`; 0 without triples.
pub fn transitivity<G: WeightedGraph + ?Sized>(graph: &G) -> f64 {
    let mut closed = 0usize;
    let mut triples = 0usize;
    for u in 0..graph.node_count() {
        let k = graph.degree(u);
        // Each triangle is seen once from each of its three corners.
        closed += triangles(graph, u);
        triples += k * k.saturating_sub(1) / 2;
    }
    if closed == 0 || triples == 0 {
        return 0.0;
    }
    closed as f64 / triples as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjacencyGraph;

    fn triangle_with_tail() -> AdjacencyGraph {
        // Triangle 0-1-2 plus pendant 3 on node 2.
        AdjacencyGraph::from_edges(4, vec![(0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0), (2, 3, 1.0)]).unwrap()
    }

    #[test]
    fn test_local_clustering() {
        let c = local_clustering(&triangle_with_tail());
        assert_eq!(c[0], 1.0);
        assert_eq!(c[1], 1.0);
        assert!((c[2] - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(c[3], 0.0);
    }

    #[test]
    fn test_average_clustering() {
        let avg = average_clustering(&triangle_with_tail());
        assert!((avg - (2.0 + 1.0 / 3.0) / 4.0).abs() < 1e-12);
        let empty = AdjacencyGraph::from_edges(0, Vec::new()).unwrap();
        assert_eq!(average_clustering(&empty), 0.0);
    }

    #[test]
    fn test_transitivity() {
        // 3 triangle corners / (1 + 1 + 3 + 0) triples
        let t = transitivity(&triangle_with_tail());
        assert!((t - 3.0 / 5.0).abs() < 1e-12);

        let path = AdjacencyGraph::from_edges(3, vec![(0, 1, 1.0), (1, 2, 1.0)]).unwrap();
        assert_eq!(transitivity(&path), 0.0);
    }

    #[test]
    fn test_weights_do_not_matter() {
        let light = AdjacencyGraph::from_edges(3, vec![(0, 1, 0.1), (1, 2, 0.2), (0, 2, 0.3)]).unwrap();
        assert_eq!(transitivity(&light), 1.0);
        assert_eq!(average_clustering(&light), 1.0);
    }
}
