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

//! Shortest-path centralities: betweenness, closeness, harmonic.
//!
//! Path lengths follow [`PathMetric`]: hop counts (BFS) or `1 / weight`
//! (Dijkstra). Sources are processed in parallel, but per-source results are
//! summed in source order so the output does not depend on scheduling.

use crate::graph::WeightedGraph;
use gdeltnet_core::PathMetric;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

/// Single-source shortest path data used by Brandes' algorithm.
struct SourcePaths {
    /// Settled nodes in non-decreasing distance order.
    order: Vec<usize>,
    /// Number of shortest paths from the source.
    sigma: Vec<f64>,
    preds: Vec<Vec<usize>>,
    dist: Vec<Option<f64>>,
}

fn edge_length(metric: PathMetric, weight: f64) -> f64 {
    match metric {
        PathMetric::Hops => 1.0,
        PathMetric::InverseWeight => 1.0 / weight,
    }
}

fn shortest_paths<G: WeightedGraph + ?Sized>(graph: &G, source: usize, metric: PathMetric) -> SourcePaths {
    match metric {
        PathMetric::Hops => bfs(graph, source),
        PathMetric::InverseWeight => dijkstra(graph, source, metric),
    }
}

fn bfs<G: WeightedGraph + ?Sized>(graph: &G, source: usize) -> SourcePaths {
    let n = graph.node_count();
    let mut order = Vec::with_capacity(n);
    let mut sigma = vec![0.0; n];
    let mut preds = vec![Vec::new(); n];
    let mut dist: Vec<Option<f64>> = vec![None; n];

    sigma[source] = 1.0;
    dist[source] = Some(0.0);
    let mut queue = VecDeque::from([source]);
    while let Some(v) = queue.pop_front() {
        order.push(v);
        let dv = dist[v].unwrap_or(0.0);
        for &(w, _) in graph.neighbors(v) {
            match dist[w] {
                None => {
                    dist[w] = Some(dv + 1.0);
                    queue.push_back(w);
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
                Some(dw) if dw == dv + 1.0 => {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
                Some(_) => {}
            }
        }
    }
    SourcePaths {
        order,
        sigma,
        preds,
        dist,
    }
}

#[derive(PartialEq)]
struct HeapEntry {
    dist: f64,
    /// Insertion counter, keeps pops deterministic between equal distances.
    seq: usize,
    pred: usize,
    node: usize,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on (dist, seq).
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn dijkstra<G: WeightedGraph + ?Sized>(graph: &G, source: usize, metric: PathMetric) -> SourcePaths {
    let n = graph.node_count();
    let mut order = Vec::with_capacity(n);
    let mut sigma = vec![0.0; n];
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut dist: Vec<Option<f64>> = vec![None; n];
    let mut seen: Vec<Option<f64>> = vec![None; n];

    let mut seq = 0usize;
    let mut heap = BinaryHeap::new();
    seen[source] = Some(0.0);
    sigma[source] = 1.0;
    heap.push(HeapEntry {
        dist: 0.0,
        seq,
        pred: source,
        node: source,
    });

    while let Some(HeapEntry { dist: d, pred, node: v, .. }) = heap.pop() {
        if dist[v].is_some() {
            continue;
        }
        if pred != v {
            sigma[v] += sigma[pred];
        }
        order.push(v);
        dist[v] = Some(d);
        for &(w, weight) in graph.neighbors(v) {
            let candidate = d + edge_length(metric, weight);
            if dist[w].is_some() {
                continue;
            }
            match seen[w] {
                Some(best) if candidate > best => {}
                Some(best) if candidate == best => {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
                _ => {
                    seq += 1;
                    seen[w] = Some(candidate);
                    sigma[w] = 0.0;
                    preds[w] = vec![v];
                    heap.push(HeapEntry {
                        dist: candidate,
                        seq,
                        pred: v,
                        node: w,
                    });
                }
            }
        }
    }
    SourcePaths {
        order,
        sigma,
        preds,
        dist,
    }
}

/// Brandes betweenness over all nodes.
///
/// Normalised by `1 / ((n - 1)(n - 2))`, which for undirected graphs counts
/// each unordered pair once; 0 for every node when `n <= 2`.
pub fn betweenness<G: WeightedGraph + ?Sized>(graph: &G, metric: PathMetric) -> Vec<f64> {
    let n = graph.node_count();
    let partials: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|s| {
            let paths = shortest_paths(graph, s, metric);
            let mut delta = vec![0.0; n];
            let mut partial = vec![0.0; n];
            for &w in paths.order.iter().rev() {
                let coeff = (1.0 + delta[w]) / paths.sigma[w];
                for &v in &paths.preds[w] {
                    delta[v] += paths.sigma[v] * coeff;
                }
                if w != s {
                    partial[w] = delta[w];
                }
            }
            partial
        })
        .collect();

    let mut total = vec![0.0; n];
    for partial in &partials {
        for (t, p) in total.iter_mut().zip(partial) {
            *t += p;
        }
    }

    if n <= 2 {
        return vec![0.0; n];
    }
    let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
    total.iter_mut().for_each(|v| *v *= scale);
    total
}

/// Distances from `source` to every reachable node except itself.
fn reachable_distances<G: WeightedGraph + ?Sized>(graph: &G, source: usize, metric: PathMetric) -> Vec<f64> {
    let paths = shortest_paths(graph, source, metric);
    paths
        .order
        .iter()
        .filter(|&&v| v != source)
        .filter_map(|&v| paths.dist[v])
        .collect()
}

/// Closeness with Wasserman-Faust scaling for disconnected graphs:
/// `(r - 1) / sum(d) * (r - 1) / (n - 1)`, `r` counting the reachable
/// nodes including the source.
pub fn closeness<G: WeightedGraph + ?Sized>(graph: &G, metric: PathMetric) -> Vec<f64> {
    let n = graph.node_count();
    (0..n)
        .into_par_iter()
        .map(|u| {
            let distances = reachable_distances(graph, u, metric);
            let total: f64 = distances.iter().sum();
            if total > 0.0 && n > 1 {
                let reached = distances.len() as f64;
                (reached / total) * (reached / (n - 1) as f64)
            } else {
                0.0
            }
        })
        .collect()
}

/// Sum of inverse distances to every other reachable node.
pub fn harmonic<G: WeightedGraph + ?Sized>(graph: &G, metric: PathMetric) -> Vec<f64> {
    (0..graph.node_count())
        .into_par_iter()
        .map(|u| {
            reachable_distances(graph, u, metric)
                .iter()
                .filter(|d| **d > 0.0)
                .map(|d| 1.0 / d)
                .sum()
        })
        .collect()
}
