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

//! Walktrap: hierarchical agglomeration by random-walk distance.
//!
//! Vertices that short random walks reach with similar probabilities end up
//! together. Starting from singletons, the pair of adjacent communities whose
//! merge least increases the within-community walk variance (Ward criterion)
//! is merged, until no adjacent pair remains. The dendrogram is cut at the
//! level with the highest modularity.
//!
//! ## Walk graph
//!
//! Every vertex gets a self-loop weighted with its mean incident edge weight
//! (1 for isolated vertices) so that walks may stay in place.

use super::{CommunityAlgorithm, Partition};
use crate::graph::WeightedGraph;
use gdeltnet_core::WalktrapConfig;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct Walktrap {
    config: WalktrapConfig,
}

impl Walktrap {
    pub fn new(config: WalktrapConfig) -> Self {
        Self { config }
    }
}

struct WalkCommunity {
    members: Vec<usize>,
    /// Probability of reaching each vertex after `steps` from a uniformly
    /// chosen member.
    probs: Array1<f64>,
    /// Edge weight inside the community, original graph.
    internal: f64,
    /// Weighted degree sum, original graph.
    degree: f64,
    /// Adjacent community -> connecting edge weight.
    links: BTreeMap<usize, f64>,
}

struct Dendrogram<'a> {
    n: usize,
    /// `d(k)` of the walk graph.
    walk_degree: &'a [f64],
    communities: Vec<Option<WalkCommunity>>,
    /// Ward cost of merging each adjacent pair `(a, b)`, `a < b`.
    deltas: BTreeMap<(usize, usize), f64>,
}

impl Dendrogram<'_> {
    fn delta_sigma(&self, a: &WalkCommunity, b: &WalkCommunity) -> f64 {
        let r2: f64 = a
            .probs
            .iter()
            .zip(b.probs.iter())
            .zip(self.walk_degree)
            .map(|((pa, pb), d)| (pa - pb).powi(2) / d)
            .sum();
        let (sa, sb) = (a.members.len() as f64, b.members.len() as f64);
        (sa * sb / (sa + sb)) * r2 / self.n as f64
    }

    fn refresh(&mut self, id: usize) {
        let Some(Some(community)) = self.communities.get(id) else {
            return;
        };
        let mut updates = Vec::with_capacity(community.links.len());
        for &other in community.links.keys() {
            if let Some(Some(neighbor)) = self.communities.get(other) {
                let key = if id < other { (id, other) } else { (other, id) };
                updates.push((key, self.delta_sigma(community, neighbor)));
            }
        }
        self.deltas.extend(updates);
    }

    /// Cheapest adjacent pair; ties go to the smallest key.
    fn cheapest(&self) -> Option<(usize, usize)> {
        self.deltas
            .iter()
            .min_by(|(ka, da), (kb, db)| da.total_cmp(db).then_with(|| ka.cmp(kb)))
            .map(|(key, _)| *key)
    }

    fn merge(&mut self, a: usize, b: usize) -> Option<usize> {
        let ca = self.communities.get_mut(a)?.take()?;
        let cb = self.communities.get_mut(b)?.take()?;
        let id = self.communities.len();

        self.deltas
            .retain(|(x, y), _| *x != a && *x != b && *y != a && *y != b);

        let (sa, sb) = (ca.members.len() as f64, cb.members.len() as f64);
        let probs = (&ca.probs * sa + &cb.probs * sb) / (sa + sb);
        let bridge = ca.links.get(&b).copied().unwrap_or(0.0);

        let mut links = ca.links;
        for (other, w) in cb.links {
            *links.entry(other).or_insert(0.0) += w;
        }
        links.remove(&a);
        links.remove(&b);

        for (&other, &w) in &links {
            if let Some(Some(neighbor)) = self.communities.get_mut(other) {
                neighbor.links.remove(&a);
                neighbor.links.remove(&b);
                neighbor.links.insert(id, w);
            }
        }

        let mut members = ca.members;
        members.extend(cb.members);
        self.communities.push(Some(WalkCommunity {
            members,
            probs,
            internal: ca.internal + cb.internal + bridge,
            degree: ca.degree + cb.degree,
            links,
        }));
        self.refresh(id);
        Some(id)
    }

    fn modularity(&self, m: f64) -> f64 {
        self.alive()
            .map(|c| c.internal / m - (c.degree / (2.0 * m)).powi(2))
            .sum()
    }

    fn alive(&self) -> impl Iterator<Item = &WalkCommunity> {
        self.communities.iter().flatten()
    }

    fn partition(&self) -> Vec<Vec<usize>> {
        self.alive().map(|c| c.members.clone()).collect()
    }
}

/// Row-stochastic transition matrix of the walk graph raised to `steps`,
/// plus the walk degree of every vertex.
fn walk_probabilities(graph: &dyn WeightedGraph, steps: usize) -> (Array2<f64>, Vec<f64>) {
    let n = graph.node_count();
    let mut transition = Array2::zeros((n, n));
    let mut walk_degree = vec![0.0; n];
    for u in 0..n {
        let nbrs = graph.neighbors(u);
        let strength: f64 = nbrs.iter().map(|(_, w)| w).sum();
        let self_loop = if nbrs.is_empty() {
            1.0
        } else {
            strength / nbrs.len() as f64
        };
        let d = strength + self_loop;
        walk_degree[u] = d;
        transition[[u, u]] = self_loop / d;
        for &(v, w) in nbrs {
            transition[[u, v]] = w / d;
        }
    }

    let mut power = transition.clone();
    for _ in 1..steps {
        power = power.dot(&transition);
    }
    (power, walk_degree)
}

impl CommunityAlgorithm for Walktrap {
    fn name(&self) -> &'static str {
        "walktrap"
    }

    fn detect(&self, graph: &dyn WeightedGraph) -> Partition {
        let n = graph.node_count();
        let m = graph.total_weight();
        if m <= 0.0 {
            return Partition::singletons(n);
        }

        let (probs, walk_degree) = walk_probabilities(graph, self.config.steps.max(1));
        let communities = (0..n)
            .map(|u| {
                Some(WalkCommunity {
                    members: vec![u],
                    probs: probs.row(u).to_owned(),
                    internal: 0.0,
                    degree: graph.strength(u),
                    links: graph.neighbors(u).iter().copied().collect(),
                })
            })
            .collect();
        let mut dendrogram = Dendrogram {
            n,
            walk_degree: &walk_degree,
            communities,
            deltas: BTreeMap::new(),
        };
        for u in 0..n {
            dendrogram.refresh(u);
        }

        let mut best_modularity = dendrogram.modularity(m);
        let mut best = dendrogram.partition();
        let mut merges = 0;
        while let Some((a, b)) = dendrogram.cheapest() {
            if dendrogram.merge(a, b).is_none() {
                break;
            }
            merges += 1;
            let q = dendrogram.modularity(m);
            if q > best_modularity {
                best_modularity = q;
                best = dendrogram.partition();
            }
        }
        debug!(merges, modularity = best_modularity, communities = best.len(), "walktrap cut");

        Partition::new(best)
    }
}
