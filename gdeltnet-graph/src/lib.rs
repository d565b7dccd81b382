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

//! gdeltnet graph layer
//!
//! Signed month matrices become graphs and numbers:
//!
//! - **Normalisation** (`normalize`): year-wide rescaling into `[-1, 1]` and
//!   the alliance/hostility split.
//! - **Graph** (`graph`): the `WeightedGraph` capability and its CSR-backed
//!   `AdjacencyGraph`.
//! - **Metrics** (`centrality`, `clustering`, `metrics`): betweenness,
//!   closeness, harmonic centrality, clustering, transitivity, sparsity.
//! - **Communities** (`community`): Louvain and Walktrap partitions, size
//!   filtering and representative election.

pub mod centrality;
pub mod clustering;
pub mod community;
pub mod graph;
pub mod metrics;
pub mod normalize;

pub use community::{
    algorithm_for, CommunityAlgorithm, CommunityDetector, CommunityRecord, Louvain, Partition,
    Walktrap,
};
pub use graph::{AdjacencyGraph, Edge, WeightedGraph};
pub use metrics::{GlobalMetrics, GraphMetricsEngine, GraphMetricsRecord, NodalMetrics};
pub use normalize::{normalize_matrix, NormalizedYear, SignedSplit, YearNormalizer};
