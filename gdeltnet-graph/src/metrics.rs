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

//! Graph metrics engine: sparsity, global and nodal metrics for one graph.

use crate::graph::{AdjacencyGraph, WeightedGraph};
use gdeltnet_core::{PathMetric, Result, SignedMatrix};
use serde::{Deserialize, Serialize};

/// Name of each nodal metric in exported rows and documents.
pub const METRIC_BETWEENNESS: &str = "BC";
pub const METRIC_CLOSENESS: &str = "CC";
pub const METRIC_HARMONIC: &str = "HC";
pub const METRIC_CLUSTERING: &str = "clustering";
pub const METRIC_TRANSITIVITY: &str = "trans";
pub const METRIC_AVG_CLUSTERING: &str = "avg_clustering";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalMetrics {
    #[serde(rename = "trans")]
    pub transitivity: f64,
    pub avg_clustering: f64,
}

/// One value per node, indexed like the country index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodalMetrics {
    #[serde(rename = "BC")]
    pub betweenness: Vec<f64>,
    #[serde(rename = "CC")]
    pub closeness: Vec<f64>,
    #[serde(rename = "HC")]
    pub harmonic: Vec<f64>,
    pub clustering: Vec<f64>,
}

impl NodalMetrics {
    /// `(name, values)` pairs in export order.
    pub fn named(&self) -> [(&'static str, &[f64]); 4] {
        [
            (METRIC_BETWEENNESS, self.betweenness.as_slice()),
            (METRIC_CLOSENESS, self.closeness.as_slice()),
            (METRIC_HARMONIC, self.harmonic.as_slice()),
            (METRIC_CLUSTERING, self.clustering.as_slice()),
        ]
    }
}

/// Metrics of one (month, polarity) graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetricsRecord {
    pub sparsity_ratio: f64,
    #[serde(rename = "global_metrics")]
    pub global: GlobalMetrics,
    #[serde(rename = "nodal_metrics")]
    pub nodal: NodalMetrics,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GraphMetricsEngine {
    path_metric: PathMetric,
}

impl GraphMetricsEngine {
    pub fn new(path_metric: PathMetric) -> Self {
        Self { path_metric }
    }

    pub fn path_metric(&self) -> PathMetric {
        self.path_metric
    }

    pub fn compute(&self, graph: &dyn WeightedGraph) -> GraphMetricsRecord {
        GraphMetricsRecord {
            sparsity_ratio: graph.sparsity_ratio(),
            global: GlobalMetrics {
                transitivity: graph.transitivity(),
                avg_clustering: graph.average_clustering(),
            },
            nodal: NodalMetrics {
                betweenness: graph.betweenness_centrality(self.path_metric),
                closeness: graph.closeness_centrality(self.path_metric),
                harmonic: graph.harmonic_centrality(self.path_metric),
                clustering: graph.clustering(),
            },
        }
    }

    /// Build the graph of a non-negative matrix and compute its metrics.
    pub fn compute_matrix(&self, matrix: &SignedMatrix) -> Result<GraphMetricsRecord> {
        let graph = AdjacencyGraph::from_matrix(matrix)?;
        Ok(self.compute(&graph))
    }
}
