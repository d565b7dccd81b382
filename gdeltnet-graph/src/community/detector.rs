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

use super::{algorithm_for, CommunityAlgorithm};
use crate::graph::WeightedGraph;
use gdeltnet_core::{
    AnalysisConfig, CountryIndex, GdeltNetError, PathMetric, Result, DEFAULT_MIN_COMMUNITY_SIZE,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// A retained community and its representative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityRecord {
    pub members: BTreeSet<usize>,
    pub size: usize,
    pub representative_index: usize,
    pub representative_name: String,
    /// Betweenness of the representative in the whole graph.
    pub representative_centrality: f64,
}

/// Partitions a graph, drops small communities and elects representatives.
pub struct CommunityDetector {
    algorithm: Box<dyn CommunityAlgorithm>,
    min_community_size: usize,
    path_metric: PathMetric,
}

impl CommunityDetector {
    pub fn new(algorithm: Box<dyn CommunityAlgorithm>) -> Self {
        Self {
            algorithm,
            min_community_size: DEFAULT_MIN_COMMUNITY_SIZE,
            path_metric: PathMetric::default(),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            algorithm: algorithm_for(config),
            min_community_size: config.min_community_size,
            path_metric: config.path_metric,
        }
    }

    pub fn with_min_community_size(mut self, size: usize) -> Self {
        self.min_community_size = size;
        self
    }

    pub fn with_path_metric(mut self, metric: PathMetric) -> Self {
        self.path_metric = metric;
        self
    }

    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm.name()
    }

    /// Detect communities of `graph`, whose nodes follow `countries`.
    ///
    /// The representative of a community is the member with the highest
    /// betweenness over the whole graph, ties going to the lowest index.
    /// Records are ordered by their smallest member.
    pub fn detect(
        &self,
        graph: &dyn WeightedGraph,
        countries: &CountryIndex,
    ) -> Result<Vec<CommunityRecord>> {
        if graph.node_count() != countries.len() {
            return Err(GdeltNetError::DimensionMismatch {
                expected: countries.len(),
                actual: format!("{} nodes", graph.node_count()),
            });
        }

        let partition = self.algorithm.detect(graph);
        let retained: Vec<&Vec<usize>> = partition
            .communities()
            .iter()
            .filter(|c| c.len() >= self.min_community_size)
            .collect();
        debug!(
            algorithm = self.algorithm.name(),
            found = partition.len(),
            retained = retained.len(),
            "community partition"
        );
        if retained.is_empty() {
            return Ok(Vec::new());
        }

        let betweenness = graph.betweenness_centrality(self.path_metric);
        let mut records = Vec::with_capacity(retained.len());
        for members in retained {
            // Members are sorted ascending, so the strict comparison keeps the lowest index on ties.
            let mut representative = members[0];
            for &u in &members[1..] {
                if betweenness[u] > betweenness[representative] {
                    representative = u;
                }
            }
            let representative_name = countries
                .code(representative)
                .map(str::to_string)
                .ok_or_else(|| {
                    GdeltNetError::Validation(format!("node {} has no country code", representative))
                })?;
            records.push(CommunityRecord {
                members: members.iter().copied().collect(),
                size: members.len(),
                representative_index: representative,
                representative_name,
                representative_centrality: betweenness[representative],
            });
        }
        Ok(records)
    }
}
