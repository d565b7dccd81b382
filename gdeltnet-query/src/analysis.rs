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

//! Year analysis
//!
//! Stages, in order:
//!
//! 1. `prepare`: year tensor from the registry, normalisation, one alliance
//!    and one hostility graph per month. This is the barrier that needs all
//!    month artifacts of the year.
//! 2. `estimate_metrics`: sparsity, global and nodal metrics of every graph.
//! 3. `detect_communities`: communities of every alliance graph.
//!
//! Stages 2 and 3 are independent of each other. Querying a stage's results
//! before it ran fails with `MetricsNotInitialized` / `CommunitiesNotEstimated`.

use crate::export::{community_row, metric_rows, CommunityRow, MetricRow, MetricsDocEntry, MetricsDocument};
use crate::table::{GraphKey, GraphTable};
use gdeltnet_core::{
    AnalysisConfig, CountryIndex, GdeltNetError, MonthKey, Polarity, Result,
};
use gdeltnet_graph::{
    AdjacencyGraph, CommunityDetector, CommunityRecord, Edge, GraphMetricsEngine,
    GraphMetricsRecord, NormalizedYear, WeightedGraph, YearNormalizer,
};
use gdeltnet_storage::{ArtifactRegistry, YearTensor};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub struct YearAnalysis {
    year: i32,
    countries: Arc<CountryIndex>,
    config: AnalysisConfig,
    normalized: NormalizedYear,
    graphs: GraphTable,
    metrics_estimated: bool,
    communities: Option<BTreeMap<MonthKey, Vec<CommunityRecord>>>,
}

impl YearAnalysis {
    /// Normalise the month artifacts of `year` and build its graphs.
    pub fn prepare(registry: &ArtifactRegistry, year: i32, config: &AnalysisConfig) -> Result<Self> {
        let tensor = registry.year_tensor(year)?;
        Self::from_tensor(&tensor, Arc::clone(registry.countries()), config)
    }

    pub fn from_tensor(
        tensor: &YearTensor,
        countries: Arc<CountryIndex>,
        config: &AnalysisConfig,
    ) -> Result<Self> {
        if tensor.dim() != countries.len() {
            return Err(GdeltNetError::DimensionMismatch {
                expected: countries.len(),
                actual: format!("{} nodes", tensor.dim()),
            });
        }
        let normalized = YearNormalizer::new().normalize(tensor)?;

        let mut graphs = GraphTable::new();
        for (month, split) in normalized.iter() {
            for polarity in Polarity::ALL {
                let graph = AdjacencyGraph::from_matrix(split.get(polarity))?;
                graphs.insert_graph(GraphKey::new(month, polarity), graph);
            }
        }
        info!(
            year = tensor.year(),
            months = normalized.len(),
            neg_factor = normalized.neg_factor,
            pos_factor = normalized.pos_factor,
            "year prepared"
        );

        Ok(Self {
            year: tensor.year(),
            countries,
            config: config.clone(),
            normalized,
            graphs,
            metrics_estimated: false,
            communities: None,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn countries(&self) -> &Arc<CountryIndex> {
        &self.countries
    }

    /// Months of the year with data, chronological.
    pub fn months(&self) -> Vec<MonthKey> {
        self.normalized.months().collect()
    }

    pub fn normalized(&self) -> &NormalizedYear {
        &self.normalized
    }

    pub fn graph(&self, month: MonthKey, polarity: Polarity) -> Result<&Arc<AdjacencyGraph>> {
        self.graphs
            .get(&GraphKey::new(month, polarity))
            .map(|entry| &entry.graph)
            .ok_or_else(|| {
                GdeltNetError::MissingArtifact(format!("{} graph for {}", polarity, month))
            })
    }

    /// Edges `(i, j, w)` of a graph, `i < j`, `w > 0`.
    pub fn edges(&self, month: MonthKey, polarity: Polarity) -> Result<Vec<Edge>> {
        Ok(self.graph(month, polarity)?.edges())
    }

    /// Compute the metrics of every graph of the year.
    pub fn estimate_metrics(&mut self) {
        let engine = GraphMetricsEngine::new(self.config.path_metric);
        let jobs: Vec<(GraphKey, Arc<AdjacencyGraph>)> = self
            .graphs
            .iter()
            .map(|(key, entry)| (*key, Arc::clone(&entry.graph)))
            .collect();

        let records: Vec<(GraphKey, GraphMetricsRecord)> = jobs
            .par_iter()
            .map(|(key, graph)| (*key, engine.compute(&**graph)))
            .collect();

        for (key, record) in records {
            self.graphs.set_metrics(&key, record);
        }
        self.metrics_estimated = true;
        info!(year = self.year, graphs = self.graphs.len(), "metrics estimated");
    }

    pub fn metrics_estimated(&self) -> bool {
        self.metrics_estimated
    }

    pub fn metrics(&self, month: MonthKey, polarity: Polarity) -> Result<&GraphMetricsRecord> {
        if !self.metrics_estimated {
            return Err(GdeltNetError::MetricsNotInitialized { year: self.year });
        }
        self.graphs
            .get(&GraphKey::new(month, polarity))
            .and_then(|entry| entry.metrics.as_ref())
            .ok_or_else(|| {
                GdeltNetError::MissingArtifact(format!("{} metrics for {}", polarity, month))
            })
    }

    /// Metrics keyed by month number, then polarity.
    pub fn metrics_document(&self) -> Result<MetricsDocument> {
        if !self.metrics_estimated {
            return Err(GdeltNetError::MetricsNotInitialized { year: self.year });
        }
        let mut document = MetricsDocument::new();
        for (key, entry) in self.graphs.iter() {
            if let Some(record) = &entry.metrics {
                document
                    .entry(key.month.month())
                    .or_default()
                    .insert(key.polarity, MetricsDocEntry::from(record));
            }
        }
        Ok(document)
    }

    /// Tabular form of every metric of the year.
    pub fn metric_rows(&self) -> Result<Vec<MetricRow>> {
        if !self.metrics_estimated {
            return Err(GdeltNetError::MetricsNotInitialized { year: self.year });
        }
        let mut rows = Vec::new();
        for (key, entry) in self.graphs.iter() {
            if let Some(record) = &entry.metrics {
                rows.extend(metric_rows(key.month, key.polarity, record));
            }
        }
        Ok(rows)
    }

    /// Detect communities on every alliance graph of the year.
    pub fn detect_communities(&mut self) -> Result<()> {
        let detector = CommunityDetector::from_config(&self.config);
        let jobs: Vec<(MonthKey, Arc<AdjacencyGraph>)> = self
            .months()
            .into_iter()
            .map(|month| -> Result<(MonthKey, Arc<AdjacencyGraph>)> {
                Ok((month, Arc::clone(self.graph(month, Polarity::Alliance)?)))
            })
            .collect::<Result<_>>()?;

        let countries = self.countries.as_ref();
        let detected: Vec<(MonthKey, Vec<CommunityRecord>)> = jobs
            .par_iter()
            .map(|(month, graph)| -> Result<(MonthKey, Vec<CommunityRecord>)> {
                Ok((*month, detector.detect(&**graph, countries)?))
            })
            .collect::<Result<_>>()?;

        let total: usize = detected.iter().map(|(_, records)| records.len()).sum();
        info!(
            year = self.year,
            algorithm = detector.algorithm_name(),
            communities = total,
            "communities detected"
        );
        self.communities = Some(detected.into_iter().collect());
        Ok(())
    }

    pub fn communities_estimated(&self) -> bool {
        self.communities.is_some()
    }

    fn community_table(&self) -> Result<&BTreeMap<MonthKey, Vec<CommunityRecord>>> {
        self.communities
            .as_ref()
            .ok_or(GdeltNetError::CommunitiesNotEstimated { year: self.year })
    }

    /// Retained communities of `month`; empty when the month has none.
    pub fn communities(&self, month: MonthKey) -> Result<&[CommunityRecord]> {
        Ok(self
            .community_table()?
            .get(&month)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// Representative country codes of every retained community, chronological.
    pub fn representatives(&self) -> Result<Vec<String>> {
        Ok(self
            .community_table()?
            .values()
            .flatten()
            .map(|record| record.representative_name.clone())
            .collect())
    }

    pub fn community_rows(&self) -> Result<Vec<CommunityRow>> {
        Ok(self
            .community_table()?
            .iter()
            .flat_map(|(month, records)| records.iter().map(|r| community_row(*month, r)))
            .collect())
    }
}
