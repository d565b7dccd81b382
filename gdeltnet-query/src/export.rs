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

//! Export shapes: metrics document, metric rows and community rows.

use gdeltnet_core::{MonthKey, Polarity, Result};
use gdeltnet_graph::metrics::{METRIC_AVG_CLUSTERING, METRIC_BETWEENNESS, METRIC_TRANSITIVITY};
use gdeltnet_graph::{CommunityRecord, GlobalMetrics, GraphMetricsRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// Node label of global metric rows.
pub const GLOBAL_NODE: &str = "global";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    GlobalMetrics,
    NodalMetrics,
}

/// One metric value of one graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub year: i32,
    pub month: u32,
    pub graph_type: Polarity,
    pub metric_type: MetricType,
    pub metric_name: String,
    /// Node index, or `global`.
    pub node: String,
    pub value: f64,
}

/// Representative of one retained community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityRow {
    pub year: i32,
    /// Two-digit month.
    pub month: String,
    pub node_id: usize,
    pub node_name: String,
    pub metric: String,
    pub value: f64,
}

/// Metrics of one graph in document form: nodal values keyed by node index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsDocEntry {
    pub sparsity_ratio: f64,
    pub global_metrics: GlobalMetrics,
    pub nodal_metrics: BTreeMap<String, BTreeMap<usize, f64>>,
}

impl From<&GraphMetricsRecord> for MetricsDocEntry {
    fn from(record: &GraphMetricsRecord) -> Self {
        let nodal_metrics = record
            .nodal
            .named()
            .iter()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    values.iter().copied().enumerate().collect(),
                )
            })
            .collect();
        Self {
            sparsity_ratio: record.sparsity_ratio,
            global_metrics: record.global.clone(),
            nodal_metrics,
        }
    }
}

/// A year's metrics keyed by month number, then polarity (`"A"` / `"H"`).
pub type MetricsDocument = BTreeMap<u32, BTreeMap<Polarity, MetricsDocEntry>>;

/// Rows of one graph: the two global metrics, then every nodal metric per node.
pub fn metric_rows(month: MonthKey, polarity: Polarity, record: &GraphMetricsRecord) -> Vec<MetricRow> {
    let row = |metric_type, name: &str, node: String, value| MetricRow {
        year: month.year(),
        month: month.month(),
        graph_type: polarity,
        metric_type,
        metric_name: name.to_string(),
        node,
        value,
    };

    let mut rows = vec![
        row(
            MetricType::GlobalMetrics,
            METRIC_TRANSITIVITY,
            GLOBAL_NODE.to_string(),
            record.global.transitivity,
        ),
        row(
            MetricType::GlobalMetrics,
            METRIC_AVG_CLUSTERING,
            GLOBAL_NODE.to_string(),
            record.global.avg_clustering,
        ),
    ];
    for (name, values) in record.nodal.named() {
        for (node, value) in values.iter().enumerate() {
            rows.push(row(MetricType::NodalMetrics, name, node.to_string(), *value));
        }
    }
    rows
}

pub fn community_row(month: MonthKey, record: &CommunityRecord) -> CommunityRow {
    CommunityRow {
        year: month.year(),
        month: format!("{:02}", month.month()),
        node_id: record.representative_index,
        node_name: record.representative_name.clone(),
        metric: METRIC_BETWEENNESS.to_string(),
        value: record.representative_centrality,
    }
}

/// Write `rows` as comma-separated values, header first. An empty slice
/// writes nothing.
pub fn write_csv<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for row in rows {
        out.serialize(row)?;
    }
    out.flush()?;
    Ok(())
}
