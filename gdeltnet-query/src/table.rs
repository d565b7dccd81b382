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

//! Typed graph table keyed by `(year, month, polarity)`.

use gdeltnet_core::{MonthKey, Polarity};
use gdeltnet_graph::{AdjacencyGraph, GraphMetricsRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Key of one graph. The month carries the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GraphKey {
    pub month: MonthKey,
    pub polarity: Polarity,
}

impl GraphKey {
    pub fn new(month: MonthKey, polarity: Polarity) -> Self {
        Self { month, polarity }
    }

    pub fn year(&self) -> i32 {
        self.month.year()
    }
}

#[derive(Debug, Clone)]
pub struct GraphEntry {
    pub graph: Arc<AdjacencyGraph>,
    /// Filled by the metrics stage.
    pub metrics: Option<GraphMetricsRecord>,
}

/// Graphs of an analysis, ordered by month then polarity (alliance first).
#[derive(Debug, Clone, Default)]
pub struct GraphTable {
    entries: BTreeMap<GraphKey, GraphEntry>,
}

impl GraphTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_graph(&mut self, key: GraphKey, graph: AdjacencyGraph) {
        self.entries.insert(
            key,
            GraphEntry {
                graph: Arc::new(graph),
                metrics: None,
            },
        );
    }

    pub fn get(&self, key: &GraphKey) -> Option<&GraphEntry> {
        self.entries.get(key)
    }

    /// Attach metrics to an existing graph. Returns false if the key is unknown.
    pub fn set_metrics(&mut self, key: &GraphKey, metrics: GraphMetricsRecord) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.metrics = Some(metrics);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GraphKey, &GraphEntry)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = GraphKey> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
