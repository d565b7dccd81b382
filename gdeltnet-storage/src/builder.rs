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

//! Daily graph builder
//!
//! Turns one day's events into a symmetric signed adjacency matrix. Each
//! event is one undirected observation: both `M[i,j]` and `M[j,i]` receive
//! the full weight.
//!
//! ## Order independence
//!
//! Floating point addition is not associative, so summing in arrival order
//! would make the matrix depend on the order of the event stream. Instead the
//! contributions of each cell are collected, sorted with `f64::total_cmp` and
//! summed afterwards. Any permutation of the same events produces a
//! bit-identical matrix.

use crate::source::EventSource;
use gdeltnet_core::{
    zero_matrix, CountryIndex, DayKey, DayMatrix, EdgeWeights, Event, GdeltNetError, Result,
    SelfLoopPolicy,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Counters collected while building one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBuildReport {
    /// Events read from the stream.
    pub events_seen: usize,
    /// Events that contributed to the matrix.
    pub events_applied: usize,
    /// Occurrences of codes absent from the country index.
    pub unknown_actors: BTreeMap<String, usize>,
    pub self_loops_discarded: usize,
    /// Events with a NaN or infinite attribute.
    pub non_finite_skipped: usize,
}

impl DayBuildReport {
    pub fn unknown_actor_events(&self) -> usize {
        self.unknown_actors.values().sum()
    }

    pub fn skipped(&self) -> usize {
        self.events_seen - self.events_applied
    }
}

/// Result of building one day.
#[derive(Debug, Clone)]
pub struct DayBuild {
    pub matrix: DayMatrix,
    pub report: DayBuildReport,
}

/// Builds day matrices against a fixed country index and weight function.
#[derive(Debug, Clone)]
pub struct DailyGraphBuilder {
    countries: Arc<CountryIndex>,
    weights: EdgeWeights,
    self_loops: SelfLoopPolicy,
}

impl DailyGraphBuilder {
    pub fn new(countries: Arc<CountryIndex>, weights: EdgeWeights) -> Self {
        Self {
            countries,
            weights,
            self_loops: SelfLoopPolicy::default(),
        }
    }

    pub fn with_self_loops(mut self, policy: SelfLoopPolicy) -> Self {
        self.self_loops = policy;
        self
    }

    pub fn countries(&self) -> &Arc<CountryIndex> {
        &self.countries
    }

    pub fn weights(&self) -> &EdgeWeights {
        &self.weights
    }

    /// Build a day matrix from in-hand events. Never fails: unresolvable
    /// events are skipped and counted in the report.
    pub fn build<I>(&self, events: I) -> DayBuild
    where
        I: IntoIterator<Item = Event>,
    {
        let mut accumulator = CellAccumulator::default();
        let mut report = DayBuildReport::default();
        for event in events {
            self.apply(&event, &mut accumulator, &mut report);
        }
        self.finish(accumulator, report)
    }

    /// Build `day` from `source`. Fails with `EventSource` when the day's
    /// input cannot be opened or a read fault occurs mid-stream; a partially
    /// read day is never returned.
    pub fn build_from_source(&self, source: &dyn EventSource, day: DayKey) -> Result<DayBuild> {
        let stream = source.events(day)?;
        let mut accumulator = CellAccumulator::default();
        let mut report = DayBuildReport::default();
        for item in stream {
            let event = item.map_err(|e| match e {
                GdeltNetError::EventSource(msg) => GdeltNetError::EventSource(msg),
                other => GdeltNetError::EventSource(format!("{}: {}", day, other)),
            })?;
            self.apply(&event, &mut accumulator, &mut report);
        }
        let build = self.finish(accumulator, report);
        debug!(
            day = %day,
            applied = build.report.events_applied,
            skipped = build.report.skipped(),
            "built day matrix"
        );
        Ok(build)
    }

    fn apply(&self, event: &Event, accumulator: &mut CellAccumulator, report: &mut DayBuildReport) {
        report.events_seen += 1;

        let (i, j) = match (
            self.countries.resolve(&event.actor1_code),
            self.countries.resolve(&event.actor2_code),
        ) {
            (Ok(i), Ok(j)) => (i, j),
            (first, second) => {
                for err in [first.err(), second.err()].into_iter().flatten() {
                    if let GdeltNetError::UnknownActor { code } = err {
                        warn!(code = %code, "skipping event with unknown actor");
                        *report.unknown_actors.entry(code).or_insert(0) += 1;
                    }
                }
                return;
            }
        };

        if !event.is_finite() {
            debug!(actor1 = %event.actor1_code, actor2 = %event.actor2_code, "skipping non-finite event");
            report.non_finite_skipped += 1;
            return;
        }

        if i == j && self.self_loops == SelfLoopPolicy::Discard {
            report.self_loops_discarded += 1;
            return;
        }

        accumulator.push(i, j, self.weights.event_weight(event));
        report.events_applied += 1;
    }

    fn finish(&self, accumulator: CellAccumulator, report: DayBuildReport) -> DayBuild {
        let mut matrix = zero_matrix(self.countries.len());
        for ((i, j), mut contributions) in accumulator.cells {
            contributions.sort_by(|a, b| a.total_cmp(b));
            let total: f64 = contributions.iter().sum();
            if i == j {
                // Both "directions" of a self-loop land on the same cell.
                matrix[[i, i]] += 2.0 * total;
            } else {
                matrix[[i, j]] += total;
                matrix[[j, i]] += total;
            }
        }
        DayBuild { matrix, report }
    }
}

/// Per-cell contribution lists keyed by `(min, max)` position.
#[derive(Default)]
struct CellAccumulator {
    cells: HashMap<(usize, usize), Vec<f64>>,
}

impl CellAccumulator {
    fn push(&mut self, i: usize, j: usize, weight: f64) {
        let key = if i <= j { (i, j) } else { (j, i) };
        self.cells.entry(key).or_default().push(weight);
    }
}
