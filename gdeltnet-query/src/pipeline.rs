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

//! Month pipeline: events -> day matrices -> month matrix.
//!
//! Days are independent and are built in parallel; each day is written to
//! the registry under its own key. A day whose input cannot be read is
//! reported and left out of the month average, it never aborts the month.

use gdeltnet_core::{AnalysisConfig, DayKey, MonthKey, Result};
use gdeltnet_storage::{
    ArtifactRegistry, DailyGraphBuilder, DayBuild, EventSource, TemporalAggregator,
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// A day left out of the month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedDay {
    pub day: DayKey,
    pub reason: String,
}

/// Outcome of building one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBuildReport {
    pub month: MonthKey,
    pub days_built: usize,
    pub failed_days: Vec<FailedDay>,
    pub events_applied: usize,
    pub events_skipped: usize,
    pub unknown_actors: BTreeMap<String, usize>,
    /// False when no day could be built, in which case no month artifact exists.
    pub month_written: bool,
}

impl MonthBuildReport {
    fn new(month: MonthKey) -> Self {
        Self {
            month,
            days_built: 0,
            failed_days: Vec::new(),
            events_applied: 0,
            events_skipped: 0,
            unknown_actors: BTreeMap::new(),
            month_written: false,
        }
    }

    fn record(&mut self, build: &DayBuild) {
        self.days_built += 1;
        self.events_applied += build.report.events_applied;
        self.events_skipped += build.report.skipped();
        for (code, count) in &build.report.unknown_actors {
            *self.unknown_actors.entry(code.clone()).or_insert(0) += count;
        }
    }
}

pub struct MonthPipeline {
    source: Arc<dyn EventSource>,
    builder: DailyGraphBuilder,
    aggregator: TemporalAggregator,
    registry: Arc<ArtifactRegistry>,
}

impl MonthPipeline {
    pub fn new(
        source: Arc<dyn EventSource>,
        registry: Arc<ArtifactRegistry>,
        config: &AnalysisConfig,
    ) -> Self {
        let builder = DailyGraphBuilder::new(Arc::clone(registry.countries()), config.weights)
            .with_self_loops(config.self_loops);
        Self {
            source,
            builder,
            aggregator: TemporalAggregator::new(config.exclude_zero_edges),
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<ArtifactRegistry> {
        &self.registry
    }

    /// Build every available day of `month`, then the month matrix.
    pub fn build_month(&self, month: MonthKey) -> Result<MonthBuildReport> {
        let days = self.source.days(month);
        info!(month = %month, days = days.len(), "building month");

        let results: Vec<(DayKey, Result<DayBuild>)> = days
            .par_iter()
            .map(|&day| (day, self.builder.build_from_source(self.source.as_ref(), day)))
            .collect();

        let mut report = MonthBuildReport::new(month);
        for (day, result) in results {
            match result {
                Ok(build) => {
                    report.record(&build);
                    self.registry.insert_day(day, build.matrix)?;
                }
                Err(e) => {
                    warn!(day = %day, error = %e, "day excluded from month");
                    report.failed_days.push(FailedDay {
                        day,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if report.days_built == 0 {
            warn!(month = %month, "no day could be built, month artifact not written");
            return Ok(report);
        }

        let built: Vec<DayKey> = days
            .iter()
            .copied()
            .filter(|day| !report.failed_days.iter().any(|f| f.day == *day))
            .collect();
        self.aggregate_days(month, &built)?;
        report.month_written = true;
        info!(
            month = %month,
            days_built = report.days_built,
            failed = report.failed_days.len(),
            events = report.events_applied,
            "month built"
        );
        Ok(report)
    }

    /// Build every month of `year` for which the source has input.
    pub fn build_year(&self, year: i32) -> Result<Vec<MonthBuildReport>> {
        let mut reports = Vec::new();
        for m in 1..=12 {
            let month = MonthKey::new(year, m)?;
            if self.source.days(month).is_empty() {
                continue;
            }
            reports.push(self.build_month(month)?);
        }
        Ok(reports)
    }

    /// Re-aggregate `month` from the day artifacts already in the registry.
    /// Returns the number of days used.
    pub fn aggregate_month(&self, month: MonthKey) -> Result<usize> {
        let days: Vec<DayKey> = self
            .registry
            .days_of(month)
            .into_iter()
            .map(|(day, _)| day)
            .collect();
        self.aggregate_days(month, &days)?;
        Ok(days.len())
    }

    fn aggregate_days(&self, month: MonthKey, days: &[DayKey]) -> Result<()> {
        let matrices: Vec<_> = days.iter().filter_map(|day| self.registry.day(*day)).collect();
        let matrix = self
            .aggregator
            .aggregate_month(matrices.iter().map(|m| m.as_ref()), self.registry.dim())?;
        self.registry.insert_month(month, matrix)
    }
}
