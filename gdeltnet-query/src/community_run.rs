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

//! Community detection over several years.
//!
//! Every year is normalised on its own. A year that cannot be normalised
//! (no hostility or no alliance value at all) is skipped and reported; any
//! other failure aborts the run.

use crate::analysis::YearAnalysis;
use crate::export::CommunityRow;
use gdeltnet_core::{AnalysisConfig, GdeltNetError, Result};
use gdeltnet_storage::ArtifactRegistry;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedYear {
    pub year: i32,
    pub reason: String,
}

pub struct CommunityRun {
    analyses: BTreeMap<i32, YearAnalysis>,
    skipped: Vec<SkippedYear>,
}

impl CommunityRun {
    /// Detect communities for every registry year, or only `years` when given.
    pub fn execute(
        registry: &ArtifactRegistry,
        config: &AnalysisConfig,
        years: Option<&[i32]>,
    ) -> Result<Self> {
        let selected: Vec<i32> = registry
            .years()
            .into_iter()
            .filter(|year| years.map_or(true, |wanted| wanted.contains(year)))
            .collect();

        let mut analyses = BTreeMap::new();
        let mut skipped = Vec::new();
        for year in selected {
            let mut analysis = match YearAnalysis::prepare(registry, year, config) {
                Ok(analysis) => analysis,
                Err(e @ GdeltNetError::DegenerateNormalization { .. }) => {
                    warn!(year, error = %e, "year skipped");
                    skipped.push(SkippedYear {
                        year,
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };
            analysis.detect_communities()?;
            analyses.insert(year, analysis);
        }

        info!(
            years = analyses.len(),
            skipped = skipped.len(),
            "community run finished"
        );
        Ok(Self { analyses, skipped })
    }

    /// Analysed years, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.analyses.keys().copied().collect()
    }

    pub fn analysis(&self, year: i32) -> Option<&YearAnalysis> {
        self.analyses.get(&year)
    }

    pub fn skipped(&self) -> &[SkippedYear] {
        &self.skipped
    }

    fn selected(&self, years: Option<&[i32]>) -> Result<Vec<&YearAnalysis>> {
        match years {
            None => Ok(self.analyses.values().collect()),
            Some(wanted) => {
                let mut wanted = wanted.to_vec();
                wanted.sort_unstable();
                wanted.dedup();
                wanted
                    .into_iter()
                    .map(|year| {
                        self.analyses
                            .get(&year)
                            .ok_or(GdeltNetError::CommunitiesNotEstimated { year })
                    })
                    .collect()
            }
        }
    }

    /// Representative country codes, chronological.
    pub fn representatives(&self, years: Option<&[i32]>) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for analysis in self.selected(years)? {
            names.extend(analysis.representatives()?);
        }
        Ok(names)
    }

    /// One row per retained community representative.
    pub fn rows(&self, years: Option<&[i32]>) -> Result<Vec<CommunityRow>> {
        let mut rows = Vec::new();
        for analysis in self.selected(years)? {
            rows.extend(analysis.community_rows()?);
        }
        Ok(rows)
    }
}
