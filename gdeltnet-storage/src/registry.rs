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

//! Artifact registry
//!
//! Explicit index of the day and month matrices produced so far. Downstream
//! stages ask the registry what exists instead of inspecting storage.
//!
//! ## Design
//!
//! - One `RwLock<BTreeMap>` per granularity; keys sort chronologically.
//! - Artifacts are stored behind `Arc`, readers get cheap shared handles.
//! - Inserting under an existing key replaces the artifact. Callers partition
//!   work by key, so there is a single writer per key.
//! - Snapshots are bincode encoded and carry the country index, so a loaded
//!   registry cannot be read against a different country order.

use crate::temporal::YearTensor;
use gdeltnet_core::{
    ensure_square, CountryIndex, DayKey, DayMatrix, GdeltNetError, MonthKey, MonthMatrix, Result,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared registry of day and month artifacts for one country index.
pub struct ArtifactRegistry {
    countries: Arc<CountryIndex>,
    days: RwLock<BTreeMap<DayKey, Arc<DayMatrix>>>,
    months: RwLock<BTreeMap<MonthKey, Arc<MonthMatrix>>>,
}

/// Registry counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub days: usize,
    pub months: usize,
    pub years: usize,
}

#[derive(Serialize, Deserialize)]
struct RegistrySnapshot {
    countries: CountryIndex,
    days: Vec<(DayKey, DayMatrix)>,
    months: Vec<(MonthKey, MonthMatrix)>,
}

impl ArtifactRegistry {
    pub fn new(countries: Arc<CountryIndex>) -> Self {
        Self {
            countries,
            days: RwLock::new(BTreeMap::new()),
            months: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn countries(&self) -> &Arc<CountryIndex> {
        &self.countries
    }

    /// Matrix dimension of every artifact in this registry.
    pub fn dim(&self) -> usize {
        self.countries.len()
    }

    pub fn insert_day(&self, day: DayKey, matrix: DayMatrix) -> Result<()> {
        ensure_square(&matrix, self.dim())?;
        if self.days.write().insert(day, Arc::new(matrix)).is_some() {
            debug!(day = %day, "replaced day artifact");
        }
        Ok(())
    }

    pub fn day(&self, day: DayKey) -> Option<Arc<DayMatrix>> {
        self.days.read().get(&day).cloned()
    }

    /// Day artifacts of `month`, chronological.
    pub fn days_of(&self, month: MonthKey) -> Vec<(DayKey, Arc<DayMatrix>)> {
        self.days
            .read()
            .iter()
            .filter(|(day, _)| day.month() == month)
            .map(|(day, matrix)| (*day, Arc::clone(matrix)))
            .collect()
    }

    pub fn insert_month(&self, month: MonthKey, matrix: MonthMatrix) -> Result<()> {
        ensure_square(&matrix, self.dim())?;
        if self.months.write().insert(month, Arc::new(matrix)).is_some() {
            debug!(month = %month, "replaced month artifact");
        }
        Ok(())
    }

    pub fn month(&self, month: MonthKey) -> Option<Arc<MonthMatrix>> {
        self.months.read().get(&month).cloned()
    }

    /// Months of `year` that have an artifact, chronological.
    pub fn months_of(&self, year: i32) -> Vec<MonthKey> {
        self.months
            .read()
            .keys()
            .filter(|key| key.year() == year)
            .copied()
            .collect()
    }

    /// Years with at least one month artifact, ascending.
    pub fn years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.months.read().keys().map(MonthKey::year).collect();
        years.into_iter().collect()
    }

    /// Year tensor built from the month artifacts of `year`.
    pub fn year_tensor(&self, year: i32) -> Result<YearTensor> {
        let months: Vec<_> = self
            .months
            .read()
            .iter()
            .filter(|(key, _)| key.year() == year)
            .map(|(key, matrix)| (*key, Arc::clone(matrix)))
            .collect();
        if months.is_empty() {
            return Err(GdeltNetError::MissingArtifact(format!(
                "no month artifacts for {}",
                year
            )));
        }
        YearTensor::assemble(year, self.dim(), months)
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            days: self.days.read().len(),
            months: self.months.read().len(),
            years: self.years().len(),
        }
    }

    /// Write every artifact to `path`.
    pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let snapshot = RegistrySnapshot {
            countries: self.countries.as_ref().clone(),
            days: self
                .days
                .read()
                .iter()
                .map(|(k, m)| (*k, m.as_ref().clone()))
                .collect(),
            months: self
                .months
                .read()
                .iter()
                .map(|(k, m)| (*k, m.as_ref().clone()))
                .collect(),
        };
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, &snapshot)?;
        info!(
            path = %path.display(),
            days = snapshot.days.len(),
            months = snapshot.months.len(),
            "saved registry snapshot"
        );
        Ok(())
    }

    /// Load a registry previously written by `save_snapshot`.
    pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let snapshot: RegistrySnapshot = bincode::deserialize_from(reader)?;

        let registry = Self::new(Arc::new(snapshot.countries));
        for (day, matrix) in snapshot.days {
            registry.insert_day(day, matrix)?;
        }
        for (month, matrix) in snapshot.months {
            registry.insert_month(month, matrix)?;
        }
        let stats = registry.stats();
        info!(path = %path.display(), days = stats.days, months = stats.months, "loaded registry snapshot");
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdeltnet_core::zero_matrix;
    use ndarray::array;

    fn registry() -> ArtifactRegistry {
        ArtifactRegistry::new(Arc::new(CountryIndex::from_codes(["USA", "RUS"]).unwrap()))
    }

    #[test]
    fn test_insert_and_query() {
        let registry = registry();
        let jan = MonthKey::new(2023, 1).unwrap();
        let feb = MonthKey::new(2023, 2).unwrap();
        let dec = MonthKey::new(2022, 12).unwrap();

        registry.insert_month(feb, zero_matrix(2)).unwrap();
        registry.insert_month(jan, zero_matrix(2)).unwrap();
        registry.insert_month(dec, zero_matrix(2)).unwrap();

        assert_eq!(registry.months_of(2023), vec![jan, feb]);
        assert_eq!(registry.years(), vec![2022, 2023]);
        assert_eq!(registry.year_tensor(2023).unwrap().len(), 2);
        assert!(matches!(
            registry.year_tensor(2020),
            Err(GdeltNetError::MissingArtifact(_))
        ));
    }

    #[test]
    fn test_insert_replaces() {
        let registry = registry();
        let day = DayKey::parse("20230105").unwrap();
        registry.insert_day(day, zero_matrix(2)).unwrap();
        registry
            .insert_day(day, array![[0.0, 1.0], [1.0, 0.0]])
            .unwrap();
        assert_eq!(registry.stats().days, 1);
        assert_eq!(registry.day(day).unwrap()[[0, 1]], 1.0);
        assert_eq!(registry.days_of(day.month()).len(), 1);
    }

    #[test]
    fn test_dimension_checked() {
        let registry = registry();
        let day = DayKey::parse("20230105").unwrap();
        assert!(matches!(
            registry.insert_day(day, zero_matrix(3)),
            Err(GdeltNetError::DimensionMismatch { expected: 2, .. })
        ));
    }
}
