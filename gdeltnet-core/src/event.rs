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

//! Geopolitical event record as handed over by ingestion.

use serde::{Deserialize, Serialize};

/// One dyadic event between two country actors.
///
/// Numeric fields are finite; ingestion rejects NaN/Infinity before an
/// `Event` is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub actor1_code: String,
    pub actor2_code: String,
    /// Goldstein scale of the event: cooperative (> 0) or conflictual (< 0).
    pub goldstein: f64,
    pub num_sources: f64,
    pub num_articles: f64,
    pub avg_tone: f64,
}

impl Event {
    pub fn new(
        actor1_code: impl Into<String>,
        actor2_code: impl Into<String>,
        goldstein: f64,
        num_sources: f64,
        num_articles: f64,
        avg_tone: f64,
    ) -> Self {
        Self {
            actor1_code: actor1_code.into(),
            actor2_code: actor2_code.into(),
            goldstein,
            num_sources,
            num_articles,
            avg_tone,
        }
    }

    /// Both actors are the same country.
    pub fn is_self_referential(&self) -> bool {
        self.actor1_code == self.actor2_code
    }

    pub fn is_finite(&self) -> bool {
        self.goldstein.is_finite()
            && self.num_sources.is_finite()
            && self.num_articles.is_finite()
            && self.avg_tone.is_finite()
    }
}
