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

//! Edge weight of a single event.
//!
//! The Goldstein score sets the sign and base intensity of the contribution.
//! Coverage (sources, articles) pushes the weight further away from zero in
//! the direction of that sign, while tone is always added as-is. Events with
//! a neutral Goldstein score take their sign from the tone instead.

use crate::event::Event;
use serde::{Deserialize, Serialize};

pub const DEFAULT_THETA1: f64 = 0.025;
pub const DEFAULT_THETA2: f64 = 0.01;
pub const DEFAULT_THETA3: f64 = 0.01;

/// Coefficients of the edge weight function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeWeights {
    /// Coefficient of the number of sources.
    pub theta1: f64,
    /// Coefficient of the number of articles.
    pub theta2: f64,
    /// Coefficient of the average tone.
    pub theta3: f64,
}

impl Default for EdgeWeights {
    fn default() -> Self {
        Self {
            theta1: DEFAULT_THETA1,
            theta2: DEFAULT_THETA2,
            theta3: DEFAULT_THETA3,
        }
    }
}

impl EdgeWeights {
    pub fn new(theta1: f64, theta2: f64, theta3: f64) -> Self {
        Self {
            theta1,
            theta2,
            theta3,
        }
    }

    /// Weight for the raw event attributes.
    pub fn weight(&self, goldstein: f64, num_sources: f64, num_articles: f64, avg_tone: f64) -> f64 {
        let coverage = self.theta1 * num_sources + self.theta2 * num_articles;
        let tone = self.theta3 * avg_tone;

        if goldstein > 0.0 {
            goldstein + coverage + tone
        } else if goldstein < 0.0 {
            goldstein - coverage + tone
        } else if avg_tone > 0.0 {
            coverage + tone
        } else if avg_tone < 0.0 {
            -coverage + tone
        } else {
            0.0
        }
    }

    pub fn event_weight(&self, event: &Event) -> f64 {
        self.weight(
            event.goldstein,
            event.num_sources,
            event.num_articles,
            event.avg_tone,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.theta1.is_finite() && self.theta2.is_finite() && self.theta3.is_finite()
    }
}
