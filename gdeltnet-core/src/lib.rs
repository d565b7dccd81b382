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

//! gdeltnet core
//!
//! Fundamental types for turning geopolitical event records into signed
//! country-to-country interaction graphs: the country index, the event
//! record, the edge weight function, date keys, matrix aliases, the error
//! taxonomy and the run configuration.

pub mod config;
pub mod country;
pub mod date;
pub mod error;
pub mod event;
pub mod matrix;
pub mod weight;

pub use config::{
    AnalysisConfig, CommunityAlgorithmKind, LouvainConfig, PathMetric, SelfLoopPolicy,
    WalktrapConfig, DEFAULT_MIN_COMMUNITY_SIZE, DEFAULT_WALKTRAP_STEPS,
};
pub use country::CountryIndex;
pub use date::{parse_year, DayKey, MonthKey};
pub use error::{GdeltNetError, Result};
pub use event::Event;
pub use matrix::{
    asymmetry, ensure_square, zero_matrix, DayMatrix, MonthMatrix, Polarity, SignedMatrix,
};
pub use weight::{EdgeWeights, DEFAULT_THETA1, DEFAULT_THETA2, DEFAULT_THETA3};
