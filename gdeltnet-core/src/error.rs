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

//! Error taxonomy shared by every gdeltnet crate.

use crate::matrix::Polarity;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GdeltNetError {
    /// Malformed date/period key or configuration value. Raised before any
    /// computation starts.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An event references a country code that is not in the index.
    #[error("Unknown actor: {code}")]
    UnknownActor { code: String },

    /// The year tensor has no value of the given polarity, so the
    /// corresponding normalisation factor would be zero.
    #[error("Degenerate normalization for {year}: no {missing} values in the year tensor")]
    DegenerateNormalization { year: i32, missing: Polarity },

    #[error("Communities have not been estimated for {year}")]
    CommunitiesNotEstimated { year: i32 },

    #[error("Graph metrics have not been initialized for {year}")]
    MetricsNotInitialized { year: i32 },

    #[error("Dimension mismatch: expected {expected}x{expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: String },

    #[error("Missing artifact: {0}")]
    MissingArtifact(String),

    /// Upstream input for a day could not be read.
    #[error("Event source error: {0}")]
    EventSource(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GdeltNetError {
    fn from(err: serde_json::Error) -> Self {
        GdeltNetError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for GdeltNetError {
    fn from(err: bincode::Error) -> Self {
        GdeltNetError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for GdeltNetError {
    fn from(err: csv::Error) -> Self {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => GdeltNetError::Io(io),
            _ => GdeltNetError::Serialization(message),
        }
    }
}

impl From<toml::de::Error> for GdeltNetError {
    fn from(err: toml::de::Error) -> Self {
        GdeltNetError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GdeltNetError>;
