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

//! gdeltnet storage layer
//!
//! From events to stored matrices:
//! - `EventSource`: per-day event streams (in memory or GDELT export files)
//! - `DailyGraphBuilder`: one day's events into a symmetric signed matrix
//! - `TemporalAggregator`: day matrices into a month matrix
//! - `ArtifactRegistry`: explicit index of day/month artifacts, with snapshots

pub mod builder;
pub mod gdelt;
pub mod registry;
pub mod source;
pub mod temporal;

pub use builder::{DailyGraphBuilder, DayBuild, DayBuildReport};
pub use gdelt::{parse_export_row, GdeltExportSource, RowOutcome};
pub use registry::{ArtifactRegistry, RegistryStats};
pub use source::{EventSource, EventStream, InMemoryEventSource};
pub use temporal::{TemporalAggregator, YearTensor};
