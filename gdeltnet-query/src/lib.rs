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

//! gdeltnet query engine
//!
//! Orchestration on top of the storage and graph crates.

pub mod analysis;
pub mod community_run;
pub mod export;
pub mod pipeline;
pub mod table;

pub use analysis::YearAnalysis;
pub use community_run::{CommunityRun, SkippedYear};
pub use export::{
    community_row, metric_rows, write_csv, CommunityRow, MetricRow, MetricType,
    MetricsDocEntry, MetricsDocument, GLOBAL_NODE,
};
pub use pipeline::{FailedDay, MonthBuildReport, MonthPipeline};
pub use table::{GraphEntry, GraphKey, GraphTable};
