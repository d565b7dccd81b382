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

//! Bidirectional country code <-> matrix position mapping.

use crate::error::{GdeltNetError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;

/// Ordered, duplicate-free list of country codes.
///
/// Position `i` is row/column `i` of every matrix built during a run. The
/// index is immutable once built and is shared read-only between workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CountryIndex {
    codes: Vec<String>,
    positions: HashMap<String, usize>,
}

impl CountryIndex {
    /// Build from codes in the given order. Empty and duplicate codes are rejected.
    pub fn from_codes<I, S>(codes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut positions = HashMap::new();
        for code in codes {
            let code: String = code.into();
            let code = code.trim().to_string();
            if code.is_empty() {
                return Err(GdeltNetError::Validation(
                    "country code must not be empty".to_string(),
                ));
            }
            if positions.insert(code.clone(), ordered.len()).is_some() {
                return Err(GdeltNetError::Validation(format!(
                    "duplicate country code: {}",
                    code
                )));
            }
            ordered.push(code);
        }
        Ok(Self {
            codes: ordered,
            positions,
        })
    }

    /// Read a tab-separated table with a header row and keep the non-empty
    /// values of `column`, in file order.
    pub fn from_tsv_column<R: Read>(reader: R, column: &str) -> Result<Self> {
        let mut table = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = table.headers()?.clone();
        if headers.is_empty() {
            return Err(GdeltNetError::Validation(
                "country table is empty".to_string(),
            ));
        }
        let col = headers
            .iter()
            .position(|name| name == column)
            .ok_or_else(|| {
                GdeltNetError::Validation(format!("column {:?} not found in country table", column))
            })?;

        let mut codes = Vec::new();
        for record in table.records() {
            let record = record?;
            if let Some(value) = record.get(col).filter(|value| !value.is_empty()) {
                codes.push(value.to_string());
            }
        }
        Self::from_codes(codes)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Position of `code`, if present.
    pub fn index(&self, code: &str) -> Option<usize> {
        self.positions.get(code).copied()
    }

    /// Position of `code`, or `UnknownActor`.
    pub fn resolve(&self, code: &str) -> Result<usize> {
        self.index(code).ok_or_else(|| GdeltNetError::UnknownActor {
            code: code.to_string(),
        })
    }

    /// Code at `position`, if in range.
    pub fn code(&self, position: usize) -> Option<&str> {
        self.codes.get(position).map(String::as_str)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.positions.contains_key(code)
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }
}

impl TryFrom<Vec<String>> for CountryIndex {
    type Error = GdeltNetError;

    fn try_from(codes: Vec<String>) -> Result<Self> {
        CountryIndex::from_codes(codes)
    }
}

impl From<CountryIndex> for Vec<String> {
    fn from(index: CountryIndex) -> Self {
        index.codes
    }
}
