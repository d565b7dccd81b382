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

//! Date keys for day (`YYYYMMDD`), month (`YYYYMM`) and year (`YYYY`) artifacts.
//!
//! Keys are validated on construction so that a malformed period fails fast,
//! before any event is read or any matrix allocated.

use crate::error::{GdeltNetError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn digits(input: &str, len: usize, what: &str) -> Result<()> {
    if input.len() != len || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GdeltNetError::Validation(format!(
            "not a valid {} key: {:?} (expected {} digits)",
            what, input, len
        )));
    }
    Ok(())
}

/// A calendar day, e.g. `20230615`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn parse(input: &str) -> Result<Self> {
        digits(input, 8, "day")?;
        NaiveDate::parse_from_str(input, "%Y%m%d")
            .map(DayKey)
            .map_err(|e| GdeltNetError::Validation(format!("not a valid day {:?}: {}", input, e)))
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(DayKey)
            .ok_or_else(|| {
                GdeltNetError::Validation(format!("not a valid day: {}-{}-{}", year, month, day))
            })
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn month(&self) -> MonthKey {
        MonthKey {
            year: self.0.year(),
            month: self.0.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d"))
    }
}

impl FromStr for DayKey {
    type Err = GdeltNetError;

    fn from_str(s: &str) -> Result<Self> {
        DayKey::parse(s)
    }
}

impl TryFrom<String> for DayKey {
    type Error = GdeltNetError;

    fn try_from(value: String) -> Result<Self> {
        DayKey::parse(&value)
    }
}

impl From<DayKey> for String {
    fn from(key: DayKey) -> Self {
        key.to_string()
    }
}

/// A calendar month, e.g. `202306`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn parse(input: &str) -> Result<Self> {
        digits(input, 6, "month")?;
        let year: i32 = input[0..4]
            .parse()
            .map_err(|_| GdeltNetError::Validation(format!("bad year in {:?}", input)))?;
        let month: u32 = input[4..6]
            .parse()
            .map_err(|_| GdeltNetError::Validation(format!("bad month in {:?}", input)))?;
        MonthKey::new(year, month)
    }

    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(GdeltNetError::Validation(format!(
                "month out of range: {} (expected 1-12)",
                month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 1-based month number.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Every day of this month, in order.
    pub fn days(&self) -> Vec<DayKey> {
        let mut out = Vec::with_capacity(31);
        let mut day = NaiveDate::from_ymd_opt(self.year, self.month, 1);
        while let Some(d) = day {
            if d.month() != self.month {
                break;
            }
            out.push(DayKey(d));
            day = d.succ_opt();
        }
        out
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = GdeltNetError;

    fn from_str(s: &str) -> Result<Self> {
        MonthKey::parse(s)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = GdeltNetError;

    fn try_from(value: String) -> Result<Self> {
        MonthKey::parse(&value)
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

/// Parse a `YYYY` year key.
pub fn parse_year(input: &str) -> Result<i32> {
    digits(input, 4, "year")?;
    input
        .parse()
        .map_err(|_| GdeltNetError::Validation(format!("not a valid year: {:?}", input)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_key_roundtrip() {
        let day = DayKey::parse("20230615").unwrap();
        assert_eq!(day.to_string(), "20230615");
        assert_eq!(day.month().to_string(), "202306");
        assert_eq!(day.year(), 2023);
    }

    #[test]
    fn test_day_key_rejects_malformed() {
        assert!(matches!(DayKey::parse("2023061"), Err(GdeltNetError::Validation(_))));
        assert!(matches!(DayKey::parse("2023O615"), Err(GdeltNetError::Validation(_))));
        assert!(matches!(DayKey::parse("20230230"), Err(GdeltNetError::Validation(_))));
    }

    #[test]
    fn test_month_key() {
        let month: MonthKey = "202012".parse().unwrap();
        assert_eq!(month.year(), 2020);
        assert_eq!(month.month(), 12);
        assert!(MonthKey::parse("202013").is_err());
        assert!(MonthKey::parse("20201").is_err());
        assert!(MonthKey::parse("2020-1").is_err());
    }

    #[test]
    fn test_month_days() {
        assert_eq!(MonthKey::new(2024, 2).unwrap().days().len(), 29);
        assert_eq!(MonthKey::new(2023, 2).unwrap().days().len(), 28);
        let dec = MonthKey::new(2022, 12).unwrap().days();
        assert_eq!(dec.len(), 31);
        assert_eq!(dec.last().unwrap().to_string(), "20221231");
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2021").unwrap(), 2021);
        assert!(parse_year("21").is_err());
        assert!(parse_year("20x1").is_err());
    }

    #[test]
    fn test_month_ordering() {
        let a = MonthKey::new(2022, 12).unwrap();
        let b = MonthKey::new(2023, 1).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_keys_serialize_as_strings() {
        let day = DayKey::parse("20200101").unwrap();
        assert_eq!(serde_json::to_string(&day).unwrap(), "\"20200101\"");
        let month: MonthKey = serde_json::from_str("\"202001\"").unwrap();
        assert_eq!(month, MonthKey::new(2020, 1).unwrap());
    }
}
