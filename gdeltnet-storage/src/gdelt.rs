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

//! Reader for GDELT 2.0 event export files already on local disk.
//!
//! An export file is tab separated, one event per line, no header. A day is
//! made of many 15-minute export files; they are registered explicitly (or
//! through a manifest) rather than discovered by listing a directory.

use crate::source::{EventSource, EventStream};
use gdeltnet_core::{CountryIndex, DayKey, Event, GdeltNetError, MonthKey, Result};
use std::collections::BTreeMap;
use std::fs::File;
use csv::{StringRecord, StringRecordsIntoIter};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Actor1CountryCode
pub const COL_ACTOR1_COUNTRY: usize = 5;
/// Actor2CountryCode
pub const COL_ACTOR2_COUNTRY: usize = 15;
/// GoldsteinScale
pub const COL_GOLDSTEIN: usize = 30;
/// NumSources
pub const COL_NUM_SOURCES: usize = 32;
/// NumArticles
pub const COL_NUM_ARTICLES: usize = 33;
/// AvgTone
pub const COL_AVG_TONE: usize = 34;

/// Outcome of parsing one export line.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Accepted(Event),
    /// Empty actor code, or a code outside the country index.
    Filtered,
    /// Structurally broken row: missing columns, unparsable or non-finite numbers.
    Rejected(String),
}

/// Reader settings for export files and manifests: tab separated, no
/// header, no quoting (URLs in the last column may carry raw quotes).
fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader)
}

/// Parse one export record against `countries`.
pub fn parse_export_row(record: &StringRecord, countries: &CountryIndex) -> RowOutcome {
    if record.len() <= COL_AVG_TONE {
        return RowOutcome::Rejected(format!(
            "expected at least {} columns, got {}",
            COL_AVG_TONE + 1,
            record.len()
        ));
    }

    let field = |col: usize| record.get(col).unwrap_or_default().trim();
    let actor1 = field(COL_ACTOR1_COUNTRY);
    let actor2 = field(COL_ACTOR2_COUNTRY);
    if actor1.is_empty() || actor2.is_empty() {
        return RowOutcome::Filtered;
    }
    if !countries.contains(actor1) || !countries.contains(actor2) {
        return RowOutcome::Filtered;
    }

    let number = |col: usize| -> std::result::Result<f64, String> {
        let raw = field(col);
        let value: f64 = raw
            .parse()
            .map_err(|_| format!("column {}: not a number: {:?}", col, raw))?;
        if !value.is_finite() {
            return Err(format!("column {}: non-finite value", col));
        }
        Ok(value)
    };

    let parsed = (|| {
        Ok::<_, String>(Event::new(
            actor1,
            actor2,
            number(COL_GOLDSTEIN)?,
            number(COL_NUM_SOURCES)?,
            number(COL_NUM_ARTICLES)?,
            number(COL_AVG_TONE)?,
        ))
    })();

    match parsed {
        Ok(event) => RowOutcome::Accepted(event),
        Err(reason) => RowOutcome::Rejected(reason),
    }
}

/// Event source backed by GDELT export files on disk.
pub struct GdeltExportSource {
    countries: Arc<CountryIndex>,
    files: BTreeMap<DayKey, Vec<PathBuf>>,
}

impl GdeltExportSource {
    pub fn new(countries: Arc<CountryIndex>) -> Self {
        Self {
            countries,
            files: BTreeMap::new(),
        }
    }

    /// Register an export file as part of `day`.
    pub fn register_file(&mut self, day: DayKey, path: impl Into<PathBuf>) {
        self.files.entry(day).or_default().push(path.into());
    }

    /// Register files from a manifest: one `<timestamp>\t<path>` entry per
    /// line, where the first 8 digits of the timestamp are the day. Relative
    /// paths are resolved against `base_dir`.
    pub fn register_manifest<R: Read>(&mut self, manifest: R, base_dir: &Path) -> Result<usize> {
        let mut registered = 0;
        for record in tsv_reader(manifest).into_records() {
            let record = record?;
            let line_no = record.position().map_or(0, |pos| pos.line());
            let stamp = record.get(0).unwrap_or_default().trim();
            let path = record.get(1).map(str::trim).unwrap_or_default();
            if record.len() == 1 && stamp.is_empty() {
                continue;
            }
            if record.len() != 2 || path.is_empty() {
                return Err(GdeltNetError::Validation(format!(
                    "manifest line {}: expected '<timestamp>\\t<path>'",
                    line_no
                )));
            }
            let day = DayKey::parse(stamp.get(0..8).unwrap_or(stamp))?;
            let path = Path::new(path);
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            };
            self.register_file(day, path);
            registered += 1;
        }
        Ok(registered)
    }

    pub fn file_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}

impl EventSource for GdeltExportSource {
    fn days(&self, month: MonthKey) -> Vec<DayKey> {
        self.files
            .keys()
            .filter(|day| day.month() == month)
            .copied()
            .collect()
    }

    fn events(&self, day: DayKey) -> Result<EventStream<'_>> {
        let files = self.files.get(&day).cloned().unwrap_or_default();
        // Every file of the day must at least open, otherwise the day is unreadable.
        for path in &files {
            if !path.is_file() {
                return Err(GdeltNetError::EventSource(format!(
                    "{}: export file not readable: {}",
                    day,
                    path.display()
                )));
            }
        }
        Ok(Box::new(ExportEvents {
            day,
            countries: Arc::clone(&self.countries),
            pending: files.into_iter().rev().collect(),
            current: None,
            accepted: 0,
            filtered: 0,
            rejected: 0,
            finished: false,
        }))
    }
}

struct ExportEvents {
    day: DayKey,
    countries: Arc<CountryIndex>,
    /// Files still to read, last one first.
    pending: Vec<PathBuf>,
    current: Option<(PathBuf, StringRecordsIntoIter<File>)>,
    accepted: usize,
    filtered: usize,
    rejected: usize,
    finished: bool,
}

impl Iterator for ExportEvents {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            if self.current.is_none() {
                let Some(path) = self.pending.pop() else {
                    self.finished = true;
                    debug!(
                        day = %self.day,
                        accepted = self.accepted,
                        filtered = self.filtered,
                        rejected = self.rejected,
                        "export files exhausted"
                    );
                    return None;
                };
                match File::open(&path) {
                    Ok(file) => self.current = Some((path, tsv_reader(file).into_records())),
                    Err(e) => {
                        self.finished = true;
                        return Some(Err(GdeltNetError::EventSource(format!(
                            "{}: cannot open {}: {}",
                            self.day,
                            path.display(),
                            e
                        ))));
                    }
                }
            }

            let Some((path, records)) = self.current.as_mut() else {
                continue;
            };
            match records.next() {
                None => self.current = None,
                Some(Err(e)) => {
                    let message = format!("{}: read error in {}: {}", self.day, path.display(), e);
                    self.finished = true;
                    return Some(Err(GdeltNetError::EventSource(message)));
                }
                Some(Ok(record)) => {
                    if record.iter().all(|field| field.trim().is_empty()) {
                        continue;
                    }
                    match parse_export_row(&record, &self.countries) {
                        RowOutcome::Accepted(event) => {
                            self.accepted += 1;
                            return Some(Ok(event));
                        }
                        RowOutcome::Filtered => self.filtered += 1,
                        RowOutcome::Rejected(reason) => {
                            self.rejected += 1;
                            warn!(day = %self.day, file = %path.display(), %reason, "rejected export row");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fields(actor1: &str, actor2: &str, g: &str, ns: &str, na: &str, tone: &str) -> Vec<String> {
        let mut fields = vec![String::new(); 61];
        fields[0] = "1".to_string();
        fields[COL_ACTOR1_COUNTRY] = actor1.to_string();
        fields[COL_ACTOR2_COUNTRY] = actor2.to_string();
        fields[COL_GOLDSTEIN] = g.to_string();
        fields[COL_NUM_SOURCES] = ns.to_string();
        fields[COL_NUM_ARTICLES] = na.to_string();
        fields[COL_AVG_TONE] = tone.to_string();
        fields
    }

    fn row(actor1: &str, actor2: &str, g: &str, ns: &str, na: &str, tone: &str) -> StringRecord {
        StringRecord::from(fields(actor1, actor2, g, ns, na, tone))
    }

    fn line(actor1: &str, actor2: &str, g: &str, ns: &str, na: &str, tone: &str) -> String {
        fields(actor1, actor2, g, ns, na, tone).join("\t")
    }

    fn countries() -> Arc<CountryIndex> {
        Arc::new(CountryIndex::from_codes(["USA", "RUS", "CHN"]).unwrap())
    }

    #[test]
    fn test_parse_accepted_row() {
        let record = row("USA", "RUS", "5", "2", "3", "1.0");
        match parse_export_row(&record, &countries()) {
            RowOutcome::Accepted(event) => {
                assert_eq!(event, Event::new("USA", "RUS", 5.0, 2.0, 3.0, 1.0));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_filters_unknown_and_empty_actors() {
        let c = countries();
        assert_eq!(parse_export_row(&row("USA", "", "1", "1", "1", "1"), &c), RowOutcome::Filtered);
        assert_eq!(parse_export_row(&row("USA", "FRA", "1", "1", "1", "1"), &c), RowOutcome::Filtered);
        // Full match only: a prefix of a known code is not a match.
        assert_eq!(parse_export_row(&row("US", "RUS", "1", "1", "1", "1"), &c), RowOutcome::Filtered);
    }

    #[test]
    fn test_parse_rejects_broken_rows() {
        let c = countries();
        assert!(matches!(
            parse_export_row(&StringRecord::from(vec!["USA", "RUS"]), &c),
            RowOutcome::Rejected(_)
        ));
        assert!(matches!(
            parse_export_row(&row("USA", "RUS", "abc", "1", "1", "1"), &c),
            RowOutcome::Rejected(_)
        ));
        assert!(matches!(
            parse_export_row(&row("USA", "RUS", "NaN", "1", "1", "1"), &c),
            RowOutcome::Rejected(_)
        ));
    }

    #[test]
    fn test_source_reads_registered_files() {
        let dir = tempfile::tempdir().unwrap();
        let day = DayKey::parse("20230615").unwrap();

        let first = dir.path().join("20230615000000.export.CSV");
        let mut f = File::create(&first).unwrap();
        writeln!(f, "{}", line("USA", "RUS", "5", "2", "3", "1")).unwrap();
        writeln!(f, "{}", line("USA", "FRA", "5", "2", "3", "1")).unwrap();

        let second = dir.path().join("20230615001500.export.CSV");
        let mut f = File::create(&second).unwrap();
        writeln!(f, "{}", line("CHN", "USA", "-2", "1", "1", "0.5")).unwrap();

        let mut source = GdeltExportSource::new(countries());
        source.register_file(day, &first);
        source.register_file(day, &second);

        let events: Vec<Event> = source
            .events(day)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].actor1_code, "CHN");
        assert_eq!(source.days(day.month()), vec![day]);
    }

    #[test]
    fn test_source_tolerates_quotes_crlf_and_short_rows() {
        let dir = tempfile::tempdir().unwrap();
        let day = DayKey::parse("20230616").unwrap();

        let path = dir.path().join("20230616000000.export.CSV");
        let mut quoted = fields("RUS", "CHN", "1.5", "4", "8", "-2");
        quoted[60] = "https://example.org/a\"b".to_string();
        let mut f = File::create(&path).unwrap();
        write!(f, "{}\r\n", quoted.join("\t")).unwrap();
        write!(f, "USA\tRUS\r\n").unwrap();
        write!(f, "   \r\n").unwrap();
        write!(f, "{}\r\n", line("USA", "CHN", "-3", "1", "2", "0")).unwrap();

        let mut source = GdeltExportSource::new(countries());
        source.register_file(day, &path);
        let events: Vec<Event> = source
            .events(day)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(
            events,
            vec![
                Event::new("RUS", "CHN", 1.5, 4.0, 8.0, -2.0),
                Event::new("USA", "CHN", -3.0, 1.0, 2.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_missing_file_fails_the_day() {
        let mut source = GdeltExportSource::new(countries());
        let day = DayKey::parse("20230615").unwrap();
        source.register_file(day, "/definitely/not/here.CSV");
        assert!(matches!(source.events(day), Err(GdeltNetError::EventSource(_))));
    }

    #[test]
    fn test_manifest_registration() {
        let manifest = "20230615000000\ta.CSV\n\n20230616001500\t/abs/b.CSV\n";
        let mut source = GdeltExportSource::new(countries());
        let n = source
            .register_manifest(manifest.as_bytes(), Path::new("/data"))
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(source.file_count(), 2);
        assert_eq!(source.days(MonthKey::new(2023, 6).unwrap()).len(), 2);

        assert!(source
            .register_manifest("garbage-line".as_bytes(), Path::new("/data"))
            .is_err());
    }
}
