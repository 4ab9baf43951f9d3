//! CSV recording adapter
//!
//! Reads one animal's bout table. Only the configured timestamp and duration
//! columns are used; other columns are ignored. Timestamps are passed through
//! untouched so that the classifier can count unparseable ones.

use crate::config::CsvColumns;
use crate::error::AnalysisError;
use crate::types::{AnimalInput, RawBoutRecord};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;
use std::io::Read;
use std::path::Path;

use super::{AnimalBouts, BoutAdapter};

/// CSV adapter keyed on header names
#[derive(Debug, Clone, Default)]
pub struct CsvBoutAdapter {
    columns: CsvColumns,
}

impl BoutAdapter for CsvBoutAdapter {
    fn parse(&self, animal_id: &str, raw: &str) -> Result<AnimalBouts, AnalysisError> {
        self.read(animal_id, raw.as_bytes())
    }
}

impl CsvBoutAdapter {
    pub fn new(columns: CsvColumns) -> Self {
        Self { columns }
    }

    /// Read a CSV file from disk
    pub fn read_path(&self, animal_id: &str, path: &Path) -> Result<AnimalBouts, AnalysisError> {
        let reader = Self::builder().from_path(path)?;
        self.collect(animal_id, reader)
    }

    pub fn read<R: Read>(&self, animal_id: &str, source: R) -> Result<AnimalBouts, AnalysisError> {
        let reader = Self::builder().from_reader(source);
        self.collect(animal_id, reader)
    }

    fn builder() -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder.flexible(true).trim(Trim::All);
        builder
    }

    fn collect<R: Read>(
        &self,
        animal_id: &str,
        mut reader: csv::Reader<R>,
    ) -> Result<AnimalBouts, AnalysisError> {
        let headers = reader.headers()?.clone();
        let ts_idx = column_index(&headers, &self.columns.timestamp)?;
        let dur_idx = column_index(&headers, &self.columns.duration)?;

        let mut records = Vec::new();
        let mut rejected_rows = 0;

        for row in reader.records() {
            let row = row?;
            let timestamp = row.get(ts_idx).unwrap_or_default();
            match row.get(dur_idx).and_then(parse_duration) {
                Some(duration) => records.push(RawBoutRecord::new(timestamp, duration)),
                None => {
                    rejected_rows += 1;
                    debug!(
                        "{}: rejecting row {:?} (bad duration)",
                        animal_id,
                        row.position().map(|p| p.line())
                    );
                }
            }
        }

        Ok(AnimalBouts {
            input: AnimalInput {
                animal_id: animal_id.to_string(),
                records,
            },
            rejected_rows,
        })
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, AnalysisError> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| AnalysisError::MissingColumn(name.to_string()))
}

/// Non-negative finite duration, or `None`
fn parse_duration(field: &str) -> Option<f64> {
    field
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reads_configured_columns() {
        let csv = "\
timestamp,duration,state
2023-09-19 05:59:00,12.5,sleep
2023-09-19 06:00:00,3,sleep
";
        let bouts = CsvBoutAdapter::default().parse("A1", csv).unwrap();
        assert_eq!(bouts.input.animal_id, "A1");
        assert_eq!(
            bouts.input.records,
            vec![
                RawBoutRecord::new("2023-09-19 05:59:00", 12.5),
                RawBoutRecord::new("2023-09-19 06:00:00", 3.0),
            ]
        );
        assert_eq!(bouts.rejected_rows, 0);
    }

    #[test]
    fn test_bad_durations_are_rejected() {
        let csv = "\
timestamp,duration
2023-09-19 07:00:00,
2023-09-19 08:00:00,abc
2023-09-19 09:00:00,NaN
2023-09-19 10:00:00,-4
2023-09-19 11:00:00,inf
2023-09-19 12:00:00,0
";
        let bouts = CsvBoutAdapter::default().parse("A1", csv).unwrap();
        assert_eq!(bouts.rejected_rows, 5);
        assert_eq!(bouts.input.records.len(), 1);
        assert_eq!(bouts.input.records[0].duration_seconds, 0.0);
    }

    #[test]
    fn test_bad_timestamps_pass_through() {
        let csv = "timestamp,duration\nnot-a-date,5\n";
        let bouts = CsvBoutAdapter::default().parse("A1", csv).unwrap();
        assert_eq!(bouts.input.records[0].timestamp, "not-a-date");
    }

    #[test]
    fn test_custom_column_names() {
        let adapter = CsvBoutAdapter::new(CsvColumns {
            timestamp: "Time".to_string(),
            duration: "Bout Length".to_string(),
        });
        let csv = "time,bout length\n9/19/23 5:59,8\n";
        let bouts = adapter.parse("A1", csv).unwrap();
        assert_eq!(bouts.input.records[0].timestamp, "9/19/23 5:59");
        assert_eq!(bouts.input.records[0].duration_seconds, 8.0);
    }

    #[test]
    fn test_missing_column() {
        let csv = "time,duration\n2023-09-19 07:00:00,3\n";
        assert!(matches!(
            CsvBoutAdapter::default().parse("A1", csv),
            Err(AnalysisError::MissingColumn(col)) if col == "timestamp"
        ));
    }
}
