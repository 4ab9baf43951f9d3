//! Sheet-shaped tables
//!
//! Renders an [`AnalysisOutput`] into plain string grids suitable for a
//! spreadsheet: one row per bin label followed by a `Total` row, one column
//! per animal and a mean/std/sem column group per cohort.

use crate::error::AnalysisError;
use crate::phase::ZT_HOURS;
use crate::types::{AnalysisOutput, Category, CohortReport, ScalarSummary, Summary};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Label of the synthetic row holding per-animal bout totals
pub const TOTAL_ROW_LABEL: &str = "Total";

/// A named grid of cells with a header row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Value of a cell by row label and column header
    pub fn cell(&self, row_label: &str, column: &str) -> Option<&str> {
        let col = self.header.iter().position(|h| h == column)?;
        self.rows
            .iter()
            .find(|row| row.first().map(String::as_str) == Some(row_label))
            .and_then(|row| row.get(col))
            .map(String::as_str)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), AnalysisError> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(&self.header)?;
        for row in &self.rows {
            out.write_record(row)?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String, AnalysisError> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| AnalysisError::ParseError(e.to_string()))
    }
}

/// Whole-recording bin counts for one category
pub fn bin_count_table(output: &AnalysisOutput, category: Category) -> Table {
    let mut header = vec!["bin".to_string()];
    header.extend(animal_columns(output));
    header.extend(stat_columns(&output.cohorts));

    let mut rows = Vec::with_capacity(output.bin_labels.len() + 1);
    for (i, label) in output.bin_labels.iter().enumerate() {
        let mut row = vec![label.clone()];
        for cohort in &output.cohorts {
            for id in &cohort.animal_ids {
                let count = output.animal(id).map(|a| a.bin_counts(category)[i]);
                row.push(count.map(|c| c.to_string()).unwrap_or_default());
            }
        }
        for cohort in &output.cohorts {
            row.extend(summary_cells(cohort.bins(category).map(|s| &s.summary), i));
        }
        rows.push(row);
    }

    let mut total = vec![TOTAL_ROW_LABEL.to_string()];
    for cohort in &output.cohorts {
        for id in &cohort.animal_ids {
            let count = output.animal(id).map(|a| a.total_bouts(category));
            total.push(count.map(|c| c.to_string()).unwrap_or_default());
        }
    }
    for cohort in &output.cohorts {
        total.extend(scalar_cells(cohort.totals(category).map(|s| &s.summary)));
    }
    rows.push(total);

    Table {
        name: format!("{}_bins", category.as_str()),
        header,
        rows,
    }
}

/// Bin counts for one category restricted to one experimental day.
///
/// Animals without data that day get empty cells rather than zeros.
pub fn day_bin_count_table(output: &AnalysisOutput, category: Category, day: u32) -> Table {
    let mut header = vec!["bin".to_string()];
    header.extend(animal_columns(output));
    header.extend(stat_columns(&output.cohorts));

    let day_counts = |id: &str| {
        output
            .animal(id)
            .and_then(|a| a.per_day.get(&day))
            .map(|d| d.bin_counts(category))
    };

    let mut rows = Vec::with_capacity(output.bin_labels.len() + 1);
    for (i, label) in output.bin_labels.iter().enumerate() {
        let mut row = vec![label.clone()];
        for cohort in &output.cohorts {
            for id in &cohort.animal_ids {
                row.push(day_counts(id).map(|c| c[i].to_string()).unwrap_or_default());
            }
        }
        for cohort in &output.cohorts {
            let summary = cohort
                .day(day)
                .and_then(|d| d.bins.iter().find(|s| s.category == category))
                .map(|s| &s.summary);
            row.extend(summary_cells(summary, i));
        }
        rows.push(row);
    }

    let mut total = vec![TOTAL_ROW_LABEL.to_string()];
    for cohort in &output.cohorts {
        for id in &cohort.animal_ids {
            let count = day_counts(id).map(|c| c.iter().sum::<u64>());
            total.push(count.map(|c| c.to_string()).unwrap_or_default());
        }
    }
    for cohort in &output.cohorts {
        let summary = cohort
            .day(day)
            .and_then(|d| d.totals.iter().find(|s| s.category == category))
            .map(|s| &s.summary);
        total.extend(scalar_cells(summary));
    }
    rows.push(total);

    Table {
        name: format!("day{}_{}_bins", day, category.as_str()),
        header,
        rows,
    }
}

/// Per-ZT-hour bout counts and average bout durations per cohort
pub fn zt_table(output: &AnalysisOutput) -> Table {
    let mut header = vec!["zt".to_string()];
    for cohort in &output.cohorts {
        for channel in ["count", "avg_duration"] {
            for stat in ["mean", "std", "sem"] {
                header.push(format!("{} {} {}", cohort.cohort_label, channel, stat));
            }
        }
    }

    let rows = (0..ZT_HOURS)
        .map(|zt| {
            let mut row = vec![format!("ZT{}", zt)];
            for cohort in &output.cohorts {
                row.extend(summary_cells(Some(&cohort.zt.counts), zt));
                row.extend(summary_cells(Some(&cohort.zt.average_duration), zt));
            }
            row
        })
        .collect();

    Table {
        name: "zt".to_string(),
        header,
        rows,
    }
}

/// Every whole-recording table: sleep, light and dark bins plus ZT
pub fn all_tables(output: &AnalysisOutput) -> Vec<Table> {
    let mut tables: Vec<Table> = Category::ALL
        .iter()
        .map(|&category| bin_count_table(output, category))
        .collect();
    tables.push(zt_table(output));
    tables
}

/// Write each table to `<dir>/<name>.csv`, returning the paths written
pub fn write_tables(tables: &[Table], dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(format!("{}.csv", table.name));
        let file = std::fs::File::create(&path)?;
        table.write_csv(file)?;
        written.push(path);
    }
    Ok(written)
}

fn animal_columns(output: &AnalysisOutput) -> Vec<String> {
    output
        .cohorts
        .iter()
        .flat_map(|c| c.animal_ids.iter().cloned())
        .collect()
}

fn stat_columns(cohorts: &[CohortReport]) -> Vec<String> {
    cohorts
        .iter()
        .flat_map(|c| {
            ["mean", "std", "sem"]
                .into_iter()
                .map(move |stat| format!("{} {}", c.cohort_label, stat))
        })
        .collect()
}

fn summary_cells(summary: Option<&Summary>, i: usize) -> [String; 3] {
    match summary {
        Some(s) => [
            s.mean[i].to_string(),
            s.std[i].to_string(),
            s.sem[i].to_string(),
        ],
        None => Default::default(),
    }
}

fn scalar_cells(summary: Option<&ScalarSummary>) -> [String; 3] {
    match summary {
        Some(s) => [s.mean.to_string(), s.std.to_string(), s.sem.to_string()],
        None => Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::{Cohort, CohortAssignment};
    use crate::config::AnalysisConfig;
    use crate::pipeline::run_analysis;
    use crate::types::{AnimalInput, RawBoutRecord};
    use pretty_assertions::assert_eq;

    fn make_output() -> AnalysisOutput {
        let config = AnalysisConfig {
            bin_edges: vec![2.0, 4.0, 8.0, f64::INFINITY],
            ..AnalysisConfig::default()
        };
        let cohorts = CohortAssignment::new(vec![
            Cohort::new("wt", ["A", "B"]),
            Cohort::new("mut", ["C"]),
        ])
        .unwrap();
        let animals = vec![
            AnimalInput {
                animal_id: "A".to_string(),
                records: vec![
                    RawBoutRecord::new("2023-09-19 07:00:00", 2.0),
                    RawBoutRecord::new("2023-09-19 07:30:00", 3.0),
                    RawBoutRecord::new("2023-09-20 20:00:00", 9.0),
                ],
            },
            AnimalInput {
                animal_id: "B".to_string(),
                records: vec![RawBoutRecord::new("2023-09-19 07:00:00", 5.0)],
            },
            AnimalInput {
                animal_id: "C".to_string(),
                records: vec![RawBoutRecord::new("2023-09-20 08:00:00", 1.0)],
            },
        ];
        run_analysis(&config, &cohorts, &animals).unwrap()
    }

    #[test]
    fn test_bin_count_table_layout() {
        let table = bin_count_table(&make_output(), Category::Sleep);

        assert_eq!(table.name, "sleep_bins");
        assert_eq!(
            table.header,
            vec!["bin", "A", "B", "C", "wt mean", "wt std", "wt sem", "mut mean", "mut std", "mut sem"]
        );
        let labels: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(labels, vec!["2-4", "4-8", "8+", "Total"]);
        assert!(table.rows.iter().all(|r| r.len() == table.header.len()));
    }

    #[test]
    fn test_bin_count_table_values() {
        let table = bin_count_table(&make_output(), Category::Sleep);

        assert_eq!(table.cell("2-4", "A"), Some("2"));
        assert_eq!(table.cell("4-8", "B"), Some("1"));
        assert_eq!(table.cell("Total", "A"), Some("3"));
        // C's only bout is below the first edge
        assert_eq!(table.cell("Total", "C"), Some("0"));
        assert_eq!(table.cell("2-4", "wt mean"), Some("1"));
        assert_eq!(table.cell("Total", "wt mean"), Some("2"));
        assert_eq!(table.cell("Total", "mut std"), Some("0"));
    }

    #[test]
    fn test_day_table_leaves_missing_animals_blank() {
        let output = make_output();
        // Day 2 starts at 2023-09-20 06:00; only A and C have records there
        let table = day_bin_count_table(&output, Category::Sleep, 2);

        assert_eq!(table.name, "day2_sleep_bins");
        assert_eq!(table.cell("8+", "A"), Some("1"));
        assert_eq!(table.cell("8+", "B"), Some(""));
        assert_eq!(table.cell("8+", "wt mean"), Some("1"));
        assert_eq!(table.cell("Total", "C"), Some("0"));
    }

    #[test]
    fn test_zt_table() {
        let table = zt_table(&make_output());

        assert_eq!(table.rows.len(), ZT_HOURS);
        assert_eq!(table.header.len(), 1 + 2 * 6);
        // A and B both have one bout at 07:00 (ZT1); A has another at 07:30
        assert_eq!(table.cell("ZT1", "wt count mean"), Some("1.5"));
        assert_eq!(table.cell("ZT1", "wt avg_duration mean"), Some("3.75"));
        assert_eq!(table.cell("ZT0", "mut count mean"), Some("0"));
    }

    #[test]
    fn test_write_csv() {
        let table = Table {
            name: "t".to_string(),
            header: vec!["bin".to_string(), "wt mean".to_string()],
            rows: vec![vec!["2-4".to_string(), "1.5".to_string()]],
        };
        assert_eq!(table.to_csv_string().unwrap(), "bin,wt mean\n2-4,1.5\n");
    }

    #[test]
    fn test_all_tables() {
        let names: Vec<String> = all_tables(&make_output())
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["sleep_bins", "light_bins", "dark_bins", "zt"]);
    }

    #[test]
    fn test_write_tables_reports_filesystem_errors_as_io() {
        let blocker = std::env::temp_dir().join(format!("sleepbin-tables-{}", std::process::id()));
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = write_tables(&all_tables(&make_output()), &blocker.join("out"));
        std::fs::remove_file(&blocker).unwrap();

        assert!(matches!(result, Err(AnalysisError::Io(_))));
    }
}
