//! Core types for the sleepbin pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! analysis: raw bout records, classified bouts, per-animal aggregates and
//! cohort-level statistics.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Circadian phase of a bout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Light,
    Dark,
}

/// Histogram category: every bout, or only those in one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Sleep,
    Light,
    Dark,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Sleep, Category::Light, Category::Dark];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Sleep => "sleep",
            Category::Light => "light",
            Category::Dark => "dark",
        }
    }
}

impl From<Phase> for Category {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Light => Category::Light,
            Phase::Dark => Category::Dark,
        }
    }
}

/// One input row as delivered by the ingestion layer.
///
/// The timestamp is kept as text so that malformed values surface as
/// per-record failures during classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBoutRecord {
    pub timestamp: String,
    pub duration_seconds: f64,
}

impl RawBoutRecord {
    pub fn new(timestamp: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            duration_seconds,
        }
    }
}

/// A bout with a parsed timestamp and a finite, non-negative duration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoutRecord {
    pub animal_id: String,
    pub timestamp: NaiveDateTime,
    pub duration_seconds: f64,
}

/// Phase, ZT hour and experimental day assigned to a single bout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedBout {
    #[serde(flatten)]
    pub record: BoutRecord,
    pub phase: Phase,
    pub zt_hour: usize,
    pub day: u32,
    /// Bin index, `None` when the bout is shorter than the first edge
    pub bin: Option<usize>,
}

/// All records belonging to one animal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalInput {
    pub animal_id: String,
    pub records: Vec<RawBoutRecord>,
}

/// Bin counts per category for a single experimental day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBinCounts {
    pub sleep_bin_counts: Vec<u64>,
    pub light_bin_counts: Vec<u64>,
    pub dark_bin_counts: Vec<u64>,
}

impl DayBinCounts {
    pub fn bin_counts(&self, category: Category) -> &[u64] {
        match category {
            Category::Sleep => &self.sleep_bin_counts,
            Category::Light => &self.light_bin_counts,
            Category::Dark => &self.dark_bin_counts,
        }
    }

    pub fn total_bouts(&self, category: Category) -> u64 {
        self.bin_counts(category).iter().sum()
    }
}

/// Binned histograms and ZT tallies for one animal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerAnimalAggregate {
    pub animal_id: String,
    pub cohort_label: String,
    pub sleep_bin_counts: Vec<u64>,
    pub light_bin_counts: Vec<u64>,
    pub dark_bin_counts: Vec<u64>,
    /// Keyed by 1-based experimental day index
    pub per_day: BTreeMap<u32, DayBinCounts>,
    /// Number of bouts starting in each ZT hour (binned or not)
    pub zt_counts: Vec<u64>,
    /// Summed bout duration (seconds) per ZT hour
    pub zt_total_duration: Vec<f64>,
    /// Summed bout duration (seconds) over all bouts
    pub sleep_seconds: f64,
    pub light_seconds: f64,
    pub dark_seconds: f64,
}

impl PerAnimalAggregate {
    /// Aggregate for an animal without any valid records
    pub fn empty(animal_id: &str, cohort_label: &str, num_bins: usize) -> Self {
        Self {
            animal_id: animal_id.to_string(),
            cohort_label: cohort_label.to_string(),
            sleep_bin_counts: vec![0; num_bins],
            light_bin_counts: vec![0; num_bins],
            dark_bin_counts: vec![0; num_bins],
            per_day: BTreeMap::new(),
            zt_counts: vec![0; crate::phase::ZT_HOURS],
            zt_total_duration: vec![0.0; crate::phase::ZT_HOURS],
            sleep_seconds: 0.0,
            light_seconds: 0.0,
            dark_seconds: 0.0,
        }
    }

    pub fn bin_counts(&self, category: Category) -> &[u64] {
        match category {
            Category::Sleep => &self.sleep_bin_counts,
            Category::Light => &self.light_bin_counts,
            Category::Dark => &self.dark_bin_counts,
        }
    }

    /// Total binned bouts in a category
    pub fn total_bouts(&self, category: Category) -> u64 {
        self.bin_counts(category).iter().sum()
    }

    pub fn total_seconds(&self, category: Category) -> f64 {
        match category {
            Category::Sleep => self.sleep_seconds,
            Category::Light => self.light_seconds,
            Category::Dark => self.dark_seconds,
        }
    }

    /// Mean bout duration per ZT hour.
    ///
    /// Hours without bouts report 0, which cannot be told apart from
    /// zero-length bouts here; check `zt_counts` for that.
    pub fn zt_average_duration(&self) -> Vec<f64> {
        self.zt_counts
            .iter()
            .zip(&self.zt_total_duration)
            .map(|(&count, &total)| if count > 0 { total / count as f64 } else { 0.0 })
            .collect()
    }
}

/// Processed vs skipped record counts for one animal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTally {
    pub animal_id: String,
    pub processed: usize,
    pub skipped: usize,
}

impl RecordTally {
    pub fn total(&self) -> usize {
        self.processed + self.skipped
    }
}

/// Column-wise mean, sample standard deviation and standard error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of animals the statistics were computed over
    pub n: usize,
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    pub sem: Vec<f64>,
}

/// Mean, sample standard deviation and standard error of one value per animal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarSummary {
    pub n: usize,
    pub mean: f64,
    pub std: f64,
    pub sem: f64,
}

/// Bin-count statistics for one cohort and category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortStatistic {
    pub cohort_label: String,
    pub category: Category,
    #[serde(flatten)]
    pub summary: Summary,
}

/// Statistics of per-animal total bout counts for one cohort and category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortCountStatistic {
    pub cohort_label: String,
    pub category: Category,
    #[serde(flatten)]
    pub summary: ScalarSummary,
}

/// Cohort statistics restricted to one experimental day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayStatistic {
    pub day: u32,
    pub boundary_date: NaiveDate,
    /// Animals of the cohort with data on this day
    pub n_animals: usize,
    pub bins: Vec<CohortStatistic>,
    pub totals: Vec<CohortCountStatistic>,
}

/// Cohort statistics per ZT hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZtStatistic {
    pub counts: Summary,
    pub total_duration: Summary,
    pub average_duration: Summary,
}

/// Everything computed for a single cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortReport {
    pub cohort_label: String,
    pub animal_ids: Vec<String>,
    pub bins: Vec<CohortStatistic>,
    pub totals: Vec<CohortCountStatistic>,
    pub per_day: Vec<DayStatistic>,
    pub zt: ZtStatistic,
}

impl CohortReport {
    pub fn n_animals(&self) -> usize {
        self.animal_ids.len()
    }

    pub fn bins(&self, category: Category) -> Option<&CohortStatistic> {
        self.bins.iter().find(|s| s.category == category)
    }

    pub fn totals(&self, category: Category) -> Option<&CohortCountStatistic> {
        self.totals.iter().find(|s| s.category == category)
    }

    pub fn day(&self, day: u32) -> Option<&DayStatistic> {
        self.per_day.iter().find(|s| s.day == day)
    }
}

/// Experimental day index and the boundary-adjusted date it stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayInfo {
    pub day: u32,
    pub boundary_date: NaiveDate,
}

/// Provenance of an analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub producer: String,
    pub version: String,
    pub run_id: String,
    pub computed_at_utc: String,
}

/// Complete result of an analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub metadata: RunMetadata,
    pub bin_labels: Vec<String>,
    pub days: Vec<DayInfo>,
    pub animals: Vec<PerAnimalAggregate>,
    pub tallies: Vec<RecordTally>,
    pub cohorts: Vec<CohortReport>,
    /// Animals that were supplied but belong to no cohort
    pub excluded_animals: Vec<String>,
}

impl AnalysisOutput {
    pub fn cohort(&self, label: &str) -> Option<&CohortReport> {
        self.cohorts.iter().find(|c| c.cohort_label == label)
    }

    pub fn animal(&self, animal_id: &str) -> Option<&PerAnimalAggregate> {
        self.animals.iter().find(|a| a.animal_id == animal_id)
    }

    pub fn tally(&self, animal_id: &str) -> Option<&RecordTally> {
        self.tallies.iter().find(|t| t.animal_id == animal_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_zt_average_duration_zero_when_no_bouts() {
        let mut aggregate = PerAnimalAggregate::empty("A", "wt", 3);
        aggregate.zt_counts[0] = 2;
        aggregate.zt_total_duration[0] = 30.0;
        aggregate.zt_counts[1] = 1;

        let avg = aggregate.zt_average_duration();
        assert_eq!(avg.len(), 24);
        assert_eq!(avg[0], 15.0);
        assert_eq!(avg[1], 0.0);
        assert_eq!(avg[2], 0.0);
    }

    #[test]
    fn test_category_from_phase() {
        assert_eq!(Category::from(Phase::Light), Category::Light);
        assert_eq!(Category::from(Phase::Dark), Category::Dark);
        assert_eq!(Category::Sleep.as_str(), "sleep");
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&Category::Dark).unwrap();
        assert_eq!(json, "\"dark\"");
    }
}
