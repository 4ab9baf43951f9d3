//! Bout classification
//!
//! Turns one animal's raw `(timestamp, duration)` rows into a
//! [`PerAnimalAggregate`]: every bout is assigned a phase, a ZT hour and an
//! experimental day, and durations are binned per category, overall and per day.
//!
//! A record with a negative or non-finite duration, or whose timestamp cannot
//! be parsed or placed on a day, is skipped and counted; it never fails the
//! animal. Any other error aborts the run.

use crate::binner::DurationBinner;
use crate::day::DayIndexer;
use crate::error::AnalysisError;
use crate::phase::PhaseClassifier;
use crate::timestamp::TimestampParser;
use crate::types::{
    BoutRecord, ClassifiedBout, DayBinCounts, PerAnimalAggregate, Phase, RawBoutRecord,
    RecordTally,
};
use chrono::Timelike;
use log::debug;
use std::collections::BTreeMap;

/// Aggregate and record tally for one animal
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedAnimal {
    pub aggregate: PerAnimalAggregate,
    pub tally: RecordTally,
}

/// Raw durations collected before binning
#[derive(Debug, Default)]
struct DurationLists {
    sleep: Vec<f64>,
    light: Vec<f64>,
    dark: Vec<f64>,
}

impl DurationLists {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            sleep: Vec::with_capacity(capacity),
            light: Vec::with_capacity(capacity),
            dark: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, phase: Phase, duration: f64) {
        self.sleep.push(duration);
        match phase {
            Phase::Light => self.light.push(duration),
            Phase::Dark => self.dark.push(duration),
        }
    }

    fn bin(&self, binner: &DurationBinner) -> DayBinCounts {
        DayBinCounts {
            sleep_bin_counts: binner.histogram(&self.sleep),
            light_bin_counts: binner.histogram(&self.light),
            dark_bin_counts: binner.histogram(&self.dark),
        }
    }
}

/// Classifies bouts against a fixed binner, phase schedule and timestamp format
#[derive(Debug, Clone, Copy)]
pub struct BoutClassifier<'a> {
    binner: &'a DurationBinner,
    phase: &'a PhaseClassifier,
    parser: &'a TimestampParser,
}

impl<'a> BoutClassifier<'a> {
    pub fn new(
        binner: &'a DurationBinner,
        phase: &'a PhaseClassifier,
        parser: &'a TimestampParser,
    ) -> Self {
        Self {
            binner,
            phase,
            parser,
        }
    }

    /// Check the duration and parse the timestamp of a raw row
    pub fn parse_record(
        &self,
        animal_id: &str,
        record: &RawBoutRecord,
    ) -> Result<BoutRecord, AnalysisError> {
        let duration = record.duration_seconds;
        if !duration.is_finite() || duration < 0.0 {
            return Err(AnalysisError::InvalidDuration(duration));
        }
        Ok(BoutRecord {
            animal_id: animal_id.to_string(),
            timestamp: self.parser.parse(&record.timestamp)?,
            duration_seconds: duration,
        })
    }

    /// Assign phase, ZT hour, day and bin to a single record
    pub fn classify<D: DayIndexer>(
        &self,
        animal_id: &str,
        record: &RawBoutRecord,
        days: &mut D,
    ) -> Result<ClassifiedBout, AnalysisError> {
        let record = self.parse_record(animal_id, record)?;
        let day = days.day_index(&record.timestamp)?;
        let hour = record.timestamp.hour();

        Ok(ClassifiedBout {
            phase: self.phase.phase_of(hour)?,
            zt_hour: self.phase.zt_hour_of(hour)?,
            day,
            bin: self.binner.bin_index(record.duration_seconds),
            record,
        })
    }

    /// Classify every record of one animal, in input order
    pub fn process<D: DayIndexer>(
        &self,
        animal_id: &str,
        cohort_label: &str,
        records: &[RawBoutRecord],
        days: &mut D,
    ) -> Result<ClassifiedAnimal, AnalysisError> {
        let mut aggregate = PerAnimalAggregate::empty(animal_id, cohort_label, self.binner.num_bins());
        let mut tally = RecordTally {
            animal_id: animal_id.to_string(),
            ..RecordTally::default()
        };

        let mut overall = DurationLists::with_capacity(records.len());
        let mut per_day: BTreeMap<u32, DurationLists> = BTreeMap::new();

        for record in records {
            let bout = match self.classify(animal_id, record, days) {
                Ok(bout) => bout,
                Err(e) if !e.is_per_record() => return Err(e),
                Err(e) => {
                    debug!("{}: skipping record {:?}: {}", animal_id, record.timestamp, e);
                    tally.skipped += 1;
                    continue;
                }
            };
            tally.processed += 1;

            let duration = bout.record.duration_seconds;
            overall.push(bout.phase, duration);
            per_day.entry(bout.day).or_default().push(bout.phase, duration);

            aggregate.zt_counts[bout.zt_hour] += 1;
            aggregate.zt_total_duration[bout.zt_hour] += duration;

            aggregate.sleep_seconds += duration;
            match bout.phase {
                Phase::Light => aggregate.light_seconds += duration,
                Phase::Dark => aggregate.dark_seconds += duration,
            }
        }

        let totals = overall.bin(self.binner);
        aggregate.sleep_bin_counts = totals.sleep_bin_counts;
        aggregate.light_bin_counts = totals.light_bin_counts;
        aggregate.dark_bin_counts = totals.dark_bin_counts;
        aggregate.per_day = per_day
            .into_iter()
            .map(|(day, lists)| (day, lists.bin(self.binner)))
            .collect();

        Ok(ClassifiedAnimal { aggregate, tally })
    }
}
