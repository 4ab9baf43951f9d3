//! Experimental day resolution
//!
//! An experimental day runs from the boundary hour (6:00 by default) to the
//! same hour on the next calendar day. Timestamps before the boundary belong
//! to the previous calendar date.
//!
//! Day indices are 1-based positions in the sorted set of boundary dates.
//! [`DayTable`] is built once from every timestamp of a run and is then
//! read-only, so indices never depend on file order. [`DayResolver`] keeps the
//! incremental discover-and-insert behaviour, where a late, earlier date
//! shifts every later index by one.

use crate::error::AnalysisError;
use crate::types::DayInfo;
use chrono::{Duration, NaiveDate, NaiveDateTime};

pub const DEFAULT_DAY_BOUNDARY_HOUR: u32 = 6;

/// Boundary-adjusted calendar date of a timestamp
pub fn boundary_date(timestamp: &NaiveDateTime, boundary_hour: u32) -> NaiveDate {
    timestamp
        .checked_sub_signed(Duration::hours(i64::from(boundary_hour)))
        .map(|shifted| shifted.date())
        .unwrap_or_else(|| timestamp.date())
}

/// Source of experimental day indices for the classification stage
pub trait DayIndexer {
    fn day_index(&mut self, timestamp: &NaiveDateTime) -> Result<u32, AnalysisError>;
}

fn check_boundary_hour(boundary_hour: u32) -> Result<(), AnalysisError> {
    if boundary_hour > 23 {
        return Err(AnalysisError::InvalidHour(boundary_hour));
    }
    Ok(())
}

/// Incremental day discovery over a growing sorted set of dates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayResolver {
    boundary_hour: u32,
    days: Vec<NaiveDate>,
}

impl Default for DayResolver {
    fn default() -> Self {
        Self {
            boundary_hour: DEFAULT_DAY_BOUNDARY_HOUR,
            days: Vec::new(),
        }
    }
}

impl DayResolver {
    pub fn new(boundary_hour: u32) -> Result<Self, AnalysisError> {
        check_boundary_hour(boundary_hour)?;
        Ok(Self {
            boundary_hour,
            days: Vec::new(),
        })
    }

    pub fn boundary_date(&self, timestamp: &NaiveDateTime) -> NaiveDate {
        boundary_date(timestamp, self.boundary_hour)
    }

    /// Day index of `timestamp`, inserting its date if unseen.
    ///
    /// Inserting a date before known ones renumbers all later days.
    pub fn resolve(&mut self, timestamp: &NaiveDateTime) -> u32 {
        let date = self.boundary_date(timestamp);
        let pos = match self.days.binary_search(&date) {
            Ok(pos) => pos,
            Err(pos) => {
                self.days.insert(pos, date);
                pos
            }
        };
        pos as u32 + 1
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    /// Stop discovering and fix the current numbering
    pub fn freeze(self) -> DayTable {
        DayTable {
            boundary_hour: self.boundary_hour,
            days: self.days,
        }
    }
}

impl DayIndexer for DayResolver {
    fn day_index(&mut self, timestamp: &NaiveDateTime) -> Result<u32, AnalysisError> {
        Ok(self.resolve(timestamp))
    }
}

/// Immutable day-index lookup built from a complete set of timestamps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTable {
    boundary_hour: u32,
    days: Vec<NaiveDate>,
}

impl DayTable {
    /// Collect every distinct boundary date, in any input order
    pub fn from_timestamps<'a, I>(boundary_hour: u32, timestamps: I) -> Result<Self, AnalysisError>
    where
        I: IntoIterator<Item = &'a NaiveDateTime>,
    {
        check_boundary_hour(boundary_hour)?;
        let mut days: Vec<NaiveDate> = timestamps
            .into_iter()
            .map(|ts| boundary_date(ts, boundary_hour))
            .collect();
        days.sort_unstable();
        days.dedup();
        Ok(Self {
            boundary_hour,
            days,
        })
    }

    pub fn boundary_hour(&self) -> u32 {
        self.boundary_hour
    }

    pub fn boundary_date(&self, timestamp: &NaiveDateTime) -> NaiveDate {
        boundary_date(timestamp, self.boundary_hour)
    }

    pub fn resolve(&self, timestamp: &NaiveDateTime) -> Result<u32, AnalysisError> {
        let date = self.boundary_date(timestamp);
        self.days
            .binary_search(&date)
            .map(|pos| pos as u32 + 1)
            .map_err(|_| AnalysisError::UnknownDay(date.to_string()))
    }

    pub fn date_of(&self, day: u32) -> Option<NaiveDate> {
        let idx = (day as usize).checked_sub(1)?;
        self.days.get(idx).copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = DayInfo> + '_ {
        self.days.iter().enumerate().map(|(idx, &date)| DayInfo {
            day: idx as u32 + 1,
            boundary_date: date,
        })
    }
}

impl DayIndexer for DayTable {
    fn day_index(&mut self, timestamp: &NaiveDateTime) -> Result<u32, AnalysisError> {
        self.resolve(timestamp)
    }
}
