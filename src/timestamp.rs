//! Timestamp parsing with a configured `strftime` format

use crate::error::AnalysisError;
use chrono::NaiveDateTime;

/// `2023-09-19 05:59:00`
pub const CANONICAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `9/19/23 5:59`
pub const SHORT_TIMESTAMP_FORMAT: &str = "%m/%d/%y %H:%M";

/// Parses local wall-clock timestamps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampParser {
    format: String,
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self::new(CANONICAL_TIMESTAMP_FORMAT)
    }
}

impl TimestampParser {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn parse(&self, value: &str) -> Result<NaiveDateTime, AnalysisError> {
        NaiveDateTime::parse_from_str(value.trim(), &self.format).map_err(|_| {
            AnalysisError::UnparseableTimestamp {
                value: value.to_string(),
                format: self.format.clone(),
            }
        })
    }
}
