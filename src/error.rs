//! Error types for sleepbin

use thiserror::Error;

/// Errors that can occur while configuring or running an analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid bin edges: {0}")]
    InvalidEdges(String),

    #[error("Invalid hour {0}: expected 0-23")]
    InvalidHour(u32),

    #[error("Invalid bout duration {0}: expected finite, non-negative seconds")]
    InvalidDuration(f64),

    #[error("Unparseable timestamp {value:?} (expected format {format:?})")]
    UnparseableTimestamp { value: String, format: String },

    #[error("Cohort not configured: {0}")]
    EmptyCohort(String),

    #[error("Animal {animal_id} assigned to both {first:?} and {second:?}")]
    CohortConflict {
        animal_id: String,
        first: String,
        second: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No experimental day for boundary date {0}")]
    UnknownDay(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Failed to parse input: {0}")]
    ParseError(String),
}

impl AnalysisError {
    /// Whether the error only invalidates a single input record
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidDuration(_)
                | AnalysisError::UnparseableTimestamp { .. }
                | AnalysisError::UnknownDay(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_record_errors() {
        assert!(AnalysisError::InvalidDuration(-1.0).is_per_record());
        assert!(AnalysisError::UnknownDay("2023-09-19".to_string()).is_per_record());
        assert!(!AnalysisError::InvalidHour(24).is_per_record());
        assert!(!AnalysisError::InvalidEdges("empty".to_string()).is_per_record());
    }

    #[test]
    fn test_io_error_is_not_reported_as_csv() {
        let err = AnalysisError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(err.to_string().starts_with("I/O error"));
    }
}
