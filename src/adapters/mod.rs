//! Input adapters
//!
//! This module provides adapters that read per-animal recordings from external
//! formats and map them to raw bout records for the pipeline.

mod delimited;

pub use delimited::CsvBoutAdapter;

use crate::error::AnalysisError;
use crate::types::AnimalInput;
use serde::Serialize;

/// Records read for one animal plus the rows that had to be dropped
#[derive(Debug, Clone, Serialize)]
pub struct AnimalBouts {
    pub input: AnimalInput,
    /// Rows whose duration was missing, non-numeric, non-finite or negative
    pub rejected_rows: usize,
}

/// Trait for recording adapters
pub trait BoutAdapter {
    /// Parse one animal's raw recording
    fn parse(&self, animal_id: &str, raw: &str) -> Result<AnimalBouts, AnalysisError>;
}
