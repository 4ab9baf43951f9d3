//! Analysis configuration
//!
//! The configuration is plain JSON. Bin edges are numbers, except that an
//! infinite last edge is written as the string `"inf"` (or `null`), since JSON
//! has no infinity literal:
//!
//! ```json
//! {
//!   "bin_edges": [2, 4, 8, 16, 32, 64, 128, 256, 512, "inf"],
//!   "light_start_hour": 6,
//!   "dark_start_hour": 18,
//!   "day_boundary_hour": 6,
//!   "zt_origin_hour": 6,
//!   "timestamp_format": "%Y-%m-%d %H:%M:%S",
//!   "columns": { "timestamp": "timestamp", "duration": "duration" }
//! }
//! ```

use crate::binner::{DurationBinner, DEFAULT_BIN_EDGES, ZERO_BASED_BIN_EDGES};
use crate::day::DEFAULT_DAY_BOUNDARY_HOUR;
use crate::error::AnalysisError;
use crate::phase::PhaseClassifier;
use crate::timestamp::{TimestampParser, CANONICAL_TIMESTAMP_FORMAT};
use serde::{Deserialize, Serialize};

/// CSV header names of the two columns the ingestion layer reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvColumns {
    pub timestamp: String,
    pub duration: String,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            timestamp: "timestamp".to_string(),
            duration: "duration".to_string(),
        }
    }
}

/// User-facing analysis options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    #[serde(with = "edge_serde")]
    pub bin_edges: Vec<f64>,
    /// Display labels, one per bin; generated from the edges when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_labels: Option<Vec<String>>,
    pub light_start_hour: u32,
    pub dark_start_hour: u32,
    pub day_boundary_hour: u32,
    pub zt_origin_hour: u32,
    pub timestamp_format: String,
    pub columns: CsvColumns,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bin_edges: DEFAULT_BIN_EDGES.to_vec(),
            bin_labels: None,
            light_start_hour: 6,
            dark_start_hour: 18,
            day_boundary_hour: DEFAULT_DAY_BOUNDARY_HOUR,
            zt_origin_hour: 6,
            timestamp_format: CANONICAL_TIMESTAMP_FORMAT.to_string(),
            columns: CsvColumns::default(),
        }
    }
}

/// Configuration turned into ready-to-use components
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub binner: DurationBinner,
    pub phase: PhaseClassifier,
    pub parser: TimestampParser,
    pub bin_labels: Vec<String>,
    pub day_boundary_hour: u32,
}

impl AnalysisConfig {
    /// Variant whose first bin starts at 0 seconds
    pub fn zero_based() -> Self {
        Self {
            bin_edges: ZERO_BASED_BIN_EDGES.to_vec(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every option; a failure here aborts the run before any processing
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.resolve().map(|_| ())
    }

    pub fn resolve(&self) -> Result<ResolvedConfig, AnalysisError> {
        let binner = DurationBinner::new(self.bin_edges.clone())?;
        let phase = PhaseClassifier::new(
            self.light_start_hour,
            self.dark_start_hour,
            self.zt_origin_hour,
        )?;
        if self.day_boundary_hour > 23 {
            return Err(AnalysisError::InvalidHour(self.day_boundary_hour));
        }
        if self.timestamp_format.trim().is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "timestamp_format must not be empty".to_string(),
            ));
        }
        if self.columns.timestamp.is_empty() || self.columns.duration.is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "column names must not be empty".to_string(),
            ));
        }

        let bin_labels = match &self.bin_labels {
            Some(labels) if labels.len() != binner.num_bins() => {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} bin labels given for {} bins",
                    labels.len(),
                    binner.num_bins()
                )));
            }
            Some(labels) => labels.clone(),
            None => binner.default_labels(),
        };

        Ok(ResolvedConfig {
            binner,
            phase,
            parser: TimestampParser::new(self.timestamp_format.clone()),
            bin_labels,
            day_boundary_hour: self.day_boundary_hour,
        })
    }
}

/// Bin edges with `"inf"` standing in for infinity
mod edge_serde {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    #[serde(untagged)]
    enum EdgeOut {
        Number(f64),
        Text(&'static str),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum EdgeIn {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(edges: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        edges
            .iter()
            .map(|&edge| match edge {
                e if e == f64::INFINITY => EdgeOut::Text("inf"),
                e if e == f64::NEG_INFINITY => EdgeOut::Text("-inf"),
                e => EdgeOut::Number(e),
            })
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let raw: Vec<Option<EdgeIn>> = Vec::deserialize(deserializer)?;
        raw.into_iter()
            .map(|edge| match edge {
                None => Ok(f64::INFINITY),
                Some(EdgeIn::Number(n)) => Ok(n),
                Some(EdgeIn::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
                    "inf" | "+inf" | "infinity" => Ok(f64::INFINITY),
                    "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
                    other => Err(D::Error::custom(format!("invalid bin edge {:?}", other))),
                },
            })
            .collect()
    }
}
