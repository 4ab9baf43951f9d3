//! sleepbin - Circadian bout classification and cohort statistics
//!
//! sleepbin turns per-animal sleep bout recordings into duration histograms
//! and group-level descriptive statistics through a deterministic pipeline:
//! day discovery → bout classification → duration binning → cohort aggregation.
//!
//! ## Modules
//!
//! - **Classification**: light/dark phase, Zeitgeber Time hour and experimental
//!   day (6:00 to 6:00) for each bout
//! - **Aggregation**: mean, sample standard deviation and SEM per cohort, per
//!   experimental day and per ZT hour
//! - **Tables**: sheet-shaped renderings of the results for spreadsheet export

pub mod adapters;
pub mod aggregate;
pub mod binner;
pub mod classify;
pub mod cohort;
pub mod config;
pub mod day;
pub mod error;
pub mod phase;
pub mod pipeline;
pub mod stats;
pub mod tables;
pub mod timestamp;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use binner::DurationBinner;
pub use cohort::{Cohort, CohortAssignment};
pub use config::AnalysisConfig;
pub use day::{DayResolver, DayTable};
pub use error::AnalysisError;
pub use phase::PhaseClassifier;
pub use pipeline::{analyze_json, run_analysis, AnalysisRequest, SleepBinProcessor};
pub use types::{AnalysisOutput, AnimalInput, Category, PerAnimalAggregate, Phase, RawBoutRecord};

/// sleepbin version embedded in all analysis outputs
pub const SLEEPBIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for analysis outputs
pub const PRODUCER_NAME: &str = "sleepbin";
