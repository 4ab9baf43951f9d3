//! Pipeline orchestration
//!
//! This module provides the public API for sleepbin.
//! It runs a whole analysis from per-animal raw records to cohort statistics.

use crate::aggregate::CohortAggregator;
use crate::classify::BoutClassifier;
use crate::cohort::{Cohort, CohortAssignment};
use crate::config::{AnalysisConfig, ResolvedConfig};
use crate::day::DayTable;
use crate::error::AnalysisError;
use crate::types::{AnalysisOutput, AnimalInput, RunMetadata};
use crate::{PRODUCER_NAME, SLEEPBIN_VERSION};
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Everything needed for one run, as accepted by [`analyze_json`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub config: AnalysisConfig,
    pub cohorts: Vec<Cohort>,
    pub animals: Vec<AnimalInput>,
}

/// Run an analysis described by a JSON request and return the JSON result.
///
/// # Example
/// ```ignore
/// let output_json = analyze_json(request_json)?;
/// ```
pub fn analyze_json(request_json: &str) -> Result<String, AnalysisError> {
    let request: AnalysisRequest = serde_json::from_str(request_json)?;
    let cohorts = CohortAssignment::new(request.cohorts)?;
    let output = run_analysis(&request.config, &cohorts, &request.animals)?;
    Ok(serde_json::to_string(&output)?)
}

/// Run a full analysis with the given configuration.
///
/// Pipeline stages:
/// 1. Validate configuration (fatal on error)
/// 2. Drop animals that belong to no cohort
/// 3. Build the experimental day table from every parsable timestamp
/// 4. Classify each animal's bouts
/// 5. Aggregate every configured cohort
pub fn run_analysis(
    config: &AnalysisConfig,
    cohorts: &CohortAssignment,
    animals: &[AnimalInput],
) -> Result<AnalysisOutput, AnalysisError> {
    SleepBinProcessor::new(config.clone())?.run(cohorts, animals)
}

/// Reusable processor holding a validated configuration.
pub struct SleepBinProcessor {
    config: AnalysisConfig,
    resolved: ResolvedConfig,
}

impl SleepBinProcessor {
    /// Create a processor, validating the configuration up front
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        let resolved = config.resolve()?;
        Ok(Self { config, resolved })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn bin_labels(&self) -> &[String] {
        &self.resolved.bin_labels
    }

    pub fn run(
        &self,
        cohorts: &CohortAssignment,
        animals: &[AnimalInput],
    ) -> Result<AnalysisOutput, AnalysisError> {
        let resolved = &self.resolved;

        // Stage 2: Keep only cohort members
        let mut seen = HashSet::new();
        let mut assigned: Vec<(&AnimalInput, &str)> = Vec::new();
        let mut excluded_animals = Vec::new();
        for animal in animals {
            if !seen.insert(animal.animal_id.as_str()) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "animal {:?} supplied more than once",
                    animal.animal_id
                )));
            }
            match cohorts.cohort_of(&animal.animal_id) {
                Some(label) => assigned.push((animal, label)),
                None => {
                    warn!("{}: not in any cohort, excluded", animal.animal_id);
                    excluded_animals.push(animal.animal_id.clone());
                }
            }
        }

        let classifier = BoutClassifier::new(&resolved.binner, &resolved.phase, &resolved.parser);

        // Stage 3: Discover all experimental days from the records that will be classified
        let timestamps: Vec<_> = assigned
            .iter()
            .flat_map(|(animal, _)| {
                animal
                    .records
                    .iter()
                    .filter_map(move |record| classifier.parse_record(&animal.animal_id, record).ok())
            })
            .map(|bout| bout.timestamp)
            .collect();
        let mut days = DayTable::from_timestamps(resolved.day_boundary_hour, &timestamps)?;
        info!("discovered {} experimental days", days.len());

        // Stage 4: Classify each animal
        let mut aggregates = Vec::with_capacity(assigned.len());
        let mut tallies = Vec::with_capacity(assigned.len());
        for (animal, label) in &assigned {
            let classified =
                classifier.process(&animal.animal_id, label, &animal.records, &mut days)?;
            if classified.tally.processed == 0 {
                warn!("{}: no valid records", animal.animal_id);
            }
            aggregates.push(classified.aggregate);
            tallies.push(classified.tally);
        }
        info!("classified {} animals", aggregates.len());

        // Stage 5: Aggregate cohorts once every animal is done
        let aggregator = CohortAggregator::new(cohorts, &days, resolved.binner.num_bins());
        let cohort_reports = aggregator.aggregate_all(&aggregates)?;

        Ok(AnalysisOutput {
            metadata: RunMetadata {
                producer: PRODUCER_NAME.to_string(),
                version: SLEEPBIN_VERSION.to_string(),
                run_id: Uuid::new_v4().to_string(),
                computed_at_utc: Utc::now().to_rfc3339(),
            },
            bin_labels: resolved.bin_labels.clone(),
            days: days.iter().collect(),
            animals: aggregates,
            tallies,
            cohorts: cohort_reports,
            excluded_animals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, RawBoutRecord};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn animal(id: &str, rows: &[(&str, f64)]) -> AnimalInput {
        AnimalInput {
            animal_id: id.to_string(),
            records: rows
                .iter()
                .map(|(ts, d)| RawBoutRecord::new(*ts, *d))
                .collect(),
        }
    }

    fn small_config() -> AnalysisConfig {
        AnalysisConfig {
            bin_edges: vec![2.0, 4.0, 8.0, 16.0, 32.0, f64::INFINITY],
            ..AnalysisConfig::default()
        }
    }

    fn two_cohorts() -> CohortAssignment {
        CohortAssignment::new(vec![
            Cohort::new("wild-type", ["A"]),
            Cohort::new("mutant", ["B"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_two_animals_two_cohorts() {
        let animals = vec![
            animal(
                "A",
                &[
                    ("2023-09-19 07:00:00", 2.0),
                    ("2023-09-19 08:00:00", 2.0),
                    ("2023-09-19 09:00:00", 5.0),
                    ("2023-09-19 10:00:00", 20.0),
                ],
            ),
            animal("B", &[("2023-09-19 20:00:00", 40.0)]),
        ];

        let output = run_analysis(&small_config(), &two_cohorts(), &animals).unwrap();

        let a = output.animal("A").unwrap();
        assert_eq!(a.sleep_bin_counts, vec![2, 1, 0, 1, 0]);
        assert_eq!(a.cohort_label, "wild-type");

        let wt = output.cohort("wild-type").unwrap();
        assert_eq!(wt.animal_ids, vec!["A".to_string()]);
        assert_eq!(
            wt.bins(Category::Sleep).unwrap().summary.mean,
            vec![2.0, 1.0, 0.0, 1.0, 0.0]
        );
        assert_eq!(wt.bins(Category::Sleep).unwrap().summary.std, vec![0.0; 5]);

        let mutant = output.cohort("mutant").unwrap();
        assert_eq!(
            mutant.bins(Category::Dark).unwrap().summary.mean,
            vec![0.0, 0.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(output.bin_labels, vec!["2-4", "4-8", "8-16", "16-32", "32+"]);
    }

    #[test]
    fn test_day_indices_are_independent_of_file_order() {
        // B is processed first but holds the later day
        let animals = vec![
            animal("B", &[("2023-09-21 07:00:00", 5.0)]),
            animal("A", &[("2023-09-19 05:59:00", 5.0), ("2023-09-19 06:00:00", 5.0)]),
        ];
        let output = run_analysis(&small_config(), &two_cohorts(), &animals).unwrap();

        let dates: Vec<NaiveDate> = output.days.iter().map(|d| d.boundary_date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2023, 9, 18).unwrap(),
                NaiveDate::from_ymd_opt(2023, 9, 19).unwrap(),
                NaiveDate::from_ymd_opt(2023, 9, 21).unwrap(),
            ]
        );
        let b = output.animal("B").unwrap();
        assert_eq!(b.per_day.keys().copied().collect::<Vec<_>>(), vec![3]);
        let a = output.animal("A").unwrap();
        assert_eq!(a.per_day.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_unparseable_record_is_counted_not_fatal() {
        let animals = vec![
            animal(
                "A",
                &[
                    ("2023-09-19 07:00:00", 2.0),
                    ("not-a-date", 5.0),
                    ("2023-09-19 09:00:00", 20.0),
                ],
            ),
            animal("B", &[("2023-09-19 20:00:00", 40.0)]),
        ];
        let output = run_analysis(&small_config(), &two_cohorts(), &animals).unwrap();

        let tally = output.tally("A").unwrap();
        assert_eq!(tally.processed, 2);
        assert_eq!(tally.skipped, 1);
        assert_eq!(output.animal("A").unwrap().total_bouts(Category::Sleep), 2);
        assert_eq!(output.tally("B").unwrap().processed, 1);
    }

    #[test]
    fn test_unassigned_animal_is_excluded() {
        let animals = vec![
            animal("A", &[("2023-09-19 07:00:00", 5.0)]),
            animal("Z", &[("2023-01-01 07:00:00", 5.0)]),
        ];
        let output = run_analysis(&small_config(), &two_cohorts(), &animals).unwrap();

        assert_eq!(output.excluded_animals, vec!["Z".to_string()]);
        assert!(output.animal("Z").is_none());
        // Z's dates do not create experimental days
        assert_eq!(output.days.len(), 1);
        // Mutant cohort is configured but has no data
        assert_eq!(output.cohort("mutant").unwrap().n_animals(), 0);
    }

    #[test]
    fn test_invalid_config_aborts_before_processing() {
        let config = AnalysisConfig {
            bin_edges: vec![8.0, 4.0],
            ..AnalysisConfig::default()
        };
        let result = run_analysis(&config, &two_cohorts(), &[]);
        assert!(matches!(result, Err(AnalysisError::InvalidEdges(_))));
    }

    #[test]
    fn test_duplicate_animal_is_rejected() {
        let animals = vec![animal("A", &[]), animal("A", &[])];
        assert!(matches!(
            run_analysis(&small_config(), &two_cohorts(), &animals),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_analyze_json() {
        let request = r#"{
            "config": {"bin_edges": [2, 4, 8, 16, 32, "inf"]},
            "cohorts": [{"label": "wild-type", "animal_ids": ["A"]}],
            "animals": [{
                "animal_id": "A",
                "records": [
                    {"timestamp": "2023-09-19 07:00:00", "duration_seconds": 2.0},
                    {"timestamp": "2023-09-19 08:00:00", "duration_seconds": 20.0}
                ]
            }]
        }"#;

        let json = analyze_json(request).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metadata"]["producer"], "sleepbin");
        assert_eq!(value["animals"][0]["sleep_bin_counts"][0], 1);
        assert_eq!(value["animals"][0]["sleep_bin_counts"][3], 1);
        assert_eq!(value["cohorts"][0]["cohort_label"], "wild-type");
        assert_eq!(value["days"][0]["boundary_date"], "2023-09-19");
    }

    #[test]
    fn test_analyze_json_rejects_conflicting_cohorts() {
        let request = r#"{
            "cohorts": [
                {"label": "wt", "animal_ids": ["A"]},
                {"label": "mut", "animal_ids": ["A"]}
            ],
            "animals": []
        }"#;
        assert!(matches!(
            analyze_json(request),
            Err(AnalysisError::CohortConflict { .. })
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(analyze_json("not valid json").is_err());
    }

    #[test]
    fn test_analyze_json_skips_negative_durations() {
        let request = r#"{
            "config": {"bin_edges": [0, 4, "inf"]},
            "cohorts": [{"label": "wild-type", "animal_ids": ["A"]}],
            "animals": [{
                "animal_id": "A",
                "records": [
                    {"timestamp": "2023-09-19 07:00:00", "duration_seconds": 10.0},
                    {"timestamp": "2023-09-19 07:10:00", "duration_seconds": -10.0}
                ]
            }]
        }"#;

        let json = analyze_json(request).unwrap();
        let output: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(output["tallies"][0]["processed"], 1);
        assert_eq!(output["tallies"][0]["skipped"], 1);
        assert_eq!(output["animals"][0]["zt_counts"][1], 1);
        assert_eq!(output["animals"][0]["zt_total_duration"][1], 10.0);
        assert_eq!(output["animals"][0]["sleep_seconds"], 10.0);
        assert_eq!(output["animals"][0]["sleep_bin_counts"], serde_json::json!([0, 1]));
    }

    #[test]
    fn test_invalid_duration_does_not_create_a_day() {
        let animals = vec![animal(
            "A",
            &[("2023-09-19 07:00:00", 5.0), ("2023-09-25 07:00:00", -1.0)],
        )];
        let output = run_analysis(&small_config(), &two_cohorts(), &animals).unwrap();
        assert_eq!(output.days.len(), 1);
        assert_eq!(output.tally("A").unwrap().skipped, 1);
    }
}
