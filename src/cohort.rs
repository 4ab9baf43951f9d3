//! Cohort (genotype) assignments
//!
//! Cohorts are kept in the order they were configured. Each animal may belong
//! to at most one cohort; animals in none are excluded from the analysis.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A labelled group of animals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    pub label: String,
    pub animal_ids: BTreeSet<String>,
}

impl Cohort {
    pub fn new<I, S>(label: impl Into<String>, animal_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            animal_ids: animal_ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Validated partition of animals into cohorts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortAssignment {
    cohorts: Vec<Cohort>,
    #[serde(skip)]
    by_animal: HashMap<String, usize>,
}

impl CohortAssignment {
    /// Check that no animal is in two cohorts and no label repeats
    pub fn new(cohorts: Vec<Cohort>) -> Result<Self, AnalysisError> {
        let mut by_animal: HashMap<String, usize> = HashMap::new();

        for (idx, cohort) in cohorts.iter().enumerate() {
            if cohort.label.trim().is_empty() {
                return Err(AnalysisError::InvalidConfig(
                    "cohort label must not be empty".to_string(),
                ));
            }
            if cohorts[..idx].iter().any(|c| c.label == cohort.label) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "duplicate cohort label {:?}",
                    cohort.label
                )));
            }
            for animal_id in &cohort.animal_ids {
                if let Some(&prev) = by_animal.get(animal_id) {
                    return Err(AnalysisError::CohortConflict {
                        animal_id: animal_id.clone(),
                        first: cohorts[prev].label.clone(),
                        second: cohort.label.clone(),
                    });
                }
                by_animal.insert(animal_id.clone(), idx);
            }
        }

        Ok(Self { cohorts, by_animal })
    }

    /// Parse `[{"label": .., "animal_ids": [..]}]` or `{"label": ["id", ...]}`.
    ///
    /// The map form does not keep file order; cohorts come out sorted by label.
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum CohortsJson {
            List(Vec<Cohort>),
            Map(serde_json::Map<String, serde_json::Value>),
        }

        let cohorts = match serde_json::from_str::<CohortsJson>(json)? {
            CohortsJson::List(list) => list,
            CohortsJson::Map(map) => map
                .into_iter()
                .map(|(label, ids)| {
                    let ids: BTreeSet<String> = serde_json::from_value(ids)?;
                    Ok(Cohort {
                        label,
                        animal_ids: ids,
                    })
                })
                .collect::<Result<Vec<_>, serde_json::Error>>()?,
        };
        Self::new(cohorts)
    }

    pub fn cohorts(&self) -> &[Cohort] {
        &self.cohorts
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.cohorts.iter().map(|c| c.label.as_str())
    }

    pub fn get(&self, label: &str) -> Option<&Cohort> {
        self.cohorts.iter().find(|c| c.label == label)
    }

    /// Label of the cohort an animal belongs to, if any
    pub fn cohort_of(&self, animal_id: &str) -> Option<&str> {
        self.by_animal
            .get(animal_id)
            .map(|&idx| self.cohorts[idx].label.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.cohorts.is_empty()
    }
}
