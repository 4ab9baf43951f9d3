//! Cohort aggregation
//!
//! Combines per-animal aggregates into mean / sample std / SEM statistics for
//! each configured cohort. Statistics are rebuilt from scratch on every call.
//!
//! Per-day statistics only include animals that have data on that day, so N
//! can differ between days. Per-ZT statistics always include every animal of
//! the cohort.

use crate::cohort::CohortAssignment;
use crate::day::DayTable;
use crate::error::AnalysisError;
use crate::phase::ZT_HOURS;
use crate::stats::{counts_as_f64, summarize, summarize_columns};
use crate::types::{
    Category, CohortCountStatistic, CohortReport, CohortStatistic, DayBinCounts, DayStatistic,
    PerAnimalAggregate, ZtStatistic,
};
use log::info;

/// Builds cohort statistics from a complete set of per-animal aggregates
#[derive(Debug, Clone, Copy)]
pub struct CohortAggregator<'a> {
    cohorts: &'a CohortAssignment,
    days: &'a DayTable,
    num_bins: usize,
}

impl<'a> CohortAggregator<'a> {
    pub fn new(cohorts: &'a CohortAssignment, days: &'a DayTable, num_bins: usize) -> Self {
        Self {
            cohorts,
            days,
            num_bins,
        }
    }

    /// Statistics for one cohort.
    ///
    /// Fails with `EmptyCohort` only when `cohort_label` is not configured; a
    /// configured cohort without animals yields zero vectors.
    pub fn aggregate(
        &self,
        per_animal: &[PerAnimalAggregate],
        cohort_label: &str,
    ) -> Result<CohortReport, AnalysisError> {
        if self.cohorts.get(cohort_label).is_none() {
            return Err(AnalysisError::EmptyCohort(cohort_label.to_string()));
        }

        let members: Vec<&PerAnimalAggregate> = per_animal
            .iter()
            .filter(|a| a.cohort_label == cohort_label)
            .collect();

        let bins = Category::ALL
            .iter()
            .map(|&category| {
                let rows: Vec<Vec<f64>> = members
                    .iter()
                    .map(|a| counts_as_f64(a.bin_counts(category)))
                    .collect();
                bin_statistic(cohort_label, category, &rows, self.num_bins)
            })
            .collect();

        let totals = Category::ALL
            .iter()
            .map(|&category| {
                let values: Vec<f64> = members
                    .iter()
                    .map(|a| a.total_bouts(category) as f64)
                    .collect();
                count_statistic(cohort_label, category, &values)
            })
            .collect();

        let per_day = self
            .days
            .iter()
            .map(|info| {
                let day_counts: Vec<&DayBinCounts> = members
                    .iter()
                    .filter_map(|a| a.per_day.get(&info.day))
                    .collect();
                self.day_statistic(cohort_label, info.day, info.boundary_date, &day_counts)
            })
            .collect();

        let zt = zt_statistic(&members);

        info!(
            "aggregated cohort {:?} over {} animals and {} days",
            cohort_label,
            members.len(),
            self.days.len()
        );

        Ok(CohortReport {
            cohort_label: cohort_label.to_string(),
            animal_ids: members.iter().map(|a| a.animal_id.clone()).collect(),
            bins,
            totals,
            per_day,
            zt,
        })
    }

    /// Statistics for every configured cohort, in configuration order
    pub fn aggregate_all(
        &self,
        per_animal: &[PerAnimalAggregate],
    ) -> Result<Vec<CohortReport>, AnalysisError> {
        self.cohorts
            .labels()
            .map(|label| self.aggregate(per_animal, label))
            .collect()
    }

    fn day_statistic(
        &self,
        cohort_label: &str,
        day: u32,
        boundary_date: chrono::NaiveDate,
        day_counts: &[&DayBinCounts],
    ) -> DayStatistic {
        let bins = Category::ALL
            .iter()
            .map(|&category| {
                let rows: Vec<Vec<f64>> = day_counts
                    .iter()
                    .map(|c| counts_as_f64(c.bin_counts(category)))
                    .collect();
                bin_statistic(cohort_label, category, &rows, self.num_bins)
            })
            .collect();

        let totals = Category::ALL
            .iter()
            .map(|&category| {
                let values: Vec<f64> = day_counts
                    .iter()
                    .map(|c| c.total_bouts(category) as f64)
                    .collect();
                count_statistic(cohort_label, category, &values)
            })
            .collect();

        DayStatistic {
            day,
            boundary_date,
            n_animals: day_counts.len(),
            bins,
            totals,
        }
    }
}

fn bin_statistic(
    cohort_label: &str,
    category: Category,
    rows: &[Vec<f64>],
    num_bins: usize,
) -> CohortStatistic {
    CohortStatistic {
        cohort_label: cohort_label.to_string(),
        category,
        summary: summarize_columns(rows, num_bins),
    }
}

fn count_statistic(cohort_label: &str, category: Category, values: &[f64]) -> CohortCountStatistic {
    CohortCountStatistic {
        cohort_label: cohort_label.to_string(),
        category,
        summary: summarize(values),
    }
}

fn zt_statistic(members: &[&PerAnimalAggregate]) -> ZtStatistic {
    let counts: Vec<Vec<f64>> = members.iter().map(|a| counts_as_f64(&a.zt_counts)).collect();
    let totals: Vec<Vec<f64>> = members.iter().map(|a| a.zt_total_duration.clone()).collect();
    let averages: Vec<Vec<f64>> = members.iter().map(|a| a.zt_average_duration()).collect();

    ZtStatistic {
        counts: summarize_columns(&counts, ZT_HOURS),
        total_duration: summarize_columns(&totals, ZT_HOURS),
        average_duration: summarize_columns(&averages, ZT_HOURS),
    }
}
