//! Descriptive statistics across animals
//!
//! Standard deviation uses the sample convention (ddof = 1). With fewer than
//! two animals the spread is reported as 0; with none, every value is 0.

use crate::types::{ScalarSummary, Summary};

/// Column-wise summary of a `[n_animals, width]` matrix given as rows
pub fn summarize_columns<R>(rows: &[R], width: usize) -> Summary
where
    R: AsRef<[f64]>,
{
    let n = rows.len();
    let mut mean = vec![0.0; width];
    let mut std = vec![0.0; width];
    let mut sem = vec![0.0; width];

    if n == 0 {
        return Summary { n, mean, std, sem };
    }

    for row in rows {
        for (acc, value) in mean.iter_mut().zip(row.as_ref()) {
            *acc += value;
        }
    }
    for acc in mean.iter_mut() {
        *acc /= n as f64;
    }

    if n > 1 {
        for row in rows {
            for ((acc, value), m) in std.iter_mut().zip(row.as_ref()).zip(&mean) {
                *acc += (value - m).powi(2);
            }
        }
        let root_n = (n as f64).sqrt();
        for (s, e) in std.iter_mut().zip(sem.iter_mut()) {
            *s = (*s / (n - 1) as f64).sqrt();
            *e = *s / root_n;
        }
    }

    Summary { n, mean, std, sem }
}

/// Summary of one value per animal
pub fn summarize(values: &[f64]) -> ScalarSummary {
    let n = values.len();
    if n == 0 {
        return ScalarSummary {
            n,
            mean: 0.0,
            std: 0.0,
            sem: 0.0,
        };
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    if n == 1 {
        return ScalarSummary {
            n,
            mean,
            std: 0.0,
            sem: 0.0,
        };
    }

    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = variance.sqrt();
    ScalarSummary {
        n,
        mean,
        std,
        sem: std / (n as f64).sqrt(),
    }
}

/// Widen integer counts for the statistics routines
pub fn counts_as_f64(counts: &[u64]) -> Vec<f64> {
    counts.iter().map(|&c| c as f64).collect()
}
