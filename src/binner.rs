//! Bout duration binning
//!
//! Durations are sorted into a fixed ladder of right-open bins
//! `[e_0, e_1), [e_1, e_2), ..., [e_{n-1}, e_n)`, where the last edge is
//! usually infinity. Durations below `e_0` belong to no bin and are dropped.

use crate::error::AnalysisError;

/// Canonical ladder starting at 2 seconds (bouts shorter than 2s are dropped)
pub const DEFAULT_BIN_EDGES: [f64; 10] = [
    2.0,
    4.0,
    8.0,
    16.0,
    32.0,
    64.0,
    128.0,
    256.0,
    512.0,
    f64::INFINITY,
];

/// Alternate ladder starting at 0 seconds (first bin covers 0-4s)
pub const ZERO_BASED_BIN_EDGES: [f64; 10] = [
    0.0,
    4.0,
    8.0,
    16.0,
    32.0,
    64.0,
    128.0,
    256.0,
    512.0,
    f64::INFINITY,
];

/// Validated, strictly increasing bin edge ladder
#[derive(Debug, Clone, PartialEq)]
pub struct DurationBinner {
    edges: Vec<f64>,
}

impl Default for DurationBinner {
    fn default() -> Self {
        Self {
            edges: DEFAULT_BIN_EDGES.to_vec(),
        }
    }
}

impl TryFrom<Vec<f64>> for DurationBinner {
    type Error = AnalysisError;

    fn try_from(edges: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(edges)
    }
}

impl From<DurationBinner> for Vec<f64> {
    fn from(binner: DurationBinner) -> Self {
        binner.edges
    }
}

impl DurationBinner {
    /// Create a binner, checking that the edges form a usable ladder
    pub fn new(edges: Vec<f64>) -> Result<Self, AnalysisError> {
        validate_edges(&edges)?;
        Ok(Self { edges })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Number of bins (one fewer than the number of edges)
    pub fn num_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Index of the bin containing `duration`, or `None` when it falls
    /// below the first edge (or at/above a finite last edge)
    pub fn bin_index(&self, duration: f64) -> Option<usize> {
        if duration.is_nan() || duration < self.edges[0] {
            return None;
        }
        // Number of edges <= duration; the containing bin starts at the last of them
        let idx = self.edges.partition_point(|edge| *edge <= duration) - 1;
        (idx < self.num_bins()).then_some(idx)
    }

    /// Count durations per bin in one pass, dropping unbinnable values
    pub fn histogram(&self, durations: &[f64]) -> Vec<u64> {
        let mut counts = vec![0u64; self.num_bins()];
        for &duration in durations {
            if let Some(idx) = self.bin_index(duration) {
                counts[idx] += 1;
            }
        }
        counts
    }

    /// Display labels such as `"2-4"` and `"512+"`
    pub fn default_labels(&self) -> Vec<String> {
        self.edges
            .windows(2)
            .map(|pair| {
                if pair[1].is_infinite() {
                    format!("{}+", pair[0])
                } else {
                    format!("{}-{}", pair[0], pair[1])
                }
            })
            .collect()
    }
}

/// Bin a single duration against an unvalidated edge ladder
pub fn bin_index(duration: f64, edges: &[f64]) -> Result<Option<usize>, AnalysisError> {
    validate_edges(edges)?;
    Ok(DurationBinner {
        edges: edges.to_vec(),
    }
    .bin_index(duration))
}

/// Histogram durations against an unvalidated edge ladder
pub fn histogram(durations: &[f64], edges: &[f64]) -> Result<Vec<u64>, AnalysisError> {
    validate_edges(edges)?;
    Ok(DurationBinner {
        edges: edges.to_vec(),
    }
    .histogram(durations))
}

fn validate_edges(edges: &[f64]) -> Result<(), AnalysisError> {
    if edges.len() < 2 {
        return Err(AnalysisError::InvalidEdges(format!(
            "need at least 2 edges, got {}",
            edges.len()
        )));
    }
    if let Some(pos) = edges.iter().position(|e| e.is_nan()) {
        return Err(AnalysisError::InvalidEdges(format!(
            "edge {} is NaN",
            pos
        )));
    }
    if edges[..edges.len() - 1].iter().any(|e| e.is_infinite()) {
        return Err(AnalysisError::InvalidEdges(
            "only the last edge may be infinite".to_string(),
        ));
    }
    if let Some(pair) = edges.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(AnalysisError::InvalidEdges(format!(
            "edges must be strictly increasing ({} >= {})",
            pair[0], pair[1]
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn small_ladder() -> DurationBinner {
        DurationBinner::new(vec![2.0, 4.0, 8.0, 16.0, 32.0, f64::INFINITY]).unwrap()
    }

    #[test]
    fn test_every_binnable_duration_lands_in_exactly_one_bin() {
        let binner = DurationBinner::default();
        for d in [2.0, 3.9, 4.0, 7.5, 100.0, 511.9, 512.0, 10_000.0] {
            let hist = binner.histogram(&[d]);
            assert_eq!(hist.iter().sum::<u64>(), 1, "duration {}", d);
            let idx = binner.bin_index(d).unwrap();
            assert_eq!(hist[idx], 1);
            assert!(binner.edges()[idx] <= d && d < binner.edges()[idx + 1]);
        }
    }

    #[test]
    fn test_edge_value_belongs_to_upper_bin() {
        let binner = small_ladder();
        assert_eq!(binner.bin_index(2.0), Some(0));
        assert_eq!(binner.bin_index(4.0), Some(1));
        assert_eq!(binner.bin_index(16.0), Some(3));
        assert_eq!(binner.bin_index(32.0), Some(4));
    }

    #[test]
    fn test_below_first_edge_is_dropped() {
        let binner = DurationBinner::default();
        assert_eq!(binner.bin_index(0.0), None);
        assert_eq!(binner.bin_index(1.99), None);
        assert_eq!(binner.histogram(&[0.0, 1.0, 1.5]), vec![0; 9]);
    }

    #[test]
    fn test_zero_based_ladder_keeps_short_bouts() {
        let binner = DurationBinner::new(ZERO_BASED_BIN_EDGES.to_vec()).unwrap();
        assert_eq!(binner.bin_index(0.0), Some(0));
        assert_eq!(binner.bin_index(1.0), Some(0));
        assert_eq!(&binner.histogram(&[0.0, 1.0, 5.0])[..2], &[2u64, 1]);
    }

    #[test]
    fn test_finite_last_edge_excludes_larger_values() {
        let binner = DurationBinner::new(vec![0.0, 10.0, 20.0]).unwrap();
        assert_eq!(binner.bin_index(19.9), Some(1));
        assert_eq!(binner.bin_index(20.0), None);
    }

    #[test]
    fn test_histogram_matches_manual_tally() {
        let binner = small_ladder();
        assert_eq!(binner.histogram(&[2.0, 2.0, 5.0, 20.0]), vec![2, 1, 0, 1, 0]);
    }

    #[test]
    fn test_invalid_edges() {
        assert!(matches!(
            DurationBinner::new(vec![2.0]),
            Err(AnalysisError::InvalidEdges(_))
        ));
        assert!(matches!(
            DurationBinner::new(vec![2.0, 2.0, 4.0]),
            Err(AnalysisError::InvalidEdges(_))
        ));
        assert!(matches!(
            DurationBinner::new(vec![4.0, 2.0]),
            Err(AnalysisError::InvalidEdges(_))
        ));
        assert!(matches!(
            DurationBinner::new(vec![0.0, f64::INFINITY, f64::INFINITY]),
            Err(AnalysisError::InvalidEdges(_))
        ));
        assert!(matches!(
            histogram(&[1.0], &[]),
            Err(AnalysisError::InvalidEdges(_))
        ));
    }

    #[test]
    fn test_free_functions() {
        let edges = [2.0, 4.0, f64::INFINITY];
        assert_eq!(bin_index(3.0, &edges).unwrap(), Some(0));
        assert_eq!(bin_index(1.0, &edges).unwrap(), None);
        assert_eq!(histogram(&[1.0, 3.0, 9.0], &edges).unwrap(), vec![1, 1]);
    }

    #[test]
    fn test_default_labels() {
        let binner = DurationBinner::default();
        let labels = binner.default_labels();
        assert_eq!(labels.len(), 9);
        assert_eq!(labels[0], "2-4");
        assert_eq!(labels[8], "512+");
    }
}
