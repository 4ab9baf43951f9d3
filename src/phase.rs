//! Light/dark phase and Zeitgeber Time classification
//!
//! Both mappings work on the local wall-clock hour. The light window and the
//! ZT origin are configured separately; by default they coincide at 6:00.

use crate::error::AnalysisError;
use crate::types::Phase;

/// Number of ZT hour buckets
pub const ZT_HOURS: usize = 24;

/// Maps wall-clock hours to phases and ZT hour indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseClassifier {
    light_start_hour: u32,
    dark_start_hour: u32,
    zt_origin_hour: u32,
}

impl Default for PhaseClassifier {
    fn default() -> Self {
        Self {
            light_start_hour: 6,
            dark_start_hour: 18,
            zt_origin_hour: 6,
        }
    }
}

impl PhaseClassifier {
    /// Create a classifier; light is `[light_start_hour, dark_start_hour)`
    pub fn new(
        light_start_hour: u32,
        dark_start_hour: u32,
        zt_origin_hour: u32,
    ) -> Result<Self, AnalysisError> {
        check_hour(light_start_hour)?;
        check_hour(dark_start_hour)?;
        check_hour(zt_origin_hour)?;
        if light_start_hour >= dark_start_hour {
            return Err(AnalysisError::InvalidConfig(format!(
                "light_start_hour ({}) must precede dark_start_hour ({})",
                light_start_hour, dark_start_hour
            )));
        }
        Ok(Self {
            light_start_hour,
            dark_start_hour,
            zt_origin_hour,
        })
    }

    pub fn phase_of(&self, hour: u32) -> Result<Phase, AnalysisError> {
        check_hour(hour)?;
        if (self.light_start_hour..self.dark_start_hour).contains(&hour) {
            Ok(Phase::Light)
        } else {
            Ok(Phase::Dark)
        }
    }

    /// ZT index of a wall-clock hour: `(hour - zt_origin) mod 24`
    pub fn zt_hour_of(&self, hour: u32) -> Result<usize, AnalysisError> {
        check_hour(hour)?;
        Ok(((hour + ZT_HOURS as u32 - self.zt_origin_hour) % ZT_HOURS as u32) as usize)
    }
}

fn check_hour(hour: u32) -> Result<(), AnalysisError> {
    if hour > 23 {
        return Err(AnalysisError::InvalidHour(hour));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_iff_between_six_and_eighteen() {
        let classifier = PhaseClassifier::default();
        for hour in 0..24 {
            let phase = classifier.phase_of(hour).unwrap();
            assert_eq!(phase == Phase::Light, (6..18).contains(&hour), "hour {}", hour);
            assert_ne!(phase == Phase::Light, phase == Phase::Dark);
        }
    }

    #[test]
    fn test_phase_boundaries() {
        let classifier = PhaseClassifier::default();
        assert_eq!(classifier.phase_of(5).unwrap(), Phase::Dark);
        assert_eq!(classifier.phase_of(6).unwrap(), Phase::Light);
        assert_eq!(classifier.phase_of(17).unwrap(), Phase::Light);
        assert_eq!(classifier.phase_of(18).unwrap(), Phase::Dark);
    }

    #[test]
    fn test_zt_hours() {
        let classifier = PhaseClassifier::default();
        assert_eq!(classifier.zt_hour_of(6).unwrap(), 0);
        assert_eq!(classifier.zt_hour_of(18).unwrap(), 12);
        assert_eq!(classifier.zt_hour_of(5).unwrap(), 23);
        assert_eq!(classifier.zt_hour_of(0).unwrap(), 18);
    }

    #[test]
    fn test_invalid_hour() {
        let classifier = PhaseClassifier::default();
        assert!(matches!(
            classifier.phase_of(24),
            Err(AnalysisError::InvalidHour(24))
        ));
        assert!(matches!(
            classifier.zt_hour_of(99),
            Err(AnalysisError::InvalidHour(99))
        ));
    }

    #[test]
    fn test_shifted_schedule() {
        let classifier = PhaseClassifier::new(7, 19, 7).unwrap();
        assert_eq!(classifier.phase_of(6).unwrap(), Phase::Dark);
        assert_eq!(classifier.phase_of(7).unwrap(), Phase::Light);
        assert_eq!(classifier.zt_hour_of(7).unwrap(), 0);
        assert_eq!(classifier.zt_hour_of(6).unwrap(), 23);
    }

    #[test]
    fn test_rejects_inverted_window() {
        assert!(matches!(
            PhaseClassifier::new(18, 6, 6),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }
}
