use serde::Serialize;

use crate::models::BpReading;

/// Entered values within this many mmHg of the true value count as correct.
pub const ACCURACY_TOLERANCE: i32 = 5;

/// Average error at which the accuracy score bottoms out at zero.
const MAX_SCORED_ERROR: f64 = 50.0;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptScore {
    pub systolic_error: i32,
    pub diastolic_error: i32,
    pub average_error: f64,
    /// 0-100, linear falloff: zero error scores 100, average error of 50 or
    /// more scores 0.
    pub accuracy: i32,
    pub is_correct: bool,
}

pub fn score(true_reading: BpReading, entered: BpReading) -> AttemptScore {
    let systolic_error = (true_reading.systolic - entered.systolic).abs();
    let diastolic_error = (true_reading.diastolic - entered.diastolic).abs();
    let average_error = f64::from(systolic_error + diastolic_error) / 2.0;
    let accuracy = (100.0 - (average_error / MAX_SCORED_ERROR) * 100.0)
        .round()
        .max(0.0) as i32;
    let is_correct = systolic_error <= ACCURACY_TOLERANCE && diastolic_error <= ACCURACY_TOLERANCE;

    AttemptScore {
        systolic_error,
        diastolic_error,
        average_error,
        accuracy,
        is_correct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_reading_scores_full_accuracy() {
        let result = score(BpReading::new(120, 80), BpReading::new(120, 80));
        assert_eq!(result.systolic_error, 0);
        assert_eq!(result.diastolic_error, 0);
        assert_eq!(result.accuracy, 100);
        assert!(result.is_correct);
    }

    #[test]
    fn errors_beyond_tolerance_are_incorrect() {
        let result = score(BpReading::new(140, 90), BpReading::new(120, 80));
        assert_eq!(result.systolic_error, 20);
        assert_eq!(result.diastolic_error, 10);
        assert_eq!(result.average_error, 15.0);
        assert_eq!(result.accuracy, 70);
        assert!(!result.is_correct);
    }

    #[test]
    fn accuracy_clamps_at_zero_for_huge_errors() {
        let result = score(BpReading::new(200, 130), BpReading::new(1, 1));
        assert_eq!(result.accuracy, 0);
        assert!(!result.is_correct);
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let result = score(BpReading::new(120, 80), BpReading::new(125, 75));
        assert!(result.is_correct);
        let result = score(BpReading::new(120, 80), BpReading::new(126, 80));
        assert!(!result.is_correct);
    }
}
