//! Point-in-time performance inputs and the coercion rules that build them.
//!
//! Every value that reaches the scoring code has passed through
//! [`clamp_percent`], so it is finite and within `[0, 100]`. Missing or
//! unparseable fields become `0.0` here rather than anywhere downstream.

use serde::Serialize;

/// Parses a raw field as a number. Missing, blank, unparseable and
/// non-finite input all yield `0.0`.
pub fn coerce_number(raw: Option<&str>) -> f64 {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

pub fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Raw snapshot fields exactly as they arrive from CSV rows or text columns.
#[derive(Debug, Clone, Default)]
pub struct RawSnapshot {
    pub attendance: Option<String>,
    pub assignment_marks: Vec<Option<String>>,
    pub exam_scores: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSnapshot {
    attendance_percent: f64,
    assignment_marks: Vec<f64>,
    exam_scores: Vec<f64>,
    average_assignment: f64,
    average_exam: f64,
}

impl PerformanceSnapshot {
    pub fn new(attendance_percent: f64, assignment_marks: Vec<f64>, exam_scores: Vec<f64>) -> Self {
        let assignment_marks: Vec<f64> = assignment_marks.into_iter().map(clamp_percent).collect();
        let exam_scores: Vec<f64> = exam_scores.into_iter().map(clamp_percent).collect();

        PerformanceSnapshot {
            attendance_percent: clamp_percent(attendance_percent),
            average_assignment: mean(&assignment_marks),
            average_exam: mean(&exam_scores),
            assignment_marks,
            exam_scores,
        }
    }

    /// Builds a snapshot from pre-aggregated averages, as stored per
    /// assessment in the record store.
    pub fn from_averages(attendance_percent: f64, average_assignment: f64, average_exam: f64) -> Self {
        PerformanceSnapshot::new(
            attendance_percent,
            vec![average_assignment],
            vec![average_exam],
        )
    }

    pub fn from_raw(raw: &RawSnapshot) -> Self {
        let coerce_all = |values: &[Option<String>]| -> Vec<f64> {
            values
                .iter()
                .map(|value| coerce_number(value.as_deref()))
                .collect()
        };

        PerformanceSnapshot::new(
            coerce_number(raw.attendance.as_deref()),
            coerce_all(&raw.assignment_marks),
            coerce_all(&raw.exam_scores),
        )
    }

    pub fn attendance_percent(&self) -> f64 {
        self.attendance_percent
    }

    pub fn assignment_marks(&self) -> &[f64] {
        &self.assignment_marks
    }

    pub fn exam_scores(&self) -> &[f64] {
        &self.exam_scores
    }

    pub fn average_assignment(&self) -> f64 {
        self.average_assignment
    }

    pub fn average_exam(&self) -> f64 {
        self.average_exam
    }

    /// Mean of the assignment and exam averages.
    pub fn average_marks(&self) -> f64 {
        (self.average_assignment + self.average_exam) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_number_treats_missing_and_garbage_as_zero() {
        assert_eq!(coerce_number(None), 0.0);
        assert_eq!(coerce_number(Some("")), 0.0);
        assert_eq!(coerce_number(Some("   ")), 0.0);
        assert_eq!(coerce_number(Some("n/a")), 0.0);
        assert_eq!(coerce_number(Some("NaN")), 0.0);
        assert_eq!(coerce_number(Some("inf")), 0.0);
        assert_eq!(coerce_number(Some(" 72.5 ")), 72.5);
    }

    #[test]
    fn clamp_percent_bounds_values() {
        assert_eq!(clamp_percent(-12.0), 0.0);
        assert_eq!(clamp_percent(140.0), 100.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(f64::NEG_INFINITY), 0.0);
        assert_eq!(clamp_percent(55.5), 55.5);
    }

    #[test]
    fn empty_sequences_average_to_zero() {
        let snapshot = PerformanceSnapshot::new(80.0, Vec::new(), Vec::new());
        assert_eq!(snapshot.average_assignment(), 0.0);
        assert_eq!(snapshot.average_exam(), 0.0);
        assert_eq!(snapshot.average_marks(), 0.0);
    }

    #[test]
    fn marks_are_clamped_before_averaging() {
        let snapshot = PerformanceSnapshot::new(120.0, vec![150.0, 50.0], vec![-20.0, 40.0]);
        assert_eq!(snapshot.attendance_percent(), 100.0);
        assert_eq!(snapshot.assignment_marks(), &[100.0, 50.0]);
        assert_eq!(snapshot.average_assignment(), 75.0);
        assert_eq!(snapshot.exam_scores(), &[0.0, 40.0]);
        assert_eq!(snapshot.average_exam(), 20.0);
    }

    #[test]
    fn raw_snapshot_is_coerced_then_clamped() {
        let raw = RawSnapshot {
            attendance: Some("abc".to_string()),
            assignment_marks: vec![Some("60".to_string()), None, Some("x".to_string())],
            exam_scores: vec![Some("250".to_string())],
        };

        let snapshot = PerformanceSnapshot::from_raw(&raw);
        assert_eq!(snapshot.attendance_percent(), 0.0);
        assert_eq!(snapshot.assignment_marks(), &[60.0, 0.0, 0.0]);
        assert!((snapshot.average_assignment() - 20.0).abs() < 1e-12);
        assert_eq!(snapshot.average_exam(), 100.0);
    }
}
