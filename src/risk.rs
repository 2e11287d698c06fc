use crate::models::{
    RiskAssessment, RiskFactors, RiskLevel, RiskTrendResult, StudentProfile, StudentRisk,
};
use crate::snapshot::{clamp_percent, PerformanceSnapshot};
use crate::trend;

pub const HIGH_RISK_SCORE: f64 = 0.7;
pub const MEDIUM_RISK_SCORE: f64 = 0.4;

const FACTOR_ALERT: f64 = 0.5;
const COUNSELING_ALERT: f64 = 0.7;

pub const ATTENDANCE_ADVICE: &str = "Improve attendance — attend classes regularly.";
pub const ASSIGNMENT_ADVICE: &str = "Focus on assignment completion and quality.";
pub const EXAM_ADVICE: &str = "Increase study time for exam preparation.";
pub const COUNSELING_ADVICE: &str = "Consider academic counseling and support.";
pub const MAINTAIN_ADVICE: &str = "Continue maintaining good academic performance.";

/// Piecewise risk for an average mark on the 0..=100 scale.
///
/// | marks      | risk                                  |
/// |------------|---------------------------------------|
/// | 0          | 1.0                                   |
/// | (0, 40)    | 0.7 + (40 - m) / 40 * 0.29            |
/// | [40, 60)   | 0.4 + (60 - m) / 20 * 0.3             |
/// | [60, 100]  | (100 - m) / 40 * 0.4                  |
pub fn overall_risk(average_marks: f64) -> f64 {
    let marks = clamp_percent(average_marks);

    let risk = if marks == 0.0 {
        1.0
    } else if marks < 40.0 {
        0.7 + ((40.0 - marks) / 40.0) * 0.29
    } else if marks < 60.0 {
        // 0.4 + (60 - m) / 20 * 0.3, scaled so that 40 marks is exactly 0.7.
        (0.4 * 20.0 + (60.0 - marks) * 0.3) / 20.0
    } else {
        ((100.0 - marks) / 40.0 * 0.4).max(0.0)
    };

    risk.clamp(0.0, 1.0)
}

/// The single scalar fed to [`overall_risk`]. A strictly positive grade
/// average wins; otherwise the assignment/exam mean is used.
pub fn average_marks(snapshot: &PerformanceSnapshot, grade_average: Option<f64>) -> f64 {
    match grade_average.map(clamp_percent) {
        Some(grade) if grade > 0.0 => grade,
        _ => snapshot.average_marks(),
    }
}

pub fn factor_risk(metric: f64) -> f64 {
    ((100.0 - clamp_percent(metric)) / 100.0).max(0.0)
}

/// Diagnostic factor risks. `overall_risk` is filled from the snapshot's own
/// marks; callers scoring from a grade average replace it with
/// [`RiskFactors::with_overall_risk`].
pub fn factor_risks(snapshot: &PerformanceSnapshot) -> RiskFactors {
    RiskFactors {
        attendance_risk: factor_risk(snapshot.attendance_percent()),
        assignment_risk: factor_risk(snapshot.average_assignment()),
        exam_risk: factor_risk(snapshot.average_exam()),
        overall_risk: overall_risk(snapshot.average_marks()),
    }
}

impl RiskFactors {
    pub fn with_overall_risk(self, overall_risk: f64) -> Self {
        RiskFactors {
            overall_risk,
            ..self
        }
    }
}

/// Canonical level rule. Every level shown anywhere in the crate comes from
/// here, so 40 marks (score 0.7) is `High` on all paths.
pub fn classify(score: f64) -> RiskLevel {
    if score >= HIGH_RISK_SCORE {
        RiskLevel::High
    } else if score >= MEDIUM_RISK_SCORE {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn recommend(factors: &RiskFactors) -> Vec<String> {
    let checks = [
        (factors.attendance_risk > FACTOR_ALERT, ATTENDANCE_ADVICE),
        (factors.assignment_risk > FACTOR_ALERT, ASSIGNMENT_ADVICE),
        (factors.exam_risk > FACTOR_ALERT, EXAM_ADVICE),
        (factors.overall_risk > COUNSELING_ALERT, COUNSELING_ADVICE),
    ];

    let mut recommendations: Vec<String> = checks
        .iter()
        .filter(|(fired, _)| *fired)
        .map(|(_, advice)| advice.to_string())
        .collect();

    if recommendations.is_empty() {
        recommendations.push(MAINTAIN_ADVICE.to_string());
    }

    recommendations
}

/// Stateless entry point tying the scoring steps together.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskEngine;

impl RiskEngine {
    pub fn new() -> Self {
        RiskEngine
    }

    pub fn assess(&self, snapshot: &PerformanceSnapshot, grade_average: Option<f64>) -> RiskAssessment {
        let marks = average_marks(snapshot, grade_average);
        let score = overall_risk(marks);
        let factors = factor_risks(snapshot).with_overall_risk(score);
        let level = classify(score);
        let recommendations = recommend(&factors);

        tracing::debug!(
            attendance = snapshot.attendance_percent(),
            average_assignment = snapshot.average_assignment(),
            average_exam = snapshot.average_exam(),
            average_marks = marks,
            score,
            level = level.as_str(),
            "risk assessed"
        );

        RiskAssessment {
            score,
            level,
            average_marks: marks,
            factors,
            recommendations,
        }
    }

    pub fn trend(&self, history: &[PerformanceSnapshot]) -> RiskTrendResult {
        trend::analyze_trend(history)
    }

    /// Scores a stored profile from its total-marks average and pairs it with
    /// the trend over `history`.
    pub fn assess_student(&self, profile: &StudentProfile, history: &[PerformanceSnapshot]) -> StudentRisk {
        StudentRisk {
            student: profile.student.clone(),
            assessment: self.assess(&profile.snapshot(), profile.grade_average()),
            trend: self.trend(history),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn snapshot(attendance: f64, assignment: f64, exam: f64) -> PerformanceSnapshot {
        PerformanceSnapshot::from_averages(attendance, assignment, exam)
    }

    #[test]
    fn breakpoints_are_exact() {
        assert_eq!(overall_risk(0.0), 1.0);
        assert_eq!(overall_risk(40.0), 0.7);
        assert_eq!(overall_risk(60.0), 0.4);
        assert_eq!(overall_risk(100.0), 0.0);
    }

    #[test]
    fn high_band_approaches_point_ninety_nine() {
        assert!((overall_risk(39.0) - 0.70725).abs() < 1e-12);
        assert!((overall_risk(1.0) - (0.7 + 39.0 / 40.0 * 0.29)).abs() < 1e-12);
    }

    #[test]
    fn medium_and_low_bands_follow_formula() {
        assert!((overall_risk(50.0) - 0.55).abs() < 1e-12);
        assert!((overall_risk(80.0) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_marks_are_clamped() {
        assert_eq!(overall_risk(-15.0), 1.0);
        assert_eq!(overall_risk(130.0), 0.0);
        assert_eq!(overall_risk(f64::NAN), 1.0);
    }

    #[test]
    fn classify_thresholds() {
        assert_eq!(classify(1.0), RiskLevel::High);
        assert_eq!(classify(0.7), RiskLevel::High);
        assert_eq!(classify(0.69), RiskLevel::Medium);
        assert_eq!(classify(0.4), RiskLevel::Medium);
        assert_eq!(classify(0.39), RiskLevel::Low);
        assert_eq!(classify(0.0), RiskLevel::Low);
    }

    #[test]
    fn forty_marks_is_high_on_the_assessment_path() {
        let assessment = RiskEngine::new().assess(&snapshot(100.0, 40.0, 40.0), None);
        assert_eq!(assessment.score, 0.7);
        assert_eq!(assessment.level, RiskLevel::High);
        assert_eq!(classify(overall_risk(40.0)), assessment.level);
    }

    #[test]
    fn factor_risks_mirror_metrics() {
        let factors = factor_risks(&snapshot(90.0, 30.0, 30.0));
        assert!((factors.attendance_risk - 0.1).abs() < 1e-12);
        assert!((factors.assignment_risk - 0.7).abs() < 1e-12);
        assert!((factors.exam_risk - 0.7).abs() < 1e-12);
    }

    #[test]
    fn empty_marks_give_full_factor_risk() {
        let factors = factor_risks(&PerformanceSnapshot::new(75.0, Vec::new(), Vec::new()));
        assert_eq!(factors.assignment_risk, 1.0);
        assert_eq!(factors.exam_risk, 1.0);
        assert_eq!(factors.overall_risk, 1.0);
    }

    #[test]
    fn grade_average_overrides_assignment_exam_mean() {
        let current = snapshot(95.0, 20.0, 20.0);
        assert_eq!(average_marks(&current, Some(80.0)), 80.0);
        assert_eq!(average_marks(&current, Some(0.0)), 20.0);
        assert_eq!(average_marks(&current, None), 20.0);

        let assessment = RiskEngine::new().assess(&current, Some(80.0));
        assert!((assessment.score - 0.2).abs() < 1e-12);
        assert_eq!(assessment.level, RiskLevel::Low);
        // factor risks still describe the raw snapshot
        assert!((assessment.factors.assignment_risk - 0.8).abs() < 1e-12);
        assert_eq!(assessment.factors.overall_risk, assessment.score);
    }

    #[test]
    fn recommendations_follow_fixed_order() {
        let factors = RiskFactors {
            attendance_risk: 0.6,
            assignment_risk: 0.6,
            exam_risk: 0.6,
            overall_risk: 0.8,
        };
        assert_eq!(
            recommend(&factors),
            vec![
                ATTENDANCE_ADVICE.to_string(),
                ASSIGNMENT_ADVICE.to_string(),
                EXAM_ADVICE.to_string(),
                COUNSELING_ADVICE.to_string(),
            ]
        );
    }

    #[test]
    fn thresholds_are_strict() {
        let factors = RiskFactors {
            attendance_risk: 0.5,
            assignment_risk: 0.5,
            exam_risk: 0.5,
            overall_risk: 0.7,
        };
        assert_eq!(recommend(&factors), vec![MAINTAIN_ADVICE.to_string()]);
    }

    #[test]
    fn counseling_fires_alone_on_overall_risk() {
        let factors = RiskFactors {
            attendance_risk: 0.1,
            assignment_risk: 0.2,
            exam_risk: 0.3,
            overall_risk: 0.71,
        };
        assert_eq!(recommend(&factors), vec![COUNSELING_ADVICE.to_string()]);
    }

    #[test]
    fn student_profile_prefers_total_marks() {
        use crate::models::{StudentRecord, SubjectMarks, Trend};

        let subject = |assignment: f64, exam: f64, total: f64| SubjectMarks {
            name: "Machine Learning".to_string(),
            code: "CS304".to_string(),
            assignment,
            exam,
            total,
        };
        let profile = StudentProfile {
            student: StudentRecord {
                id: uuid::Uuid::new_v4(),
                full_name: "Jules Moreno".to_string(),
                email: "jules.moreno@campus.edu".to_string(),
                roll_no: "CS2026-002".to_string(),
                attendance_percentage: 40.0,
            },
            subjects: vec![subject(60.0, 70.0, 70.0), subject(70.0, 60.0, 70.0)],
            average_total: 70.0,
        };
        let history: Vec<PerformanceSnapshot> = [50.0, 52.0, 54.0, 70.0, 75.0, 80.0]
            .iter()
            .map(|marks| snapshot(90.0, *marks, *marks))
            .collect();

        let risk = RiskEngine::new().assess_student(&profile, &history);
        assert!((risk.assessment.score - 0.3).abs() < 1e-12);
        assert_eq!(risk.assessment.average_marks, 70.0);
        assert_eq!(risk.assessment.level, RiskLevel::Low);
        assert!((risk.assessment.factors.attendance_risk - 0.6).abs() < 1e-12);
        assert_eq!(risk.assessment.recommendations, vec![ATTENDANCE_ADVICE.to_string()]);
        assert_eq!(risk.trend.trend, Trend::Improving);
    }

    proptest! {
        #[test]
        fn score_stays_in_unit_interval(marks in 0.0..=100.0f64) {
            let score = overall_risk(marks);
            prop_assert!((0.0..=1.0).contains(&score));
        }

        #[test]
        fn score_never_increases_with_marks(a in 0.0..=100.0f64, b in 0.0..=100.0f64) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(overall_risk(low) >= overall_risk(high));
        }

        #[test]
        fn recommend_is_deterministic(
            attendance in 0.0..=1.0f64,
            assignment in 0.0..=1.0f64,
            exam in 0.0..=1.0f64,
            overall in 0.0..=1.0f64,
        ) {
            let factors = RiskFactors {
                attendance_risk: attendance,
                assignment_risk: assignment,
                exam_risk: exam,
                overall_risk: overall,
            };
            let first = recommend(&factors);
            prop_assert_eq!(&first, &recommend(&factors));
            prop_assert!(!first.is_empty() && first.len() <= 4);
        }
    }
}
