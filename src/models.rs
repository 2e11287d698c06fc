use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::snapshot::PerformanceSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-dimension risks plus the overall marks-driven risk. All values in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactors {
    pub attendance_risk: f64,
    pub assignment_risk: f64,
    pub exam_risk: f64,
    pub overall_risk: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub score: f64,
    pub level: RiskLevel,
    pub average_marks: f64,
    pub factors: RiskFactors,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskTrendResult {
    pub trend: Trend,
    pub change_rate: f64,
}

impl RiskTrendResult {
    pub fn stable() -> Self {
        RiskTrendResult {
            trend: Trend::Stable,
            change_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub roll_no: String,
    pub attendance_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectMarks {
    pub name: String,
    pub code: String,
    pub assignment: f64,
    pub exam: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectRisk {
    pub subject: String,
    pub code: String,
    pub score: f64,
    pub level: RiskLevel,
    pub notes: Vec<String>,
}

/// A student's academic record as loaded from the store.
#[derive(Debug, Clone)]
pub struct StudentProfile {
    pub student: StudentRecord,
    pub subjects: Vec<SubjectMarks>,
    pub average_total: f64,
}

impl StudentProfile {
    /// Current snapshot built from the per-subject marks.
    pub fn snapshot(&self) -> PerformanceSnapshot {
        PerformanceSnapshot::new(
            self.student.attendance_percentage,
            self.subjects.iter().map(|subject| subject.assignment).collect(),
            self.subjects.iter().map(|subject| subject.exam).collect(),
        )
    }

    /// Stored total-marks average, when one has been recorded.
    pub fn grade_average(&self) -> Option<f64> {
        Some(self.average_total).filter(|total| *total > 0.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentRisk {
    pub student: StudentRecord,
    pub assessment: RiskAssessment,
    pub trend: RiskTrendResult,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}
