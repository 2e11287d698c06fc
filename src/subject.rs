use crate::models::{RiskLevel, SubjectMarks, SubjectRisk};
use crate::risk::{classify, overall_risk};

const WEAK_COMPONENT_MARK: f64 = 50.0;

fn subject_marks(marks: &SubjectMarks) -> f64 {
    if marks.total > 0.0 {
        marks.total
    } else {
        (marks.assignment + marks.exam) / 2.0
    }
}

fn band_notes(level: RiskLevel) -> &'static [&'static str] {
    match level {
        RiskLevel::High => &["Low marks", "Needs improvement"],
        RiskLevel::Medium => &["Average performance"],
        RiskLevel::Low => &["Good performance"],
    }
}

pub fn analyze_subject(marks: &SubjectMarks) -> SubjectRisk {
    let score = overall_risk(subject_marks(marks));
    let level = classify(score);

    let mut notes: Vec<String> = band_notes(level).iter().map(|note| note.to_string()).collect();
    if marks.assignment < WEAK_COMPONENT_MARK {
        notes.push("Low assignment marks".to_string());
    }
    if marks.exam < WEAK_COMPONENT_MARK {
        notes.push("Low exam score".to_string());
    }

    SubjectRisk {
        subject: marks.name.clone(),
        code: marks.code.clone(),
        score,
        level,
        notes,
    }
}

/// Per-subject risks, riskiest first.
pub fn analyze_subjects(subjects: &[SubjectMarks]) -> Vec<SubjectRisk> {
    let mut risks: Vec<SubjectRisk> = subjects.iter().map(analyze_subject).collect();
    risks.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    risks
}
