use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{LevelCounts, RiskLevel, StudentRisk};

pub fn summarize_levels(students: &[StudentRisk]) -> LevelCounts {
    let mut counts = LevelCounts::default();

    for student in students {
        match student.assessment.level {
            RiskLevel::High => counts.high += 1,
            RiskLevel::Medium => counts.medium += 1,
            RiskLevel::Low => counts.low += 1,
        }
    }

    counts
}

/// Students ordered by descending risk score. Ties keep input order.
pub fn rank_students(students: &[StudentRisk]) -> Vec<&StudentRisk> {
    let mut ranked: Vec<&StudentRisk> = students.iter().collect();
    ranked.sort_by(|a, b| {
        b.assessment
            .score
            .partial_cmp(&a.assessment.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

pub fn build_report(generated_on: NaiveDate, students: &[StudentRisk], limit: usize) -> String {
    let counts = summarize_levels(students);
    let ranked = rank_students(students);

    let mut output = String::new();

    let _ = writeln!(output, "# Academic Risk Report");
    let _ = writeln!(
        output,
        "Generated on {} for {} students",
        generated_on,
        students.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Distribution");

    if students.is_empty() {
        let _ = writeln!(output, "No students assessed.");
    } else {
        let _ = writeln!(output, "- high: {}", counts.high);
        let _ = writeln!(output, "- medium: {}", counts.medium);
        let _ = writeln!(output, "- low: {}", counts.low);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Students");

    if ranked.is_empty() {
        let _ = writeln!(output, "No students assessed.");
    } else {
        for entry in ranked.iter().take(limit) {
            let _ = writeln!(
                output,
                "- {} ({}) {} risk, score {:.2}, trend {}",
                entry.student.full_name,
                entry.student.roll_no,
                entry.assessment.level,
                entry.assessment.score,
                entry.trend.trend.as_str()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommended Interventions");

    let high_risk: Vec<&&StudentRisk> = ranked
        .iter()
        .filter(|entry| entry.assessment.level == RiskLevel::High)
        .collect();

    if high_risk.is_empty() {
        let _ = writeln!(output, "No high-risk students in this cohort.");
    } else {
        for entry in high_risk {
            let _ = writeln!(output, "### {}", entry.student.full_name);
            for recommendation in &entry.assessment.recommendations {
                let _ = writeln!(output, "- {}", recommendation);
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RiskTrendResult, StudentRecord};
    use crate::risk::RiskEngine;
    use crate::snapshot::PerformanceSnapshot;
    use uuid::Uuid;

    fn student_risk(name: &str, roll_no: &str, attendance: f64, marks: f64) -> StudentRisk {
        let snapshot = PerformanceSnapshot::from_averages(attendance, marks, marks);
        StudentRisk {
            student: StudentRecord {
                id: Uuid::new_v4(),
                full_name: name.to_string(),
                email: format!("{}@example.edu", roll_no.to_lowercase()),
                roll_no: roll_no.to_string(),
                attendance_percentage: attendance,
            },
            assessment: RiskEngine::new().assess(&snapshot, None),
            trend: RiskTrendResult::stable(),
        }
    }

    fn report_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn counts_levels() {
        let students = vec![
            student_risk("Avery Lee", "R001", 95.0, 85.0),
            student_risk("Jules Moreno", "R002", 70.0, 50.0),
            student_risk("Kiara Patel", "R003", 40.0, 25.0),
            student_risk("Noor Haddad", "R004", 88.0, 40.0),
        ];

        let counts = summarize_levels(&students);
        assert_eq!(counts, LevelCounts { high: 2, medium: 1, low: 1 });
    }

    #[test]
    fn ranking_is_by_descending_score() {
        let students = vec![
            student_risk("Avery Lee", "R001", 95.0, 85.0),
            student_risk("Kiara Patel", "R003", 40.0, 25.0),
            student_risk("Jules Moreno", "R002", 70.0, 50.0),
        ];

        let names: Vec<&str> = rank_students(&students)
            .iter()
            .map(|entry| entry.student.full_name.as_str())
            .collect();
        assert_eq!(names, vec!["Kiara Patel", "Jules Moreno", "Avery Lee"]);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let students = vec![
            student_risk("Avery Lee", "R001", 95.0, 85.0),
            student_risk("Noor Haddad", "R004", 60.0, 45.0),
            student_risk("Jules Moreno", "R002", 70.0, 45.0),
        ];

        let names: Vec<&str> = rank_students(&students)
            .iter()
            .map(|entry| entry.student.full_name.as_str())
            .collect();
        assert_eq!(names, vec!["Noor Haddad", "Jules Moreno", "Avery Lee"]);
    }

    #[test]
    fn report_lists_interventions_for_high_risk_only() {
        let students = vec![
            student_risk("Avery Lee", "R001", 95.0, 85.0),
            student_risk("Kiara Patel", "R003", 40.0, 25.0),
        ];

        let report = build_report(report_date(), &students, 10);
        assert!(report.contains("Generated on 2026-03-02 for 2 students"));
        assert!(report.contains("- high: 1"));
        assert!(report.contains("- Kiara Patel (R003) high risk, score"));
        assert!(report.contains("### Kiara Patel"));
        assert!(report.contains("- Improve attendance — attend classes regularly."));
        assert!(!report.contains("### Avery Lee"));
    }

    #[test]
    fn report_respects_limit() {
        let students = vec![
            student_risk("Avery Lee", "R001", 95.0, 85.0),
            student_risk("Kiara Patel", "R003", 40.0, 25.0),
        ];

        let report = build_report(report_date(), &students, 1);
        assert!(report.contains("- Kiara Patel (R003)"));
        assert!(!report.contains("- Avery Lee (R001)"));
    }

    #[test]
    fn empty_report_has_placeholders() {
        let report = build_report(report_date(), &[], 10);
        assert!(report.contains("No students assessed."));
        assert!(report.contains("No high-risk students in this cohort."));
    }
}
