use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::errors::LookupError;
use crate::models::{RiskAssessment, StudentProfile, StudentRecord, SubjectMarks};
use crate::snapshot::{PerformanceSnapshot, RawSnapshot};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("schema migrations applied");
    Ok(())
}

const SEED_SUBJECTS: [(&str, &str); 5] = [
    ("Object Oriented Programming", "CS301"),
    ("Data Structures and Algorithms", "CS302"),
    ("Deep Learning", "CS303"),
    ("Machine Learning", "CS304"),
    ("Operating System", "CS305"),
];

async fn upsert_student(
    pool: &PgPool,
    full_name: &str,
    email: &str,
    roll_no: &str,
    attendance: f64,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO academic_risk.students (id, full_name, email, roll_no, attendance_percentage)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name,
            roll_no = EXCLUDED.roll_no,
            attendance_percentage = EXCLUDED.attendance_percentage
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(full_name)
    .bind(email)
    .bind(roll_no)
    .bind(attendance)
    .fetch_one(pool)
    .await?
    .try_get("id")?;

    Ok(id)
}

async fn insert_snapshot(
    pool: &PgPool,
    student_id: Uuid,
    recorded_at: NaiveDate,
    snapshot: &PerformanceSnapshot,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO academic_risk.performance_snapshots
        (id, student_id, recorded_at, attendance_percentage, assignment_average, exam_average, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(recorded_at)
    .bind(snapshot.attendance_percent())
    .bind(snapshot.average_assignment())
    .bind(snapshot.average_exam())
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    for (name, code) in SEED_SUBJECTS {
        sqlx::query(
            r#"
            INSERT INTO academic_risk.subjects (id, name, code)
            VALUES ($1, $2, $3)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(code)
        .execute(pool)
        .await?;
    }

    // (name, email, roll, attendance, per-subject (assignment, exam, total), snapshot marks oldest first)
    let students = vec![
        (
            "Avery Lee",
            "avery.lee@campus.edu",
            "CS2026-001",
            94.0,
            [(88.0, 82.0, 85.0), (91.0, 79.0, 84.0), (76.0, 81.0, 79.0), (85.0, 88.0, 87.0), (90.0, 84.0, 86.0)],
            [72.0, 75.0, 78.0, 82.0, 84.0, 86.0],
        ),
        (
            "Jules Moreno",
            "jules.moreno@campus.edu",
            "CS2026-002",
            71.0,
            [(58.0, 49.0, 53.0), (62.0, 55.0, 58.0), (45.0, 41.0, 43.0), (60.0, 52.0, 56.0), (55.0, 50.0, 52.0)],
            [64.0, 61.0, 60.0, 55.0, 53.0, 52.0],
        ),
        (
            "Kiara Patel",
            "kiara.patel@campus.edu",
            "CS2026-003",
            46.0,
            [(32.0, 28.0, 30.0), (40.0, 35.0, 37.0), (25.0, 30.0, 28.0), (38.0, 42.0, 40.0), (30.0, 26.0, 28.0)],
            [50.0, 52.0, 54.0, 70.0, 75.0, 80.0],
        ),
    ];

    let start = NaiveDate::from_ymd_opt(2026, 1, 5).context("invalid date")?;

    for (name, email, roll_no, attendance, subjects, history) in students {
        let student_id = upsert_student(pool, name, email, roll_no, attendance).await?;

        for ((_, code), (assignment, exam, total)) in SEED_SUBJECTS.iter().zip(subjects) {
            sqlx::query(
                r#"
                INSERT INTO academic_risk.student_subjects
                (student_id, subject_id, assignment_marks, exam_score, total_marks)
                SELECT $1, id, $3, $4, $5 FROM academic_risk.subjects WHERE code = $2
                ON CONFLICT (student_id, subject_id) DO UPDATE
                SET assignment_marks = EXCLUDED.assignment_marks,
                    exam_score = EXCLUDED.exam_score,
                    total_marks = EXCLUDED.total_marks
                "#,
            )
            .bind(student_id)
            .bind(*code)
            .bind(assignment)
            .bind(exam)
            .bind(total)
            .execute(pool)
            .await?;
        }

        for (week, marks) in history.iter().enumerate() {
            let recorded_at = start + chrono::Duration::weeks(week as i64);
            let snapshot = PerformanceSnapshot::from_averages(attendance, *marks, *marks);
            let source_key = format!("seed-{roll_no}-{week}");
            insert_snapshot(pool, student_id, recorded_at, &snapshot, &source_key).await?;
        }
    }

    tracing::info!("seed data ready");
    Ok(())
}

fn student_from_row(row: &sqlx::postgres::PgRow) -> anyhow::Result<StudentRecord> {
    Ok(StudentRecord {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        roll_no: row.try_get("roll_no")?,
        attendance_percentage: row.try_get("attendance_percentage")?,
    })
}

fn mean_of(subjects: &[SubjectMarks], pick: impl Fn(&SubjectMarks) -> f64) -> f64 {
    if subjects.is_empty() {
        0.0
    } else {
        subjects.iter().map(pick).sum::<f64>() / subjects.len() as f64
    }
}

async fn load_profile(pool: &PgPool, student: StudentRecord) -> anyhow::Result<StudentProfile> {
    let rows = sqlx::query(
        r#"
        SELECT sub.name, sub.code, ss.assignment_marks, ss.exam_score, ss.total_marks
        FROM academic_risk.student_subjects ss
        JOIN academic_risk.subjects sub ON sub.id = ss.subject_id
        WHERE ss.student_id = $1
        ORDER BY sub.code
        "#,
    )
    .bind(student.id)
    .fetch_all(pool)
    .await?;

    let mut subjects = Vec::with_capacity(rows.len());
    for row in rows {
        subjects.push(SubjectMarks {
            name: row.try_get("name")?,
            code: row.try_get("code")?,
            assignment: row.try_get("assignment_marks")?,
            exam: row.try_get("exam_score")?,
            total: row.try_get("total_marks")?,
        });
    }

    let average_total = mean_of(&subjects, |marks| marks.total);

    Ok(StudentProfile {
        student,
        subjects,
        average_total,
    })
}

/// Looks a student up by email or roll number.
pub async fn fetch_student(pool: &PgPool, key: &str) -> anyhow::Result<StudentProfile> {
    let row = sqlx::query(
        r#"
        SELECT id, full_name, email, roll_no, attendance_percentage
        FROM academic_risk.students
        WHERE email = $1 OR roll_no = $1
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| LookupError::StudentNotFound {
        key: key.to_string(),
    })?;

    load_profile(pool, student_from_row(&row)?).await
}

pub async fn fetch_all_students(pool: &PgPool) -> anyhow::Result<Vec<StudentProfile>> {
    let rows = sqlx::query(
        r#"
        SELECT id, full_name, email, roll_no, attendance_percentage
        FROM academic_risk.students
        ORDER BY roll_no
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut profiles = Vec::with_capacity(rows.len());
    for row in rows {
        profiles.push(load_profile(pool, student_from_row(&row)?).await?);
    }

    Ok(profiles)
}

/// Stored snapshots for a student, oldest first.
pub async fn fetch_history(pool: &PgPool, student_id: Uuid) -> anyhow::Result<Vec<PerformanceSnapshot>> {
    let rows = sqlx::query(
        r#"
        SELECT attendance_percentage, assignment_average, exam_average
        FROM academic_risk.performance_snapshots
        WHERE student_id = $1
        ORDER BY recorded_at ASC, source_key ASC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    let mut history = Vec::with_capacity(rows.len());
    for row in rows {
        history.push(PerformanceSnapshot::from_averages(
            row.try_get("attendance_percentage")?,
            row.try_get("assignment_average")?,
            row.try_get("exam_average")?,
        ));
    }

    Ok(history)
}

/// Latest assessment per student; a newer write replaces the older one.
pub async fn upsert_prediction(
    pool: &PgPool,
    student_id: Uuid,
    assessment: &RiskAssessment,
    predicted_at: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO academic_risk.risk_predictions
        (student_id, risk_score, risk_level, factors, recommendations, predicted_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (student_id) DO UPDATE
        SET risk_score = EXCLUDED.risk_score,
            risk_level = EXCLUDED.risk_level,
            factors = EXCLUDED.factors,
            recommendations = EXCLUDED.recommendations,
            predicted_at = EXCLUDED.predicted_at
        "#,
    )
    .bind(student_id)
    .bind(assessment.score)
    .bind(assessment.level.as_str())
    .bind(Json(&assessment.factors))
    .bind(Json(&assessment.recommendations))
    .bind(predicted_at)
    .execute(pool)
    .await
    .with_context(|| format!("failed to store risk prediction for {student_id}"))?;

    tracing::info!(
        %student_id,
        score = assessment.score,
        level = assessment.level.as_str(),
        "risk prediction stored"
    );
    Ok(())
}

/// One CSV row after coercion, ready to store.
#[derive(Debug, Clone)]
pub struct ImportedSnapshot {
    pub full_name: String,
    pub email: String,
    pub roll_no: String,
    pub recorded_at: NaiveDate,
    pub snapshot: PerformanceSnapshot,
    pub source_key: Option<String>,
}

/// Parses snapshot rows, coercing numeric cells and ordering by
/// `recorded_at` so the newest attendance is written last.
pub fn parse_snapshot_rows<R: std::io::Read>(input: R) -> anyhow::Result<Vec<ImportedSnapshot>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        roll_no: String,
        recorded_at: NaiveDate,
        attendance: Option<String>,
        assignment_average: Option<String>,
        exam_average: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_reader(input);
    let mut rows = Vec::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let snapshot = PerformanceSnapshot::from_raw(&RawSnapshot {
            attendance: row.attendance,
            assignment_marks: vec![row.assignment_average],
            exam_scores: vec![row.exam_average],
        });

        rows.push(ImportedSnapshot {
            full_name: row.full_name,
            email: row.email,
            roll_no: row.roll_no,
            recorded_at: row.recorded_at,
            snapshot,
            source_key: row.source_key,
        });
    }

    rows.sort_by_key(|row| row.recorded_at);
    Ok(rows)
}

pub fn read_snapshot_rows(csv_path: &std::path::Path) -> anyhow::Result<Vec<ImportedSnapshot>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    parse_snapshot_rows(file).with_context(|| format!("failed to parse {}", csv_path.display()))
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let rows = read_snapshot_rows(csv_path)?;
    let mut inserted = 0usize;

    for row in rows {
        let student_id = upsert_student(
            pool,
            &row.full_name,
            &row.email,
            &row.roll_no,
            row.snapshot.attendance_percent(),
        )
        .await?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        if insert_snapshot(pool, student_id, row.recorded_at, &row.snapshot, &source_key).await? {
            inserted += 1;
        }
    }

    tracing::info!(inserted, path = %csv_path.display(), "snapshot import finished");
    Ok(inserted)
}
