use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use academic_risk::config::Settings;
use academic_risk::errors::LookupError;
use academic_risk::models::StudentRisk;
use academic_risk::{db, report, subject, RiskEngine};

#[derive(Parser)]
#[command(name = "academic-risk")]
#[command(about = "Academic risk early warning for student performance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import performance snapshots from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Assess a student's current risk
    Assess {
        /// Email or roll number
        #[arg(long)]
        student: String,
        #[arg(long)]
        json: bool,
        /// Skip storing the assessment
        #[arg(long)]
        no_save: bool,
    },
    /// Classify a student's risk trend over stored snapshots
    Trend {
        #[arg(long)]
        student: String,
        #[arg(long)]
        json: bool,
    },
    /// Per-subject risk breakdown
    Subjects {
        #[arg(long)]
        student: String,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report across all students
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await
        .context("failed to connect to Postgres")?;

    let engine = RiskEngine::new();

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} snapshots from {}.", csv.display());
        }
        Commands::Assess {
            student,
            json,
            no_save,
        } => {
            let profile = db::fetch_student(&pool, &student).await?;
            let history = db::fetch_history(&pool, profile.student.id).await?;
            let risk = engine.assess_student(&profile, &history);

            if !no_save {
                db::upsert_prediction(&pool, risk.student.id, &risk.assessment, chrono::Utc::now())
                    .await?;
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&risk)?);
            } else {
                print_assessment(&risk);
            }
        }
        Commands::Trend { student, json } => {
            let profile = db::fetch_student(&pool, &student).await?;
            let history = db::fetch_history(&pool, profile.student.id).await?;
            if history.is_empty() {
                return Err(LookupError::NoHistory { key: student }.into());
            }

            let result = engine.trend(&history);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "{} is {} across {} snapshots (change rate {:.1}%).",
                    profile.student.full_name,
                    result.trend.as_str(),
                    history.len(),
                    result.change_rate * 100.0
                );
            }
        }
        Commands::Subjects { student, json } => {
            let profile = db::fetch_student(&pool, &student).await?;
            let risks = subject::analyze_subjects(&profile.subjects);

            if json {
                println!("{}", serde_json::to_string_pretty(&risks)?);
            } else if risks.is_empty() {
                println!("No subjects recorded for {}.", profile.student.full_name);
            } else {
                println!("Subject risk for {}:", profile.student.full_name);
                for risk in &risks {
                    println!(
                        "- {} ({}) {} risk, score {:.2}: {}",
                        risk.subject,
                        risk.code,
                        risk.level,
                        risk.score,
                        risk.notes.join(", ")
                    );
                }
            }
        }
        Commands::Report { out, limit } => {
            let profiles = db::fetch_all_students(&pool).await?;
            let mut students = Vec::with_capacity(profiles.len());
            for profile in &profiles {
                let history = db::fetch_history(&pool, profile.student.id).await?;
                students.push(engine.assess_student(profile, &history));
            }

            let output = report::build_report(chrono::Utc::now().date_naive(), &students, limit);
            std::fs::write(&out, output)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn print_assessment(risk: &StudentRisk) {
    let assessment = &risk.assessment;
    println!(
        "{} ({}) {} risk, score {:.3} from average marks {:.1}",
        risk.student.full_name,
        risk.student.roll_no,
        assessment.level,
        assessment.score,
        assessment.average_marks
    );
    println!(
        "Factors: attendance {:.2}, assignment {:.2}, exam {:.2}",
        assessment.factors.attendance_risk,
        assessment.factors.assignment_risk,
        assessment.factors.exam_risk
    );
    println!(
        "Trend: {} (change rate {:.1}%)",
        risk.trend.trend.as_str(),
        risk.trend.change_rate * 100.0
    );
    println!("Recommendations:");
    for recommendation in &assessment.recommendations {
        println!("- {}", recommendation);
    }
}
