use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cohort_gradebook::config::{DatabaseArgs, EngineArgs, EngineConfig};
use cohort_gradebook::db::{self, PgStore};
use cohort_gradebook::engine::Gradebook;
use cohort_gradebook::models::{AttendanceRecord, InPersonEvaluation};
use cohort_gradebook::report;
use cohort_gradebook::store::GradebookStore;
use cohort_gradebook::turma::class_spellings;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "cohort-gradebook")]
#[command(about = "Class diary and gradebook aggregation", long_about = None)]
struct Cli {
    #[command(flatten)]
    database: DatabaseArgs,
    #[command(flatten)]
    engine: EngineArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import in-person evaluations from a CSV file
    ImportEvaluations {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show a student's gradebook for one or every period
    Student {
        #[arg(long)]
        email: String,
        #[arg(long)]
        class: String,
        #[arg(long)]
        period: Option<i32>,
        #[arg(long)]
        json: bool,
    },
    /// Show the gradebook of a whole class for one period
    Class {
        #[arg(long)]
        class: String,
        #[arg(long)]
        period: i32,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown class report
    Report {
        #[arg(long)]
        class: String,
        #[arg(long)]
        period: i32,
        #[arg(long, default_value = "gradebook.md")]
        out: PathBuf,
    },
    /// Record presence and participation for one diary session
    RecordAttendance {
        #[arg(long)]
        class: String,
        #[arg(long)]
        period: i32,
        #[arg(long)]
        session: Uuid,
        #[arg(long)]
        email: String,
        #[arg(long)]
        present: bool,
        #[arg(long)]
        participated: bool,
        #[arg(long)]
        note: Option<String>,
    },
    /// Record a student's in-person evaluation for a period
    SetEvaluation {
        #[arg(long)]
        class: String,
        #[arg(long)]
        period: i32,
        #[arg(long)]
        email: String,
        #[arg(long)]
        score: f64,
        #[arg(long)]
        notes: Option<String>,
    },
}

async fn find_period(
    gradebook: &Gradebook<PgStore>,
    class: &str,
    number: i32,
) -> anyhow::Result<cohort_gradebook::models::StudyPeriod> {
    gradebook
        .store()
        .fetch_periods(&class_spellings(class), Some(number))
        .await?
        .into_iter()
        .next()
        .with_context(|| format!("class {class} has no period {number}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let pool = PgPoolOptions::new()
        .max_connections(cli.database.max_connections)
        .connect(&cli.database.database_url)
        .await
        .context("failed to connect to Postgres")?;
    let gradebook = Gradebook::new(PgStore::new(pool.clone()), EngineConfig::from(&cli.engine));

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportEvaluations { csv } => {
            let outcome = db::import_evaluations(&gradebook, &csv).await?;
            println!(
                "Saved {} evaluations from {} ({} skipped for unknown periods).",
                outcome.saved,
                csv.display(),
                outcome.unknown_period
            );
        }
        Commands::Student {
            email,
            class,
            period,
            json,
        } => {
            let entries = gradebook.student_gradebook(&email, &class, period).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No periods found for class {class}.");
            } else {
                println!("Gradebook for {}:", entries[0].student_name);
                for entry in &entries {
                    println!("{}", report::student_line(entry));
                }
            }
        }
        Commands::Class {
            class,
            period,
            json,
        } => {
            let summary = gradebook.class_summary(&class, period).await?;
            match summary {
                Some(summary) if json => {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
                Some(summary) => {
                    let stats = &summary.statistics;
                    println!(
                        "{} ({} students): attendance {:.2}%, participation {:.2}%, final {:.2}",
                        summary.period.name,
                        stats.total_students,
                        stats.mean_attendance,
                        stats.mean_participation,
                        stats.mean_final_grade
                    );
                    for entry in &summary.students {
                        println!(
                            "- {} ({}) final {:.2}",
                            entry.student_name, entry.student_email, entry.final_grade
                        );
                    }
                }
                None => println!("Class {class} has no period {period} yet."),
            }
        }
        Commands::Report { class, period, out } => {
            let Some(summary) = gradebook.class_summary(&class, period).await? else {
                println!("Class {class} has no period {period} yet.");
                return Ok(());
            };
            let report = report::build_report(&class, &summary);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::RecordAttendance {
            class,
            period,
            session,
            email,
            present,
            participated,
            note,
        } => {
            let period = find_period(&gradebook, &class, period).await?;
            gradebook
                .record_attendance(
                    &period,
                    &AttendanceRecord {
                        session_id: session,
                        student_email: email,
                        present,
                        participated,
                        note,
                    },
                )
                .await?;
            println!("Attendance saved.");
        }
        Commands::SetEvaluation {
            class,
            period,
            email,
            score,
            notes,
        } => {
            let period = find_period(&gradebook, &class, period).await?;
            gradebook
                .record_evaluation(
                    &period,
                    &InPersonEvaluation {
                        student_email: email,
                        period_id: period.id,
                        score,
                        notes,
                    },
                )
                .await?;
            println!("Evaluation saved.");
        }
    }

    Ok(())
}
