use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    AttendanceRecord, ClassSession, InPersonEvaluation, PeriodWindow, Student, StudyPeriod,
    Submission, SubmissionSource, VirtualAttendance, VirtualSession, WhiteboardResponse,
};
use crate::store::GradebookStore;
use crate::turma::class_spellings;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// [`GradebookStore`] over the `gradebook` Postgres schema.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn finite_score(table: &str, score: Option<f64>) -> StoreResult<Option<f64>> {
    match score {
        Some(value) if !value.is_finite() => Err(StoreError::invalid_row(
            table,
            format!("score {value} is not a number"),
        )),
        other => Ok(other),
    }
}

fn period_from_row(row: &PgRow) -> StoreResult<StudyPeriod> {
    let period = StudyPeriod {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        number: row.try_get("number")?,
        class_code: row.try_get("class_code")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        active: row.try_get("active")?,
    };
    period.validate()?;
    Ok(period)
}

fn student_from_row(row: &PgRow) -> StoreResult<Student> {
    Ok(Student {
        email: row.try_get("email")?,
        name: row.try_get("full_name")?,
        class_code: row.try_get("class_code")?,
        active: row.try_get("active")?,
    })
}

fn submission_from_row(table: &str, row: &PgRow) -> StoreResult<Submission> {
    Ok(Submission {
        id: row.try_get("id")?,
        student_email: row.try_get("student_email")?,
        submitted_at: row.try_get("submitted_at")?,
        score: finite_score(table, row.try_get("score")?)?,
        returned: row.try_get("returned")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

impl GradebookStore for PgStore {
    async fn fetch_periods(
        &self,
        class_spellings: &[String],
        number: Option<i32>,
    ) -> StoreResult<Vec<StudyPeriod>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, number, class_code, start_date, end_date, active
            FROM gradebook.study_periods
            WHERE class_code = ANY($1)
              AND ($2::int4 IS NULL OR number = $2)
            ORDER BY number
            "#,
        )
        .bind(class_spellings)
        .bind(number)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(period_from_row).collect()
    }

    async fn fetch_roster(&self, class_spellings: &[String]) -> StoreResult<Vec<Student>> {
        let rows = sqlx::query(
            r#"
            SELECT email, full_name, class_code, active
            FROM gradebook.students
            WHERE class_code = ANY($1) AND active
            "#,
        )
        .bind(class_spellings)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(student_from_row).collect()
    }

    async fn fetch_student(&self, email: &str) -> StoreResult<Option<Student>> {
        let row = sqlx::query(
            "SELECT email, full_name, class_code, active FROM gradebook.students WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(student_from_row).transpose()
    }

    async fn fetch_sessions(
        &self,
        period_id: Uuid,
        class_spellings: &[String],
    ) -> StoreResult<Vec<ClassSession>> {
        let rows = sqlx::query(
            r#"
            SELECT id, class_code, session_date, content, notes, period_id, teacher_id
            FROM gradebook.class_sessions
            WHERE period_id = $1 AND class_code = ANY($2)
            ORDER BY session_date, id
            "#,
        )
        .bind(period_id)
        .bind(class_spellings)
        .fetch_all(&self.pool)
        .await?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            sessions.push(ClassSession {
                id: row.try_get("id")?,
                class_code: row.try_get("class_code")?,
                session_date: row.try_get("session_date")?,
                content: row.try_get("content")?,
                notes: row.try_get("notes")?,
                period_id: row.try_get("period_id")?,
                teacher_id: row.try_get("teacher_id")?,
            });
        }
        Ok(sessions)
    }

    async fn fetch_attendance(
        &self,
        session_ids: &[Uuid],
        emails: &[String],
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT session_id, student_email, present, participated, note
            FROM gradebook.attendance_records
            WHERE session_id = ANY($1) AND student_email = ANY($2)
            "#,
        )
        .bind(session_ids)
        .bind(emails)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(AttendanceRecord {
                session_id: row.try_get("session_id")?,
                student_email: row.try_get("student_email")?,
                present: row.try_get("present")?,
                participated: row.try_get("participated")?,
                note: row.try_get("note")?,
            });
        }
        Ok(records)
    }

    async fn fetch_virtual_sessions(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        authorized_any: &[String],
    ) -> StoreResult<Vec<VirtualSession>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, session_date, authorized_classes
            FROM gradebook.virtual_sessions
            WHERE session_date BETWEEN $1 AND $2
              AND authorized_classes && $3
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(authorized_any)
        .fetch_all(&self.pool)
        .await?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            sessions.push(VirtualSession {
                id: row.try_get("id")?,
                title: row.try_get("title")?,
                session_date: row.try_get("session_date")?,
                authorized_classes: row.try_get("authorized_classes")?,
            });
        }
        Ok(sessions)
    }

    async fn fetch_virtual_attendance(
        &self,
        session_ids: &[Uuid],
        emails: &[String],
    ) -> StoreResult<Vec<VirtualAttendance>> {
        let rows = sqlx::query(
            r#"
            SELECT session_id, student_email, entered_at
            FROM gradebook.virtual_attendance
            WHERE session_id = ANY($1)
              AND student_email = ANY($2)
              AND entered_at IS NOT NULL
            "#,
        )
        .bind(session_ids)
        .bind(emails)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(VirtualAttendance {
                session_id: row.try_get("session_id")?,
                student_email: row.try_get("student_email")?,
                entered_at: row.try_get("entered_at")?,
            });
        }
        Ok(entries)
    }

    async fn fetch_submissions(
        &self,
        source: SubmissionSource,
        emails: &[String],
        window: &PeriodWindow,
    ) -> StoreResult<Vec<Submission>> {
        let table = source.table();
        let query = format!(
            "SELECT id, student_email, submitted_at, score, returned, deleted_at \
             FROM gradebook.{table} \
             WHERE student_email = ANY($1) AND submitted_at >= $2 AND submitted_at < $3 \
             ORDER BY submitted_at, id"
        );
        let rows = sqlx::query(&query)
            .bind(emails)
            .bind(window.starts_at)
            .bind(window.ends_before)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| submission_from_row(table, row))
            .collect()
    }

    async fn fetch_whiteboard(
        &self,
        emails: &[String],
        window: &PeriodWindow,
    ) -> StoreResult<Vec<WhiteboardResponse>> {
        let rows = sqlx::query(
            r#"
            SELECT id, student_email, submitted_at, score
            FROM gradebook.whiteboard_responses
            WHERE student_email = ANY($1) AND submitted_at >= $2 AND submitted_at < $3
            ORDER BY submitted_at, id
            "#,
        )
        .bind(emails)
        .bind(window.starts_at)
        .bind(window.ends_before)
        .fetch_all(&self.pool)
        .await?;

        let mut responses = Vec::with_capacity(rows.len());
        for row in rows {
            responses.push(WhiteboardResponse {
                id: row.try_get("id")?,
                student_email: row.try_get("student_email")?,
                submitted_at: row.try_get("submitted_at")?,
                score: finite_score("whiteboard_responses", row.try_get("score")?)?,
            });
        }
        Ok(responses)
    }

    async fn fetch_evaluations(
        &self,
        period_id: Uuid,
        emails: &[String],
    ) -> StoreResult<Vec<InPersonEvaluation>> {
        let rows = sqlx::query(
            r#"
            SELECT student_email, period_id, score, notes
            FROM gradebook.in_person_evaluations
            WHERE period_id = $1 AND student_email = ANY($2)
            "#,
        )
        .bind(period_id)
        .bind(emails)
        .fetch_all(&self.pool)
        .await?;

        let mut evaluations = Vec::with_capacity(rows.len());
        for row in rows {
            let score: f64 = row.try_get("score")?;
            evaluations.push(InPersonEvaluation {
                student_email: row.try_get("student_email")?,
                period_id: row.try_get("period_id")?,
                score: finite_score("in_person_evaluations", Some(score))?.unwrap_or(0.0),
                notes: row.try_get("notes")?,
            });
        }
        Ok(evaluations)
    }

    async fn upsert_attendance(&self, record: &AttendanceRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO gradebook.attendance_records
            (session_id, student_email, present, participated, note)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (session_id, student_email) DO UPDATE
            SET present = EXCLUDED.present,
                participated = EXCLUDED.participated,
                note = EXCLUDED.note
            "#,
        )
        .bind(record.session_id)
        .bind(&record.student_email)
        .bind(record.present)
        .bind(record.participated)
        .bind(&record.note)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_evaluation(&self, evaluation: &InPersonEvaluation) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO gradebook.in_person_evaluations
            (student_email, period_id, score, notes)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (student_email, period_id) DO UPDATE
            SET score = EXCLUDED.score, notes = EXCLUDED.notes
            "#,
        )
        .bind(&evaluation.student_email)
        .bind(evaluation.period_id)
        .bind(evaluation.score)
        .bind(&evaluation.notes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let period_id = Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?;
    let start = NaiveDate::from_ymd_opt(2026, 2, 2).context("invalid date")?;
    let end = NaiveDate::from_ymd_opt(2026, 4, 30).context("invalid date")?;

    sqlx::query(
        r#"
        INSERT INTO gradebook.study_periods
        (id, name, number, class_code, start_date, end_date, active)
        VALUES ($1, $2, $3, $4, $5, $6, true)
        ON CONFLICT (class_code, number) DO UPDATE
        SET name = EXCLUDED.name, start_date = EXCLUDED.start_date, end_date = EXCLUDED.end_date
        "#,
    )
    .bind(period_id)
    .bind("1ª Etapa")
    .bind(1)
    .bind("C")
    .bind(start)
    .bind(end)
    .execute(pool)
    .await?;

    let students = vec![
        ("ana.souza@escola.com", "Ana Souza", "C"),
        ("bruno.lima@escola.com", "Bruno Lima", "TURMA C"),
        ("carla.mendes@escola.com", "Carla Mendes", "Turma C"),
    ];
    for (email, name, class_code) in &students {
        sqlx::query(
            r#"
            INSERT INTO gradebook.students (email, full_name, class_code, active)
            VALUES ($1, $2, $3, true)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, class_code = EXCLUDED.class_code
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(class_code)
        .execute(pool)
        .await?;
    }

    let sessions = [
        ("5b0f9a8e-3f63-4d7a-9c59-0d5cf1d1a001", 3, "Dissertação: estrutura"),
        ("5b0f9a8e-3f63-4d7a-9c59-0d5cf1d1a002", 10, "Repertório sociocultural"),
        ("5b0f9a8e-3f63-4d7a-9c59-0d5cf1d1a003", 17, "Proposta de intervenção"),
    ];
    for (index, (id, day, content)) in sessions.iter().enumerate() {
        let session_id = Uuid::parse_str(id)?;
        sqlx::query(
            r#"
            INSERT INTO gradebook.class_sessions
            (id, class_code, session_date, content, period_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(session_id)
        .bind("Turma C")
        .bind(NaiveDate::from_ymd_opt(2026, 2, *day).context("invalid date")?)
        .bind(content)
        .bind(period_id)
        .execute(pool)
        .await?;

        for (offset, (email, _, _)) in students.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO gradebook.attendance_records
                (session_id, student_email, present, participated)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (session_id, student_email) DO NOTHING
                "#,
            )
            .bind(session_id)
            .bind(email)
            .bind((index + offset) % 3 != 2)
            .bind((index + offset) % 2 == 0)
            .execute(pool)
            .await?;
        }
    }

    let essays: [(&str, &str, u32, f64); 4] = [
        ("7c1e1d7e-8f2b-4b11-9d4e-7f0a5b3c2001", "ana.souza@escola.com", 12, 760.0),
        ("7c1e1d7e-8f2b-4b11-9d4e-7f0a5b3c2002", "ana.souza@escola.com", 26, 820.0),
        ("7c1e1d7e-8f2b-4b11-9d4e-7f0a5b3c2003", "bruno.lima@escola.com", 14, 640.0),
        ("7c1e1d7e-8f2b-4b11-9d4e-7f0a5b3c2004", "carla.mendes@escola.com", 20, 900.0),
    ];
    for (id, email, day, score) in essays {
        let submitted_at: DateTime<Utc> = NaiveDate::from_ymd_opt(2026, 2, day)
            .and_then(|d| d.and_hms_opt(15, 0, 0))
            .context("invalid timestamp")?
            .and_utc();
        sqlx::query(
            r#"
            INSERT INTO gradebook.essays (id, student_email, submitted_at, score)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(Uuid::parse_str(id)?)
        .bind(email)
        .bind(submitted_at)
        .bind(score)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Summary of an evaluation CSV import.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub saved: usize,
    pub unknown_period: usize,
}

#[derive(Debug, serde::Deserialize)]
pub struct EvaluationCsvRow {
    pub student_email: String,
    pub class_code: String,
    pub period_number: i32,
    pub score: f64,
    pub notes: Option<String>,
}

pub fn read_evaluations(csv_path: &std::path::Path) -> anyhow::Result<Vec<EvaluationCsvRow>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<EvaluationCsvRow>().enumerate() {
        let row = result.with_context(|| format!("malformed row {}", index + 1))?;
        if !crate::grade::is_valid_grade(row.score) {
            anyhow::bail!(
                "row {} ({}): score {} is outside 0..=10",
                index + 1,
                row.student_email,
                row.score
            );
        }
        rows.push(row);
    }
    Ok(rows)
}

pub async fn import_evaluations(
    gradebook: &crate::engine::Gradebook<PgStore>,
    csv_path: &std::path::Path,
) -> anyhow::Result<ImportOutcome> {
    let rows = read_evaluations(csv_path)?;
    let mut outcome = ImportOutcome::default();

    for row in rows {
        let periods = gradebook
            .store()
            .fetch_periods(&class_spellings(&row.class_code), Some(row.period_number))
            .await?;
        let Some(period) = periods.into_iter().next() else {
            tracing::warn!(
                email = %row.student_email,
                class_code = %row.class_code,
                period_number = row.period_number,
                "skipping evaluation for unknown period"
            );
            outcome.unknown_period += 1;
            continue;
        };

        let notes = row.notes.filter(|n| !n.trim().is_empty());
        gradebook
            .record_evaluation(
                &period,
                &InPersonEvaluation {
                    student_email: row.student_email,
                    period_id: period.id,
                    score: row.score,
                    notes,
                },
            )
            .await?;
        outcome.saved += 1;
    }

    Ok(outcome)
}
