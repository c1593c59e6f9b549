use tracing::{info, warn};

use crate::aggregate::student_entry;
use crate::cache::{ClassKey, GradebookCache, StudentKey};
use crate::config::EngineConfig;
use crate::error::GradebookError;
use crate::grade::is_valid_grade;
use crate::models::{
    AttendanceRecord, ClassSummary, GradebookEntry, InPersonEvaluation, StudyPeriod,
};
use crate::store::GradebookStore;
use crate::summary;
use crate::turma::{canonical_code, class_spellings};

/// Read-and-compute gradebook over a [`GradebookStore`], with an explicit
/// result cache.
pub struct Gradebook<S> {
    store: S,
    config: EngineConfig,
    cache: GradebookCache,
}

impl<S: GradebookStore> Gradebook<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        let cache = GradebookCache::new(config.cache_ttl);
        Self {
            store,
            config,
            cache,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &GradebookCache {
        &self.cache
    }

    /// One entry per matching period of the class, in period order.
    pub async fn student_gradebook(
        &self,
        student_email: &str,
        class_code: &str,
        period_number: Option<i32>,
    ) -> Result<Vec<GradebookEntry>, GradebookError> {
        let key = StudentKey {
            email: student_email.to_string(),
            class_code: canonical_code(class_code),
            period_number,
        };
        let seen = self.cache.student_generation();
        if let Some(entries) = self.cache.student(&key) {
            return Ok(entries);
        }

        let spellings = class_spellings(class_code);
        let (periods, profile) = tokio::join!(
            self.store.fetch_periods(&spellings, period_number),
            self.store.fetch_student(student_email),
        );
        let periods = periods.map_err(|source| GradebookError::Periods {
            class_code: class_code.to_string(),
            source,
        })?;
        let student_name = match profile {
            Ok(Some(student)) => student.name,
            Ok(None) => student_email.to_string(),
            Err(err) => {
                warn!(email = student_email, error = %err, "student profile unavailable");
                student_email.to_string()
            }
        };

        let mut entries = Vec::with_capacity(periods.len());
        for period in &periods {
            entries.push(
                student_entry(
                    &self.store,
                    &self.config,
                    &spellings,
                    period,
                    student_email,
                    &student_name,
                )
                .await,
            );
        }

        self.cache.store_student(key, entries.clone(), seen);
        Ok(entries)
    }

    pub async fn class_summary(
        &self,
        class_code: &str,
        period_number: i32,
    ) -> Result<Option<ClassSummary>, GradebookError> {
        let key = ClassKey {
            class_code: canonical_code(class_code),
            period_number,
        };
        let seen = self.cache.class_generation();
        if let Some(summary) = self.cache.class(&key) {
            return Ok(summary);
        }

        let summary =
            summary::class_summary(&self.store, &self.config, class_code, period_number).await?;
        self.cache.store_class(key, summary.clone(), seen);
        Ok(summary)
    }

    pub async fn record_attendance(
        &self,
        period: &StudyPeriod,
        record: &AttendanceRecord,
    ) -> Result<(), GradebookError> {
        self.store
            .upsert_attendance(record)
            .await
            .map_err(|source| GradebookError::Write {
                what: "attendance record",
                source,
            })?;
        info!(
            session = %record.session_id,
            email = %record.student_email,
            present = record.present,
            participated = record.participated,
            "attendance recorded"
        );
        self.invalidate(period, &record.student_email);
        Ok(())
    }

    pub async fn record_evaluation(
        &self,
        period: &StudyPeriod,
        evaluation: &InPersonEvaluation,
    ) -> Result<(), GradebookError> {
        if !is_valid_grade(evaluation.score) {
            return Err(GradebookError::InvalidScore {
                score: evaluation.score,
            });
        }
        self.store
            .upsert_evaluation(evaluation)
            .await
            .map_err(|source| GradebookError::Write {
                what: "in-person evaluation",
                source,
            })?;
        info!(
            period = %evaluation.period_id,
            email = %evaluation.student_email,
            score = evaluation.score,
            "in-person evaluation recorded"
        );
        self.invalidate(period, &evaluation.student_email);
        Ok(())
    }

    fn invalidate(&self, period: &StudyPeriod, student_email: &str) {
        let class_code = canonical_code(&period.class_code);
        self.cache
            .invalidate_student_period(student_email, &class_code, period.number);
        self.cache.invalidate_class_period(&class_code, period.number);
    }
}
