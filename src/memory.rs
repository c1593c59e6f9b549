//! In-process [`GradebookStore`] for tests and fixtures.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    ActivitySource, AttendanceRecord, ClassSession, InPersonEvaluation, PeriodWindow, Student,
    StudyPeriod, Submission, SubmissionSource, VirtualAttendance, VirtualSession,
    WhiteboardResponse,
};
use crate::store::GradebookStore;

#[derive(Debug, Clone, Default)]
pub struct MemoryData {
    pub periods: Vec<StudyPeriod>,
    pub students: Vec<Student>,
    pub sessions: Vec<ClassSession>,
    pub attendance: Vec<AttendanceRecord>,
    pub virtual_sessions: Vec<VirtualSession>,
    pub virtual_attendance: Vec<VirtualAttendance>,
    pub submissions: Vec<(SubmissionSource, Submission)>,
    pub whiteboard: Vec<WhiteboardResponse>,
    pub evaluations: Vec<InPersonEvaluation>,
}

/// Keeps rows in insertion order, counts calls per operation, and can be told
/// to fail every read that feeds a given source.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Mutex<HashSet<ActivitySource>>,
}

impl MemoryStore {
    pub fn new(data: MemoryData) -> Self {
        Self {
            data: RwLock::new(data),
            ..Self::default()
        }
    }

    pub fn fail_source(&self, source: ActivitySource) {
        self.failing.lock().insert(source);
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().get(operation).copied().unwrap_or(0)
    }

    fn enter(&self, operation: &'static str, source: Option<ActivitySource>) -> StoreResult<()> {
        *self.calls.lock().entry(operation).or_insert(0) += 1;
        match source {
            Some(source) if self.failing.lock().contains(&source) => {
                Err(StoreError::Injected(source))
            }
            _ => Ok(()),
        }
    }
}

fn includes(emails: &[String], email: &str) -> bool {
    emails.iter().any(|candidate| candidate == email)
}

impl GradebookStore for MemoryStore {
    async fn fetch_periods(
        &self,
        class_spellings: &[String],
        number: Option<i32>,
    ) -> StoreResult<Vec<StudyPeriod>> {
        self.enter("fetch_periods", None)?;
        let mut periods: Vec<StudyPeriod> = self
            .data
            .read()
            .periods
            .iter()
            .filter(|p| includes(class_spellings, &p.class_code))
            .filter(|p| number.map_or(true, |n| p.number == n))
            .cloned()
            .collect();
        periods.sort_by_key(|p| p.number);
        Ok(periods)
    }

    async fn fetch_roster(&self, class_spellings: &[String]) -> StoreResult<Vec<Student>> {
        self.enter("fetch_roster", None)?;
        Ok(self
            .data
            .read()
            .students
            .iter()
            .filter(|s| s.active && includes(class_spellings, &s.class_code))
            .cloned()
            .collect())
    }

    async fn fetch_student(&self, email: &str) -> StoreResult<Option<Student>> {
        self.enter("fetch_student", None)?;
        Ok(self
            .data
            .read()
            .students
            .iter()
            .find(|s| s.email == email)
            .cloned())
    }

    async fn fetch_sessions(
        &self,
        period_id: Uuid,
        class_spellings: &[String],
    ) -> StoreResult<Vec<ClassSession>> {
        self.enter("fetch_sessions", Some(ActivitySource::Diary))?;
        Ok(self
            .data
            .read()
            .sessions
            .iter()
            .filter(|s| s.period_id == period_id && includes(class_spellings, &s.class_code))
            .cloned()
            .collect())
    }

    async fn fetch_attendance(
        &self,
        session_ids: &[Uuid],
        emails: &[String],
    ) -> StoreResult<Vec<AttendanceRecord>> {
        self.enter("fetch_attendance", Some(ActivitySource::Diary))?;
        Ok(self
            .data
            .read()
            .attendance
            .iter()
            .filter(|r| session_ids.contains(&r.session_id) && includes(emails, &r.student_email))
            .cloned()
            .collect())
    }

    async fn fetch_virtual_sessions(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        authorized_any: &[String],
    ) -> StoreResult<Vec<VirtualSession>> {
        self.enter("fetch_virtual_sessions", Some(ActivitySource::VirtualAttendance))?;
        Ok(self
            .data
            .read()
            .virtual_sessions
            .iter()
            .filter(|s| s.session_date >= start && s.session_date <= end)
            .filter(|s| s.authorized_classes.iter().any(|c| includes(authorized_any, c)))
            .cloned()
            .collect())
    }

    async fn fetch_virtual_attendance(
        &self,
        session_ids: &[Uuid],
        emails: &[String],
    ) -> StoreResult<Vec<VirtualAttendance>> {
        self.enter("fetch_virtual_attendance", Some(ActivitySource::VirtualAttendance))?;
        Ok(self
            .data
            .read()
            .virtual_attendance
            .iter()
            .filter(|e| session_ids.contains(&e.session_id) && includes(emails, &e.student_email))
            .cloned()
            .collect())
    }

    async fn fetch_submissions(
        &self,
        source: SubmissionSource,
        emails: &[String],
        window: &PeriodWindow,
    ) -> StoreResult<Vec<Submission>> {
        self.enter("fetch_submissions", Some(source.into()))?;
        Ok(self
            .data
            .read()
            .submissions
            .iter()
            .filter(|(kind, _)| *kind == source)
            .map(|(_, submission)| submission)
            .filter(|s| includes(emails, &s.student_email) && window.contains(s.submitted_at))
            .cloned()
            .collect())
    }

    async fn fetch_whiteboard(
        &self,
        emails: &[String],
        window: &PeriodWindow,
    ) -> StoreResult<Vec<WhiteboardResponse>> {
        self.enter("fetch_whiteboard", Some(ActivitySource::Whiteboard))?;
        Ok(self
            .data
            .read()
            .whiteboard
            .iter()
            .filter(|r| includes(emails, &r.student_email) && window.contains(r.submitted_at))
            .cloned()
            .collect())
    }

    async fn fetch_evaluations(
        &self,
        period_id: Uuid,
        emails: &[String],
    ) -> StoreResult<Vec<InPersonEvaluation>> {
        self.enter("fetch_evaluations", Some(ActivitySource::InPersonEvaluation))?;
        Ok(self
            .data
            .read()
            .evaluations
            .iter()
            .filter(|e| e.period_id == period_id && includes(emails, &e.student_email))
            .cloned()
            .collect())
    }

    async fn upsert_attendance(&self, record: &AttendanceRecord) -> StoreResult<()> {
        self.enter("upsert_attendance", None)?;
        let mut data = self.data.write();
        match data.attendance.iter_mut().find(|r| {
            r.session_id == record.session_id && r.student_email == record.student_email
        }) {
            Some(existing) => *existing = record.clone(),
            None => data.attendance.push(record.clone()),
        }
        Ok(())
    }

    async fn upsert_evaluation(&self, evaluation: &InPersonEvaluation) -> StoreResult<()> {
        self.enter("upsert_evaluation", None)?;
        let mut data = self.data.write();
        match data.evaluations.iter_mut().find(|e| {
            e.period_id == evaluation.period_id && e.student_email == evaluation.student_email
        }) {
            Some(existing) => *existing = evaluation.clone(),
            None => data.evaluations.push(evaluation.clone()),
        }
        Ok(())
    }
}
