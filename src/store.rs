//! The data-access seam between the engine and persistence.
//!
//! Every read takes a slice of student emails so that one method serves both
//! a single student and a whole roster in one round-trip.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{
    AttendanceRecord, ClassSession, InPersonEvaluation, PeriodWindow, Student, StudyPeriod,
    Submission, SubmissionSource, VirtualAttendance, VirtualSession, WhiteboardResponse,
};

#[allow(async_fn_in_trait)]
pub trait GradebookStore {
    /// Periods stored under any of `class_spellings`, ordered by number.
    async fn fetch_periods(
        &self,
        class_spellings: &[String],
        number: Option<i32>,
    ) -> StoreResult<Vec<StudyPeriod>>;

    /// Active students of the class, in no particular order.
    async fn fetch_roster(&self, class_spellings: &[String]) -> StoreResult<Vec<Student>>;

    async fn fetch_student(&self, email: &str) -> StoreResult<Option<Student>>;

    async fn fetch_sessions(
        &self,
        period_id: Uuid,
        class_spellings: &[String],
    ) -> StoreResult<Vec<ClassSession>>;

    async fn fetch_attendance(
        &self,
        session_ids: &[Uuid],
        emails: &[String],
    ) -> StoreResult<Vec<AttendanceRecord>>;

    /// Virtual sessions dated within `[start, end]` whose authorized classes
    /// include any of `authorized_any`.
    async fn fetch_virtual_sessions(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        authorized_any: &[String],
    ) -> StoreResult<Vec<VirtualSession>>;

    /// Entries with a recorded entry timestamp only.
    async fn fetch_virtual_attendance(
        &self,
        session_ids: &[Uuid],
        emails: &[String],
    ) -> StoreResult<Vec<VirtualAttendance>>;

    /// Raw rows in the window, unfiltered by returned/deleted/score.
    async fn fetch_submissions(
        &self,
        source: SubmissionSource,
        emails: &[String],
        window: &PeriodWindow,
    ) -> StoreResult<Vec<Submission>>;

    async fn fetch_whiteboard(
        &self,
        emails: &[String],
        window: &PeriodWindow,
    ) -> StoreResult<Vec<WhiteboardResponse>>;

    async fn fetch_evaluations(
        &self,
        period_id: Uuid,
        emails: &[String],
    ) -> StoreResult<Vec<InPersonEvaluation>>;

    /// Insert or replace the record for `(session_id, student_email)`.
    async fn upsert_attendance(&self, record: &AttendanceRecord) -> StoreResult<()>;

    /// Insert or replace the evaluation for `(student_email, period_id)`.
    async fn upsert_evaluation(&self, evaluation: &InPersonEvaluation) -> StoreResult<()>;
}
