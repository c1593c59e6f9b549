use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// A study period ("etapa") of one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPeriod {
    pub id: Uuid,
    pub name: String,
    pub number: i32,
    pub class_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active: bool,
}

impl StudyPeriod {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.start_date >= self.end_date {
            return Err(StoreError::invalid_row(
                "study_periods",
                format!(
                    "period {} starts on {} but ends on {}",
                    self.id, self.start_date, self.end_date
                ),
            ));
        }
        Ok(())
    }

    pub fn window(&self) -> PeriodWindow {
        PeriodWindow::covering(self.start_date, self.end_date)
    }

    pub fn reference(&self) -> PeriodRef {
        PeriodRef {
            id: self.id,
            number: self.number,
            name: self.name.clone(),
        }
    }
}

/// Half-open timestamp range covering every instant of a period's calendar
/// days, including the whole end day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub starts_at: DateTime<Utc>,
    pub ends_before: DateTime<Utc>,
}

impl PeriodWindow {
    pub fn covering(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let day_after = end_date.succ_opt().unwrap_or(NaiveDate::MAX);
        Self {
            start_date,
            end_date,
            starts_at: start_date.and_time(NaiveTime::MIN).and_utc(),
            ends_before: day_after.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.starts_at && at < self.ends_before
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub email: String,
    pub name: String,
    pub class_code: String,
    pub active: bool,
}

/// One lesson recorded in the class diary.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSession {
    pub id: Uuid,
    pub class_code: String,
    pub session_date: NaiveDate,
    pub content: Option<String>,
    pub notes: Option<String>,
    pub period_id: Uuid,
    pub teacher_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub session_id: Uuid,
    pub student_email: String,
    pub present: bool,
    pub participated: bool,
    pub note: Option<String>,
}

/// A live class held online. Has no participation concept.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualSession {
    pub id: Uuid,
    pub title: String,
    pub session_date: NaiveDate,
    pub authorized_classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VirtualAttendance {
    pub session_id: Uuid,
    pub student_email: String,
    pub entered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionSource {
    Essay,
    SimulatedEssay,
    Exercise,
    Radar,
}

impl SubmissionSource {
    pub fn table(self) -> &'static str {
        match self {
            SubmissionSource::Essay => "essays",
            SubmissionSource::SimulatedEssay => "simulated_essays",
            SubmissionSource::Exercise => "exercise_submissions",
            SubmissionSource::Radar => "radar_exercises",
        }
    }
}

/// Essay, simulated essay, exercise or radar row.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: Uuid,
    pub student_email: String,
    pub submitted_at: DateTime<Utc>,
    pub score: Option<f64>,
    pub returned: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Submission {
    /// Returned ("devolvida") and soft-deleted rows never count.
    pub fn is_delivered(&self) -> bool {
        !self.returned && self.deleted_at.is_none()
    }

    pub fn graded_score(&self) -> Option<f64> {
        match self.score {
            Some(score) if self.is_delivered() && score > 0.0 => Some(score),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhiteboardResponse {
    pub id: Uuid,
    pub student_email: String,
    pub submitted_at: DateTime<Utc>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InPersonEvaluation {
    pub student_email: String,
    pub period_id: Uuid,
    pub score: f64,
    pub notes: Option<String>,
}

/// Data sources that feed a gradebook entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySource {
    Diary,
    VirtualAttendance,
    Essays,
    SimulatedEssays,
    Whiteboard,
    Exercises,
    Radar,
    InPersonEvaluation,
}

impl From<SubmissionSource> for ActivitySource {
    fn from(source: SubmissionSource) -> Self {
        match source {
            SubmissionSource::Essay => ActivitySource::Essays,
            SubmissionSource::SimulatedEssay => ActivitySource::SimulatedEssays,
            SubmissionSource::Exercise => ActivitySource::Exercises,
            SubmissionSource::Radar => ActivitySource::Radar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRef {
    pub id: Uuid,
    pub number: i32,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceStats {
    pub total_sessions: usize,
    pub present: usize,
    pub percentage: f64,
    pub diary_sessions: usize,
    pub virtual_sessions: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipationStats {
    pub total: usize,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub count: usize,
    pub mean: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseStats {
    pub count: usize,
    pub from_exercises: usize,
    pub from_radar: usize,
}

/// Computed gradebook line for one student in one period. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradebookEntry {
    pub student_email: String,
    pub student_name: String,
    pub period: PeriodRef,
    pub attendance: AttendanceStats,
    pub participation: ParticipationStats,
    pub essays: ScoreStats,
    pub simulated_exams: ScoreStats,
    pub whiteboard: ScoreStats,
    pub exercises: ExerciseStats,
    pub in_person_score: Option<f64>,
    pub online_average: f64,
    pub final_grade: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_sources: Vec<ActivitySource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassStatistics {
    pub total_students: usize,
    pub mean_attendance: f64,
    pub mean_participation: f64,
    pub mean_final_grade: f64,
    pub total_essays: usize,
    pub total_simulated_exams: usize,
    pub total_exercises: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub period: StudyPeriod,
    pub students: Vec<GradebookEntry>,
    pub statistics: ClassStatistics,
}
