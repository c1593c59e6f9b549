//! Per-period aggregation: fetch every activity source for a set of students,
//! group the rows by student, and reduce each student's rows to a
//! [`GradebookEntry`].
//!
//! The same fetch serves one student or a whole roster; the class summary
//! relies on that to issue one query per source regardless of roster size.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::StoreResult;
use crate::grade::{
    clamp_grade, compute_final_grade, compute_online_average, mean, percentage,
    percentage_to_ten_scale, thousand_scale_to_ten_scale,
};
use crate::models::{
    ActivitySource, AttendanceRecord, AttendanceStats, ExerciseStats, GradebookEntry,
    InPersonEvaluation, ParticipationStats, PeriodWindow, ScoreStats, StudyPeriod, Submission,
    SubmissionSource, VirtualAttendance, WhiteboardResponse,
};
use crate::store::GradebookStore;

/// One student's rows for one period, already filtered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentActivity {
    pub diary_sessions: usize,
    pub diary_present: usize,
    pub diary_participated: usize,
    pub virtual_sessions: usize,
    pub virtual_present: usize,
    pub essay_scores: Vec<f64>,
    pub simulated_scores: Vec<f64>,
    pub whiteboard_scores: Vec<f64>,
    pub exercises: usize,
    pub radar: usize,
    pub in_person_score: Option<f64>,
    pub degraded: Vec<ActivitySource>,
}

/// Raw rows of every source for a set of students in one period.
#[derive(Debug, Default)]
pub struct PeriodSources {
    diary_sessions: usize,
    attendance: Vec<AttendanceRecord>,
    virtual_sessions: usize,
    virtual_entries: Vec<VirtualAttendance>,
    essays: Vec<Submission>,
    simulated: Vec<Submission>,
    exercises: Vec<Submission>,
    radar: Vec<Submission>,
    whiteboard: Vec<WhiteboardResponse>,
    evaluations: Vec<InPersonEvaluation>,
    degraded: Vec<ActivitySource>,
}

/// Authorized-class values that open a virtual session to this class.
pub fn virtual_audience(class_spellings: &[String], config: &EngineConfig) -> Vec<String> {
    let mut audience = class_spellings.to_vec();
    if let Some(marker) = &config.all_classes_marker {
        audience.push(marker.clone());
    }
    audience
}

async fn fetch_diary<S: GradebookStore>(
    store: &S,
    period_id: Uuid,
    class_spellings: &[String],
    emails: &[String],
) -> StoreResult<(usize, Vec<AttendanceRecord>)> {
    let sessions = store.fetch_sessions(period_id, class_spellings).await?;
    let ids: Vec<Uuid> = sessions
        .iter()
        .map(|s| s.id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    if ids.is_empty() {
        return Ok((0, Vec::new()));
    }
    let records = store.fetch_attendance(&ids, emails).await?;
    Ok((ids.len(), records))
}

async fn fetch_virtual<S: GradebookStore>(
    store: &S,
    window: &PeriodWindow,
    audience: &[String],
    emails: &[String],
) -> StoreResult<(usize, Vec<VirtualAttendance>)> {
    let sessions = store
        .fetch_virtual_sessions(window.start_date, window.end_date, audience)
        .await?;
    let ids: Vec<Uuid> = sessions
        .iter()
        .filter(|s| window.contains_date(s.session_date))
        .map(|s| s.id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    if ids.is_empty() {
        return Ok((0, Vec::new()));
    }
    let entries = store.fetch_virtual_attendance(&ids, emails).await?;
    Ok((ids.len(), entries))
}

fn settle<T: Default>(
    result: StoreResult<T>,
    source: ActivitySource,
    degraded: &mut Vec<ActivitySource>,
) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(?source, error = %err, "activity source unavailable, counting it as empty");
            degraded.push(source);
            T::default()
        }
    }
}

/// Fetches every source for `emails` concurrently. A failing source is logged
/// and contributes nothing; the others are still reported.
pub async fn fetch_period_sources<S: GradebookStore>(
    store: &S,
    config: &EngineConfig,
    class_spellings: &[String],
    period: &StudyPeriod,
    emails: &[String],
) -> PeriodSources {
    let window = period.window();
    let audience = virtual_audience(class_spellings, config);
    debug!(
        period = %period.id,
        students = emails.len(),
        "fetching period activity"
    );

    let (diary, virtual_attendance, essays, simulated, exercises, radar, whiteboard, evaluations) =
        tokio::join!(
            fetch_diary(store, period.id, class_spellings, emails),
            fetch_virtual(store, &window, &audience, emails),
            store.fetch_submissions(SubmissionSource::Essay, emails, &window),
            store.fetch_submissions(SubmissionSource::SimulatedEssay, emails, &window),
            store.fetch_submissions(SubmissionSource::Exercise, emails, &window),
            store.fetch_submissions(SubmissionSource::Radar, emails, &window),
            store.fetch_whiteboard(emails, &window),
            store.fetch_evaluations(period.id, emails),
        );

    let mut degraded = Vec::new();
    let (diary_sessions, attendance) = settle(diary, ActivitySource::Diary, &mut degraded);
    let (virtual_sessions, virtual_entries) = settle(
        virtual_attendance,
        ActivitySource::VirtualAttendance,
        &mut degraded,
    );

    PeriodSources {
        diary_sessions,
        attendance,
        virtual_sessions,
        virtual_entries,
        essays: settle(essays, ActivitySource::Essays, &mut degraded),
        simulated: settle(simulated, ActivitySource::SimulatedEssays, &mut degraded),
        exercises: settle(exercises, ActivitySource::Exercises, &mut degraded),
        radar: settle(radar, ActivitySource::Radar, &mut degraded),
        whiteboard: settle(whiteboard, ActivitySource::Whiteboard, &mut degraded),
        evaluations: settle(evaluations, ActivitySource::InPersonEvaluation, &mut degraded),
        degraded,
    }
}

/// Per-student slices of a [`PeriodSources`].
#[derive(Debug)]
pub struct GroupedActivity {
    template: StudentActivity,
    by_student: HashMap<String, StudentActivity>,
}

impl GroupedActivity {
    /// Removes and returns the student's activity; students without rows get
    /// only the period-wide session counts.
    pub fn take(&mut self, email: &str) -> StudentActivity {
        self.by_student
            .remove(email)
            .unwrap_or_else(|| self.template.clone())
    }

    fn slot(&mut self, email: &str) -> &mut StudentActivity {
        let template = &self.template;
        self.by_student
            .entry(email.to_string())
            .or_insert_with(|| template.clone())
    }
}

impl PeriodSources {
    pub fn group_by_student(self) -> GroupedActivity {
        let template = StudentActivity {
            diary_sessions: self.diary_sessions,
            virtual_sessions: self.virtual_sessions,
            degraded: self.degraded.clone(),
            ..StudentActivity::default()
        };
        let mut grouped = GroupedActivity {
            template,
            by_student: HashMap::new(),
        };

        // One record per (session, student); a later duplicate replaces an earlier one.
        let mut marks: HashMap<(Uuid, &str), (bool, bool)> = HashMap::new();
        for record in &self.attendance {
            marks.insert(
                (record.session_id, record.student_email.as_str()),
                (record.present, record.participated),
            );
        }
        for ((_, email), (present, participated)) in marks {
            let activity = grouped.slot(email);
            activity.diary_present += usize::from(present);
            activity.diary_participated += usize::from(participated);
        }

        let entered: HashSet<(Uuid, &str)> = self
            .virtual_entries
            .iter()
            .map(|e| (e.session_id, e.student_email.as_str()))
            .collect();
        for (_, email) in entered {
            grouped.slot(email).virtual_present += 1;
        }

        for essay in &self.essays {
            if let Some(score) = essay.graded_score() {
                grouped.slot(&essay.student_email).essay_scores.push(score);
            }
        }
        for exam in &self.simulated {
            if let Some(score) = exam.graded_score() {
                grouped.slot(&exam.student_email).simulated_scores.push(score);
            }
        }
        for response in &self.whiteboard {
            if let Some(score) = response.score.filter(|s| *s > 0.0) {
                grouped
                    .slot(&response.student_email)
                    .whiteboard_scores
                    .push(score);
            }
        }
        for exercise in self.exercises.iter().filter(|s| s.is_delivered()) {
            grouped.slot(&exercise.student_email).exercises += 1;
        }
        for imported in self.radar.iter().filter(|s| s.is_delivered()) {
            grouped.slot(&imported.student_email).radar += 1;
        }
        for evaluation in &self.evaluations {
            grouped.slot(&evaluation.student_email).in_person_score =
                Some(evaluation.score);
        }

        grouped
    }
}

/// Normalizes, averages and blends one student's activity. Exercises are
/// reported as counts only and never reach the grade.
pub fn build_entry(
    student_email: &str,
    student_name: &str,
    period: &StudyPeriod,
    activity: StudentActivity,
) -> GradebookEntry {
    let total_sessions = activity.diary_sessions + activity.virtual_sessions;
    let present = activity.diary_present + activity.virtual_present;
    let attendance_pct = percentage(present, total_sessions);
    let participation_pct = percentage(activity.diary_participated, activity.diary_sessions);

    let essays = ScoreStats {
        count: activity.essay_scores.len(),
        mean: mean(&activity.essay_scores),
    };
    let simulated_exams = ScoreStats {
        count: activity.simulated_scores.len(),
        mean: mean(&activity.simulated_scores),
    };
    let whiteboard = ScoreStats {
        count: activity.whiteboard_scores.len(),
        mean: mean(&activity.whiteboard_scores),
    };

    let online_average = compute_online_average(
        percentage_to_ten_scale(attendance_pct),
        percentage_to_ten_scale(participation_pct),
        thousand_scale_to_ten_scale(essays.mean),
        whiteboard.mean,
        thousand_scale_to_ten_scale(simulated_exams.mean),
    );
    let final_grade = clamp_grade(compute_final_grade(
        online_average,
        activity.in_person_score,
    ));

    let mut degraded_sources = activity.degraded;
    degraded_sources.sort();
    degraded_sources.dedup();

    GradebookEntry {
        student_email: student_email.to_string(),
        student_name: student_name.to_string(),
        period: period.reference(),
        attendance: AttendanceStats {
            total_sessions,
            present,
            percentage: attendance_pct,
            diary_sessions: activity.diary_sessions,
            virtual_sessions: activity.virtual_sessions,
        },
        participation: ParticipationStats {
            total: activity.diary_sessions,
            count: activity.diary_participated,
            percentage: participation_pct,
        },
        essays,
        simulated_exams,
        whiteboard,
        exercises: ExerciseStats {
            count: activity.exercises + activity.radar,
            from_exercises: activity.exercises,
            from_radar: activity.radar,
        },
        in_person_score: activity.in_person_score,
        online_average,
        final_grade,
        degraded_sources,
    }
}

/// Gradebook entry for a single student, fetching only that student's rows.
pub async fn student_entry<S: GradebookStore>(
    store: &S,
    config: &EngineConfig,
    class_spellings: &[String],
    period: &StudyPeriod,
    student_email: &str,
    student_name: &str,
) -> GradebookEntry {
    let emails = [student_email.to_string()];
    let mut grouped = fetch_period_sources(store, config, class_spellings, period, &emails)
        .await
        .group_by_student();
    build_entry(student_email, student_name, period, grouped.take(student_email))
}
