//! Class-wide gradebook for one period, fetched in one batch per source.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::{debug, warn};

use crate::aggregate::{build_entry, fetch_period_sources};
use crate::config::EngineConfig;
use crate::error::GradebookError;
use crate::grade::mean;
use crate::models::{ClassStatistics, ClassSummary, GradebookEntry, Student};
use crate::store::GradebookStore;
use crate::turma::class_spellings;

/// `None` when the class has no period with that number yet.
pub async fn class_summary<S: GradebookStore>(
    store: &S,
    config: &EngineConfig,
    class_code: &str,
    period_number: i32,
) -> Result<Option<ClassSummary>, GradebookError> {
    let spellings = class_spellings(class_code);
    let periods = store
        .fetch_periods(&spellings, Some(period_number))
        .await
        .map_err(|source| GradebookError::Periods {
            class_code: class_code.to_string(),
            source,
        })?;
    let Some(period) = periods.into_iter().next() else {
        debug!(class_code, period_number, "no such period");
        return Ok(None);
    };

    let roster = store
        .fetch_roster(&spellings)
        .await
        .map_err(|source| GradebookError::Roster {
            class_code: class_code.to_string(),
            source,
        })?;
    let roster = unique_by_email(roster);
    if roster.is_empty() {
        return Ok(Some(ClassSummary {
            period,
            students: Vec::new(),
            statistics: ClassStatistics::default(),
        }));
    }

    let emails: Vec<String> = roster.iter().map(|s| s.email.clone()).collect();
    let mut grouped = fetch_period_sources(store, config, &spellings, &period, &emails)
        .await
        .group_by_student();

    let mut students: Vec<GradebookEntry> = roster
        .iter()
        .map(|student| {
            let activity = grouped.take(&student.email);
            build_entry(&student.email, &student.name, &period, activity)
        })
        .collect();
    sort_by_name(&mut students);
    let statistics = class_statistics(&students);

    Ok(Some(ClassSummary {
        period,
        students,
        statistics,
    }))
}

fn unique_by_email(roster: Vec<Student>) -> Vec<Student> {
    let mut seen = HashSet::new();
    roster
        .into_iter()
        .filter(|student| {
            let fresh = seen.insert(student.email.clone());
            if !fresh {
                warn!(email = %student.email, "student listed twice in roster");
            }
            fresh
        })
        .collect()
}

pub fn class_statistics(entries: &[GradebookEntry]) -> ClassStatistics {
    let attendance: Vec<f64> = entries.iter().map(|e| e.attendance.percentage).collect();
    let participation: Vec<f64> = entries.iter().map(|e| e.participation.percentage).collect();
    let grades: Vec<f64> = entries.iter().map(|e| e.final_grade).collect();
    ClassStatistics {
        total_students: entries.len(),
        mean_attendance: mean(&attendance),
        mean_participation: mean(&participation),
        mean_final_grade: mean(&grades),
        total_essays: entries.iter().map(|e| e.essays.count).sum(),
        total_simulated_exams: entries.iter().map(|e| e.simulated_exams.count).sum(),
        total_exercises: entries.iter().map(|e| e.exercises.count).sum(),
    }
}

/// Case- and accent-insensitive ordering for Portuguese names.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn sort_by_name(entries: &mut [GradebookEntry]) {
    entries.sort_by(|a, b| {
        compare_names(&a.student_name, &b.student_name)
            .then_with(|| a.student_email.cmp(&b.student_email))
    });
}

fn collation_key(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
