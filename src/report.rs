use std::fmt::Write;

use crate::models::{ClassSummary, GradebookEntry};
use crate::turma::canonical_code;

fn source_list(entry: &GradebookEntry) -> String {
    entry
        .degraded_sources
        .iter()
        .map(|s| format!("{s:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn in_person(entry: &GradebookEntry) -> String {
    entry
        .in_person_score
        .map(|score| format!("{score:.2}"))
        .unwrap_or_else(|| "-".to_string())
}

pub fn build_report(class_code: &str, summary: &ClassSummary) -> String {
    let mut output = String::new();
    let period = &summary.period;
    let stats = &summary.statistics;

    let _ = writeln!(output, "# Gradebook: Turma {}", canonical_code(class_code));
    let _ = writeln!(
        output,
        "{} (etapa {}), {} to {}",
        period.name, period.number, period.start_date, period.end_date
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Class Statistics");
    let _ = writeln!(output, "- Students: {}", stats.total_students);
    let _ = writeln!(output, "- Mean attendance: {:.2}%", stats.mean_attendance);
    let _ = writeln!(output, "- Mean participation: {:.2}%", stats.mean_participation);
    let _ = writeln!(output, "- Mean final grade: {:.2}", stats.mean_final_grade);
    let _ = writeln!(
        output,
        "- Essays: {}, simulated exams: {}, exercises: {}",
        stats.total_essays, stats.total_simulated_exams, stats.total_exercises
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Students");

    if summary.students.is_empty() {
        let _ = writeln!(output, "No active students in this class.");
        return output;
    }

    let _ = writeln!(
        output,
        "| Student | Attendance | Participation | Essays | Simulated | Whiteboard | Exercises | In person | Final |"
    );
    let _ = writeln!(output, "|---|---|---|---|---|---|---|---|---|");
    for entry in &summary.students {
        let _ = writeln!(
            output,
            "| {} | {:.2}% ({}/{}) | {:.2}% | {} ({:.0}) | {} ({:.0}) | {} ({:.2}) | {} | {} | {:.2} |",
            entry.student_name,
            entry.attendance.percentage,
            entry.attendance.present,
            entry.attendance.total_sessions,
            entry.participation.percentage,
            entry.essays.count,
            entry.essays.mean,
            entry.simulated_exams.count,
            entry.simulated_exams.mean,
            entry.whiteboard.count,
            entry.whiteboard.mean,
            entry.exercises.count,
            in_person(entry),
            entry.final_grade
        );
    }

    let degraded: Vec<&GradebookEntry> = summary
        .students
        .iter()
        .filter(|e| !e.degraded_sources.is_empty())
        .collect();
    if !degraded.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Incomplete Data");
        for entry in degraded {
            let _ = writeln!(
                output,
                "- {}: {} unavailable, counted as zero",
                entry.student_name,
                source_list(entry)
            );
        }
    }

    output
}

/// One line per period, as printed by the `student` subcommand.
pub fn student_line(entry: &GradebookEntry) -> String {
    let mut line = format!(
        "- {} (etapa {}): final {:.2}, online {:.2}, attendance {:.2}% ({}/{}), participation {:.2}%, \
         essays {} ({:.0}), simulated {} ({:.0}), whiteboard {} ({:.2}), exercises {}, in person {}",
        entry.period.name,
        entry.period.number,
        entry.final_grade,
        entry.online_average,
        entry.attendance.percentage,
        entry.attendance.present,
        entry.attendance.total_sessions,
        entry.participation.percentage,
        entry.essays.count,
        entry.essays.mean,
        entry.simulated_exams.count,
        entry.simulated_exams.mean,
        entry.whiteboard.count,
        entry.whiteboard.mean,
        entry.exercises.count,
        in_person(entry)
    );
    if !entry.degraded_sources.is_empty() {
        let _ = write!(line, " [incomplete: {}]", source_list(entry));
    }
    line
}
