//! Scale normalization and the two-stage grade formula.
//!
//! Every signal is brought onto a 0-10 scale, the five online signals are
//! averaged with equal weight, and the result is blended with the optional
//! in-person evaluation.

pub const MAX_GRADE: f64 = 10.0;

pub fn percentage_to_ten_scale(percentage: f64) -> f64 {
    percentage / 10.0
}

/// Essays and simulated exams are scored out of 1000.
pub fn thousand_scale_to_ten_scale(score: f64) -> f64 {
    score / 100.0
}

/// `part / whole * 100`, or 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Equal-weight mean of the five normalized online signals. A signal with no
/// activity still counts in the denominator.
pub fn compute_online_average(
    attendance: f64,
    participation: f64,
    essays: f64,
    whiteboard: f64,
    simulated_exams: f64,
) -> f64 {
    (attendance + participation + essays + whiteboard + simulated_exams) / 5.0
}

pub fn compute_final_grade(online_average: f64, in_person_score: Option<f64>) -> f64 {
    match in_person_score {
        Some(score) => (online_average + score) / 2.0,
        None => online_average,
    }
}

pub fn clamp_grade(grade: f64) -> f64 {
    if grade.is_nan() {
        return 0.0;
    }
    grade.clamp(0.0, MAX_GRADE)
}

pub fn is_valid_grade(score: f64) -> bool {
    (0.0..=MAX_GRADE).contains(&score)
}
