//! Shared test data: class C, January 2026.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::memory::MemoryData;
use crate::models::{
    AttendanceRecord, ClassSession, InPersonEvaluation, StudyPeriod, Student, Submission,
    SubmissionSource, VirtualAttendance, VirtualSession, WhiteboardResponse,
};

pub const ANA: &str = "ana.souza@escola.com";
pub const BRUNO: &str = "bruno.lima@escola.com";
pub const CAMILA: &str = "camila.rocha@escola.com";
pub const DIEGO: &str = "diego.alves@escola.com";

pub struct Fixture {
    pub period: StudyPeriod,
    pub data: MemoryData,
}

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

pub fn at(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, month, day, hour, minute, 0).unwrap()
}

pub fn student(email: &str, name: &str, class_code: &str) -> Student {
    Student {
        email: email.to_string(),
        name: name.to_string(),
        class_code: class_code.to_string(),
        active: true,
    }
}

pub fn submission(email: &str, submitted_at: DateTime<Utc>, score: Option<f64>) -> Submission {
    Submission {
        id: Uuid::new_v4(),
        student_email: email.to_string(),
        submitted_at,
        score,
        returned: false,
        deleted_at: None,
    }
}

pub fn empty_period() -> StudyPeriod {
    StudyPeriod {
        id: Uuid::new_v4(),
        name: "3ª Etapa".to_string(),
        number: 3,
        class_code: "C".to_string(),
        start_date: date(3, 1),
        end_date: date(3, 31),
        active: false,
    }
}

/// Ana: 8/10 diary sessions present, 5 participations, 2/2 virtual sessions,
/// essays averaging 720, one whiteboard response of 9.0, simulated exams
/// averaging 650, two exercises plus one radar import. Every source also
/// carries rows that must be ignored.
///
/// Bruno: present at every diary session, no submissions.
/// Camila: inactive. Diego: another class.
pub fn january_scenario(in_person: Option<f64>) -> Fixture {
    let period = StudyPeriod {
        id: Uuid::new_v4(),
        name: "1ª Etapa".to_string(),
        number: 1,
        class_code: "Turma C".to_string(),
        start_date: date(1, 1),
        end_date: date(1, 31),
        active: true,
    };
    let mut data = MemoryData {
        periods: vec![period.clone()],
        ..MemoryData::default()
    };

    let mut camila = student(CAMILA, "Camila Rocha", "C");
    camila.active = false;
    data.students = vec![
        student(BRUNO, "Bruno Lima", "TURMA C"),
        student(ANA, "Ana Souza", "C"),
        camila,
        student(DIEGO, "Diego Alves", "D"),
    ];

    let spellings = ["C", "TURMA C", "Turma C", "turma C"];
    for day in 1..=10u32 {
        let session = ClassSession {
            id: Uuid::new_v4(),
            class_code: spellings[day as usize % spellings.len()].to_string(),
            session_date: date(1, day * 3),
            content: Some(format!("Aula {day}")),
            notes: None,
            period_id: period.id,
            teacher_id: Some("prof.marta@escola.com".to_string()),
        };
        data.attendance.push(AttendanceRecord {
            session_id: session.id,
            student_email: ANA.to_string(),
            present: day <= 8,
            participated: day <= 5,
            note: None,
        });
        data.attendance.push(AttendanceRecord {
            session_id: session.id,
            student_email: BRUNO.to_string(),
            present: true,
            participated: day % 2 == 0,
            note: None,
        });
        data.sessions.push(session);
    }
    // Same period id but a different class; must not count.
    data.sessions.push(ClassSession {
        id: Uuid::new_v4(),
        class_code: "D".to_string(),
        session_date: date(1, 5),
        content: None,
        notes: None,
        period_id: period.id,
        teacher_id: None,
    });

    let own = VirtualSession {
        id: Uuid::new_v4(),
        title: "Revisão ao vivo".to_string(),
        session_date: date(1, 12),
        authorized_classes: vec!["Turma C".to_string(), "D".to_string()],
    };
    let shared = VirtualSession {
        id: Uuid::new_v4(),
        title: "Aulão geral".to_string(),
        session_date: date(1, 31),
        authorized_classes: vec!["Todas".to_string()],
    };
    let other_class = VirtualSession {
        id: Uuid::new_v4(),
        title: "Plantão D".to_string(),
        session_date: date(1, 20),
        authorized_classes: vec!["D".to_string()],
    };
    let next_month = VirtualSession {
        id: Uuid::new_v4(),
        title: "Fevereiro".to_string(),
        session_date: date(2, 1),
        authorized_classes: vec!["C".to_string()],
    };
    for (session, minute) in [(&own, 0), (&own, 40), (&shared, 5)] {
        data.virtual_attendance.push(VirtualAttendance {
            session_id: session.id,
            student_email: ANA.to_string(),
            entered_at: session
                .session_date
                .and_hms_opt(19, minute, 0)
                .unwrap()
                .and_utc(),
        });
    }
    for session in [&other_class, &next_month] {
        data.virtual_attendance.push(VirtualAttendance {
            session_id: session.id,
            student_email: ANA.to_string(),
            entered_at: at(2, 1, 19, 0),
        });
    }
    data.virtual_sessions = vec![own, shared, other_class, next_month];

    let mut returned = submission(ANA, at(1, 15, 10, 0), Some(1000.0));
    returned.returned = true;
    let mut deleted = submission(ANA, at(1, 16, 10, 0), Some(900.0));
    deleted.deleted_at = Some(at(1, 17, 0, 0));
    let essays = vec![
        submission(ANA, at(1, 1, 0, 0), Some(700.0)),
        submission(ANA, at(1, 10, 14, 0), Some(740.0)),
        submission(ANA, at(1, 31, 22, 0), Some(720.0)),
        returned,
        deleted,
        submission(ANA, at(1, 20, 9, 0), Some(0.0)),
        submission(ANA, at(1, 21, 9, 0), None),
        submission(ANA, at(2, 1, 0, 0), Some(1000.0)),
        submission(DIEGO, at(1, 12, 9, 0), Some(500.0)),
    ];
    data.submissions
        .extend(essays.into_iter().map(|s| (SubmissionSource::Essay, s)));

    let simulated = vec![
        submission(ANA, at(1, 8, 8, 0), Some(600.0)),
        submission(ANA, at(1, 22, 8, 0), Some(700.0)),
        submission(
            ANA,
            Utc.with_ymd_and_hms(2025, 12, 20, 8, 0, 0).unwrap(),
            Some(900.0),
        ),
    ];
    data.submissions
        .extend(simulated.into_iter().map(|s| (SubmissionSource::SimulatedEssay, s)));

    let mut deleted_exercise = submission(ANA, at(1, 9, 8, 0), None);
    deleted_exercise.deleted_at = Some(at(1, 9, 9, 0));
    data.submissions.extend([
        (SubmissionSource::Exercise, submission(ANA, at(1, 4, 8, 0), Some(8.0))),
        (SubmissionSource::Exercise, submission(ANA, at(1, 5, 8, 0), None)),
        (SubmissionSource::Exercise, deleted_exercise),
        (SubmissionSource::Radar, submission(ANA, at(1, 6, 8, 0), Some(5.0))),
        (SubmissionSource::Exercise, submission(BRUNO, at(1, 7, 8, 0), None)),
    ]);

    data.whiteboard = vec![
        WhiteboardResponse {
            id: Uuid::new_v4(),
            student_email: ANA.to_string(),
            submitted_at: at(1, 14, 20, 0),
            score: Some(9.0),
        },
        WhiteboardResponse {
            id: Uuid::new_v4(),
            student_email: ANA.to_string(),
            submitted_at: at(1, 18, 20, 0),
            score: Some(0.0),
        },
    ];

    if let Some(score) = in_person {
        data.evaluations.push(InPersonEvaluation {
            student_email: ANA.to_string(),
            period_id: period.id,
            score,
            notes: Some("Prova presencial".to_string()),
        });
    }

    Fixture { period, data }
}
