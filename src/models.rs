use chrono::NaiveDate;
use serde::Serialize;

use crate::error::AppError;

#[derive(Serialize, Debug, Clone)]
pub struct Student {
    pub student_id: String,
    pub last_name: String,
    pub first_name: String,
    pub postal_code: String,
    pub address1: String,
    pub address2: Option<String>,
    pub phone_number: String,
    pub ent_year: i64,
    pub class_id: String,
    pub absence_days: f64,
    pub enrolled: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbStudent {
    pub student_id: Option<String>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub postal_code: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub phone_number: Option<String>,
    pub ent_year: Option<i64>,
    pub class_id: Option<String>,
    pub absence_days: Option<f64>,
    pub enrolled: Option<bool>,
}

impl From<DbStudent> for Student {
    fn from(row: DbStudent) -> Self {
        Self {
            student_id: row.student_id.unwrap_or_default(),
            last_name: row.last_name.unwrap_or_default(),
            first_name: row.first_name.unwrap_or_default(),
            postal_code: row.postal_code.unwrap_or_default(),
            address1: row.address1.unwrap_or_default(),
            address2: row.address2,
            phone_number: row.phone_number.unwrap_or_default(),
            ent_year: row.ent_year.unwrap_or_default(),
            class_id: row.class_id.unwrap_or_default(),
            absence_days: row.absence_days.unwrap_or_default(),
            enrolled: row.enrolled.unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Course {
    pub class_id: String,
    pub course_name: String,
    pub teacher_id: Option<i64>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbCourse {
    pub class_id: Option<String>,
    pub course_name: Option<String>,
    pub teacher_id: Option<i64>,
}

impl From<DbCourse> for Course {
    fn from(row: DbCourse) -> Self {
        Self {
            class_id: row.class_id.unwrap_or_default(),
            course_name: row.course_name.unwrap_or_default(),
            teacher_id: row.teacher_id,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Subject {
    pub subject_id: String,
    pub subject_name: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbSubject {
    pub subject_id: Option<String>,
    pub subject_name: Option<String>,
}

impl From<DbSubject> for Subject {
    fn from(row: DbSubject) -> Self {
        Self {
            subject_id: row.subject_id.unwrap_or_default(),
            subject_name: row.subject_name.unwrap_or_default(),
        }
    }
}

/// One row in the append-only attendance ledger. Rows are only ever
/// inserted; corrections happen by inserting further events.
#[derive(Serialize, Debug, Clone)]
pub struct AttendanceEvent {
    pub id: i64,
    pub student_id: String,
    pub attendance_date: NaiveDate,
    pub category: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbAttendanceEvent {
    pub id: Option<i64>,
    pub student_id: Option<String>,
    pub attendance_date: Option<NaiveDate>,
    pub category: Option<i64>,
}

impl From<DbAttendanceEvent> for AttendanceEvent {
    fn from(row: DbAttendanceEvent) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            student_id: row.student_id.unwrap_or_default(),
            attendance_date: row.attendance_date.unwrap_or_default(),
            category: row.category.unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Score {
    pub student_id: String,
    pub subject_id: String,
    pub score: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbScore {
    pub student_id: Option<String>,
    pub subject_id: Option<String>,
    pub score: Option<i64>,
}

impl From<DbScore> for Score {
    fn from(row: DbScore) -> Self {
        Self {
            student_id: row.student_id.unwrap_or_default(),
            subject_id: row.subject_id.unwrap_or_default(),
            score: row.score.unwrap_or_default(),
        }
    }
}

/// Attendance categories as submitted from the recording form. Code 0 means
/// "nothing to record" and never reaches the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceCategory {
    Absent,
    Late,
    EarlyLeave,
    Other,
}

impl AttendanceCategory {
    pub fn from_code(code: i64) -> Result<Option<Self>, AppError> {
        match code {
            0 => Ok(None),
            1 => Ok(Some(AttendanceCategory::Absent)),
            2 => Ok(Some(AttendanceCategory::Late)),
            3 => Ok(Some(AttendanceCategory::EarlyLeave)),
            4 => Ok(Some(AttendanceCategory::Other)),
            _ => Err(AppError::Validation(format!(
                "Unknown attendance category: {}",
                code
            ))),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            AttendanceCategory::Absent => 1,
            AttendanceCategory::Late => 2,
            AttendanceCategory::EarlyLeave => 3,
            AttendanceCategory::Other => 4,
        }
    }

    /// Contribution to the cumulative absence-day aggregate on the student.
    pub fn absence_weight(&self) -> f64 {
        match self {
            AttendanceCategory::Absent => 1.0,
            AttendanceCategory::Late | AttendanceCategory::EarlyLeave => 0.5,
            AttendanceCategory::Other => 0.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttendanceCategory::Absent => "Absent",
            AttendanceCategory::Late => "Late",
            AttendanceCategory::EarlyLeave => "Early leave",
            AttendanceCategory::Other => "Other",
        }
    }

    pub fn all() -> [AttendanceCategory; 4] {
        [
            AttendanceCategory::Absent,
            AttendanceCategory::Late,
            AttendanceCategory::EarlyLeave,
            AttendanceCategory::Other,
        ]
    }
}
