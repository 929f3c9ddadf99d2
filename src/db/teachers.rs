use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use tracing::{info, instrument};

use crate::auth::{DbTeacher, Teacher};
use crate::error::AppError;

/// Why a login attempt failed. The two cases are reported to the caller as
/// distinct messages.
#[derive(Debug, PartialEq, Eq)]
pub enum LoginFailure {
    UnknownTeacherId,
    WrongPassword,
}

impl LoginFailure {
    pub fn message(&self) -> &'static str {
        match self {
            LoginFailure::UnknownTeacherId => "Unknown teacher id",
            LoginFailure::WrongPassword => "Incorrect password",
        }
    }
}

#[derive(sqlx::FromRow)]
struct DbTeacherCredentials {
    teacher_id: Option<i64>,
    teacher_name: Option<String>,
    password: Option<String>,
    class_id: Option<String>,
    is_active: Option<bool>,
    is_staff: Option<bool>,
}

#[instrument]
pub async fn get_teacher(pool: &Pool<Sqlite>, teacher_id: i64) -> Result<Teacher, AppError> {
    info!("Fetching teacher by id");
    let row = sqlx::query_as::<_, DbTeacher>(
        "SELECT teacher_id, teacher_name, class_id, is_active, is_staff
         FROM teachers WHERE teacher_id = ?",
    )
    .bind(teacher_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(teacher) => Ok(Teacher::from(teacher)),
        _ => Err(AppError::NotFound(format!(
            "Teacher with id {} not found in database",
            teacher_id
        ))),
    }
}

#[instrument(skip_all, fields(teacher_id))]
pub async fn authenticate_teacher(
    pool: &Pool<Sqlite>,
    teacher_id: i64,
    password: &str,
) -> Result<Result<Teacher, LoginFailure>, AppError> {
    info!("Authenticating teacher");
    let row = sqlx::query_as::<_, DbTeacherCredentials>(
        "SELECT teacher_id, teacher_name, password, class_id, is_active, is_staff
         FROM teachers WHERE teacher_id = ?",
    )
    .bind(teacher_id)
    .fetch_optional(pool)
    .await?;

    let row = match row {
        Some(row) => row,
        _ => return Ok(Err(LoginFailure::UnknownTeacherId)),
    };

    // Deactivated accounts are indistinguishable from unknown ids on purpose.
    if !row.is_active.unwrap_or_default() {
        return Ok(Err(LoginFailure::UnknownTeacherId));
    }

    let stored_hash = row.password.clone().unwrap_or_default();
    match bcrypt::verify(password, &stored_hash) {
        Ok(true) => Ok(Ok(Teacher {
            teacher_id: row.teacher_id.unwrap_or_default(),
            teacher_name: row.teacher_name.unwrap_or_default(),
            class_id: row.class_id,
            is_active: row.is_active.unwrap_or_default(),
            is_staff: row.is_staff.unwrap_or_default(),
        })),
        _ => Ok(Err(LoginFailure::WrongPassword)),
    }
}

#[instrument(skip_all, fields(teacher_id, teacher_name))]
pub async fn create_teacher(
    pool: &Pool<Sqlite>,
    teacher_id: i64,
    teacher_name: &str,
    password: &str,
    class_id: Option<&str>,
    is_staff: bool,
) -> Result<(), AppError> {
    info!("Creating new teacher");

    let existing = sqlx::query("SELECT teacher_id FROM teachers WHERE teacher_id = ?")
        .bind(teacher_id)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(format!(
            "Teacher id {} already exists",
            teacher_id
        )));
    }

    let hashed_password = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

    sqlx::query(
        "INSERT INTO teachers (teacher_id, teacher_name, password, class_id, is_staff)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(teacher_id)
    .bind(teacher_name)
    .bind(hashed_password)
    .bind(class_id)
    .bind(is_staff)
    .execute(pool)
    .await?;

    Ok(())
}

/// teacher_id -> teacher_name, for rendering the course list without a
/// per-row lookup.
#[instrument]
pub async fn teacher_name_lookup(pool: &Pool<Sqlite>) -> Result<HashMap<i64, String>, AppError> {
    let rows = sqlx::query_as::<_, DbTeacher>(
        "SELECT teacher_id, teacher_name, class_id, is_active, is_staff FROM teachers",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(Teacher::from)
        .map(|t| (t.teacher_id, t.teacher_name))
        .collect())
}
