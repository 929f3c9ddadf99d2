use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{Course, DbCourse, DbSubject, Subject};

use super::{is_foreign_key_violation, is_unique_violation};

#[instrument]
pub async fn list_courses(pool: &Pool<Sqlite>) -> Result<Vec<Course>, AppError> {
    let rows = sqlx::query_as::<_, DbCourse>(
        "SELECT class_id, course_name, teacher_id FROM courses ORDER BY class_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Course::from).collect())
}

#[instrument]
pub async fn get_course(pool: &Pool<Sqlite>, class_id: &str) -> Result<Course, AppError> {
    let row = sqlx::query_as::<_, DbCourse>(
        "SELECT class_id, course_name, teacher_id FROM courses WHERE class_id = ?",
    )
    .bind(class_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(course) => Ok(Course::from(course)),
        _ => Err(AppError::NotFound(format!(
            "Course with class code {} not found in database",
            class_id
        ))),
    }
}

#[instrument]
pub async fn create_course(
    pool: &Pool<Sqlite>,
    class_id: &str,
    course_name: &str,
    teacher_id: Option<i64>,
) -> Result<(), AppError> {
    info!("Creating course");

    let result = sqlx::query("INSERT INTO courses (class_id, course_name, teacher_id) VALUES (?, ?, ?)")
        .bind(class_id)
        .bind(course_name)
        .bind(teacher_id)
        .execute(pool)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(AppError::Conflict(format!(
            "Course with class code {} already exists",
            class_id
        ))),
        Err(err) if is_foreign_key_violation(&err) => Err(AppError::Validation(format!(
            "Unknown teacher id: {:?}",
            teacher_id
        ))),
        Err(err) => Err(err.into()),
    }
}

#[instrument]
pub async fn update_course(
    pool: &Pool<Sqlite>,
    class_id: &str,
    course_name: &str,
    teacher_id: Option<i64>,
) -> Result<(), AppError> {
    info!("Updating course");

    let result = sqlx::query("UPDATE courses SET course_name = ?, teacher_id = ? WHERE class_id = ?")
        .bind(course_name)
        .bind(teacher_id)
        .bind(class_id)
        .execute(pool)
        .await;

    match result {
        Ok(res) if res.rows_affected() == 0 => Err(AppError::NotFound(format!(
            "Course with class code {} not found in database",
            class_id
        ))),
        Ok(_) => Ok(()),
        Err(err) if is_foreign_key_violation(&err) => Err(AppError::Validation(format!(
            "Unknown teacher id: {:?}",
            teacher_id
        ))),
        Err(err) => Err(err.into()),
    }
}

/// Deletes a course unless a student still references it.
#[instrument]
pub async fn delete_course(pool: &Pool<Sqlite>, class_id: &str) -> Result<(), AppError> {
    info!("Deleting course");

    let result = sqlx::query("DELETE FROM courses WHERE class_id = ?")
        .bind(class_id)
        .execute(pool)
        .await;

    match result {
        Ok(res) if res.rows_affected() == 0 => Err(AppError::NotFound(format!(
            "Course with class code {} not found in database",
            class_id
        ))),
        Ok(_) => Ok(()),
        Err(err) if is_foreign_key_violation(&err) => Err(AppError::InUse(format!(
            "Course {} is still referenced by students",
            class_id
        ))),
        Err(err) => Err(err.into()),
    }
}

#[instrument]
pub async fn list_subjects(pool: &Pool<Sqlite>) -> Result<Vec<Subject>, AppError> {
    let rows = sqlx::query_as::<_, DbSubject>(
        "SELECT subject_id, subject_name FROM subjects ORDER BY subject_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Subject::from).collect())
}

#[instrument]
pub async fn get_subject(pool: &Pool<Sqlite>, subject_id: &str) -> Result<Subject, AppError> {
    let row = sqlx::query_as::<_, DbSubject>(
        "SELECT subject_id, subject_name FROM subjects WHERE subject_id = ?",
    )
    .bind(subject_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(subject) => Ok(Subject::from(subject)),
        _ => Err(AppError::NotFound(format!(
            "Subject with code {} not found in database",
            subject_id
        ))),
    }
}

#[instrument]
pub async fn create_subject(
    pool: &Pool<Sqlite>,
    subject_id: &str,
    subject_name: &str,
) -> Result<(), AppError> {
    info!("Creating subject");

    let result = sqlx::query("INSERT INTO subjects (subject_id, subject_name) VALUES (?, ?)")
        .bind(subject_id)
        .bind(subject_name)
        .execute(pool)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(AppError::Conflict(format!(
            "Subject with code {} already exists",
            subject_id
        ))),
        Err(err) => Err(err.into()),
    }
}

#[instrument]
pub async fn update_subject(
    pool: &Pool<Sqlite>,
    subject_id: &str,
    subject_name: &str,
) -> Result<(), AppError> {
    info!("Updating subject");

    let result = sqlx::query("UPDATE subjects SET subject_name = ? WHERE subject_id = ?")
        .bind(subject_name)
        .bind(subject_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Subject with code {} not found in database",
            subject_id
        )));
    }

    Ok(())
}

/// Deletes a subject unless a score row still references it.
#[instrument]
pub async fn delete_subject(pool: &Pool<Sqlite>, subject_id: &str) -> Result<(), AppError> {
    info!("Deleting subject");

    let result = sqlx::query("DELETE FROM subjects WHERE subject_id = ?")
        .bind(subject_id)
        .execute(pool)
        .await;

    match result {
        Ok(res) if res.rows_affected() == 0 => Err(AppError::NotFound(format!(
            "Subject with code {} not found in database",
            subject_id
        ))),
        Ok(_) => Ok(()),
        Err(err) if is_foreign_key_violation(&err) => Err(AppError::InUse(format!(
            "Subject {} is still referenced by scores",
            subject_id
        ))),
        Err(err) => Err(err.into()),
    }
}

/// subject_id -> subject_name, for rendering score lists without a per-row
/// lookup.
#[instrument]
pub async fn subject_name_lookup(pool: &Pool<Sqlite>) -> Result<HashMap<String, String>, AppError> {
    let subjects = list_subjects(pool).await?;
    Ok(subjects
        .into_iter()
        .map(|s| (s.subject_id, s.subject_name))
        .collect())
}
