use sqlx::{Pool, Sqlite};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::models::{DbStudent, Student};

use super::{is_foreign_key_violation, is_unique_violation};

const STUDENT_COLUMNS: &str = "student_id, last_name, first_name, postal_code, address1, \
     address2, phone_number, ent_year, class_id, absence_days, enrolled";

/// Fields accepted when registering a student. The identifier is never part
/// of this: it is allocated by the storage layer.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub last_name: String,
    pub first_name: String,
    pub postal_code: String,
    pub address1: String,
    pub address2: Option<String>,
    pub phone_number: String,
    pub ent_year: i64,
    pub class_id: String,
}

/// Fields accepted on update. `student_id` and `absence_days` are
/// deliberately absent: the stored values always survive an edit.
#[derive(Debug, Clone)]
pub struct StudentUpdate {
    pub last_name: String,
    pub first_name: String,
    pub postal_code: String,
    pub address1: String,
    pub address2: Option<String>,
    pub phone_number: String,
    pub ent_year: i64,
    pub class_id: String,
    pub enrolled: bool,
}

#[instrument]
pub async fn list_enrolled_students(pool: &Pool<Sqlite>) -> Result<Vec<Student>, AppError> {
    info!("Listing enrolled students");
    let rows = sqlx::query_as::<_, DbStudent>(&format!(
        "SELECT {} FROM students WHERE enrolled = TRUE ORDER BY student_id",
        STUDENT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Student::from).collect())
}

#[instrument]
pub async fn find_student(
    pool: &Pool<Sqlite>,
    student_id: &str,
) -> Result<Option<Student>, AppError> {
    let row = sqlx::query_as::<_, DbStudent>(&format!(
        "SELECT {} FROM students WHERE student_id = ?",
        STUDENT_COLUMNS
    ))
    .bind(student_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Student::from))
}

#[instrument]
pub async fn get_student(pool: &Pool<Sqlite>, student_id: &str) -> Result<Student, AppError> {
    match find_student(pool, student_id).await? {
        Some(student) => Ok(student),
        _ => Err(AppError::NotFound(format!(
            "Student with id {} not found in database",
            student_id
        ))),
    }
}

/// Students for one entry year and class, enrolled or not, ordered by id.
#[instrument]
pub async fn search_students(
    pool: &Pool<Sqlite>,
    ent_year: i64,
    class_id: &str,
) -> Result<Vec<Student>, AppError> {
    info!("Searching students by entry year and class");
    let rows = sqlx::query_as::<_, DbStudent>(&format!(
        "SELECT {} FROM students WHERE ent_year = ? AND class_id = ? ORDER BY student_id",
        STUDENT_COLUMNS
    ))
    .bind(ent_year)
    .bind(class_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Student::from).collect())
}

/// Registers a student, allocating the next sequential identifier inside the
/// INSERT itself. Reading the maximum and inserting in one statement keeps
/// concurrent registrations from observing the same maximum; a primary-key
/// collision is retried once and then surfaced as a retryable conflict.
#[instrument(skip(pool))]
pub async fn create_student(pool: &Pool<Sqlite>, new: &NewStudent) -> Result<Student, AppError> {
    info!("Registering new student");

    for attempt in 0..2 {
        let inserted = sqlx::query_scalar::<_, String>(
            "INSERT INTO students
                 (student_id, last_name, first_name, postal_code, address1,
                  address2, phone_number, ent_year, class_id)
             SELECT printf('%010d', COALESCE(MAX(CAST(student_id AS INTEGER)), 0) + 1),
                    ?, ?, ?, ?, ?, ?, ?, ?
             FROM students
             RETURNING student_id",
        )
        .bind(&new.last_name)
        .bind(&new.first_name)
        .bind(&new.postal_code)
        .bind(&new.address1)
        .bind(&new.address2)
        .bind(&new.phone_number)
        .bind(new.ent_year)
        .bind(&new.class_id)
        .fetch_one(pool)
        .await;

        match inserted {
            Ok(student_id) => {
                info!(student_id = %student_id, "Assigned student id");
                return get_student(pool, &student_id).await;
            }
            Err(err) if is_unique_violation(&err) => {
                warn!(attempt, "Student id allocation collided, retrying");
                continue;
            }
            Err(err) if is_foreign_key_violation(&err) => {
                return Err(AppError::Validation(format!(
                    "Unknown class code: {}",
                    new.class_id
                )));
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(AppError::Conflict(
        "Student id allocation collided, please retry".to_string(),
    ))
}

/// Persists an edit. The stored identifier and cumulative absence are left
/// untouched regardless of what the caller submitted.
#[instrument(skip(pool, update))]
pub async fn update_student(
    pool: &Pool<Sqlite>,
    student_id: &str,
    update: &StudentUpdate,
) -> Result<Student, AppError> {
    info!("Updating student");

    let result = sqlx::query(
        "UPDATE students
         SET last_name = ?, first_name = ?, postal_code = ?, address1 = ?,
             address2 = ?, phone_number = ?, ent_year = ?, class_id = ?, enrolled = ?
         WHERE student_id = ?",
    )
    .bind(&update.last_name)
    .bind(&update.first_name)
    .bind(&update.postal_code)
    .bind(&update.address1)
    .bind(&update.address2)
    .bind(&update.phone_number)
    .bind(update.ent_year)
    .bind(&update.class_id)
    .bind(update.enrolled)
    .bind(student_id)
    .execute(pool)
    .await;

    match result {
        Ok(res) if res.rows_affected() == 0 => Err(AppError::NotFound(format!(
            "Student with id {} not found in database",
            student_id
        ))),
        Ok(_) => get_student(pool, student_id).await,
        Err(err) if is_foreign_key_violation(&err) => Err(AppError::Validation(format!(
            "Unknown class code: {}",
            update.class_id
        ))),
        Err(err) => Err(err.into()),
    }
}
