use chrono::NaiveDate;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{AttendanceCategory, AttendanceEvent, DbAttendanceEvent};

use super::is_foreign_key_violation;

/// Records one attendance event and folds its weight into the student's
/// cumulative absence. The ledger insert and the aggregate update commit
/// together; a failure in either leaves both untouched.
#[instrument(skip(pool))]
pub async fn record_attendance(
    pool: &Pool<Sqlite>,
    student_id: &str,
    date: NaiveDate,
    category: AttendanceCategory,
) -> Result<(), AppError> {
    info!(student_id = %student_id, category = category.code(), "Recording attendance event");

    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        "INSERT INTO attendance (student_id, attendance_date, category) VALUES (?, ?, ?)",
    )
    .bind(student_id)
    .bind(date)
    .bind(category.code())
    .execute(&mut *tx)
    .await;

    if let Err(err) = inserted {
        tx.rollback().await?;
        if is_foreign_key_violation(&err) {
            return Err(AppError::NotFound(format!(
                "Student with id {} not found in database",
                student_id
            )));
        }
        return Err(err.into());
    }

    sqlx::query("UPDATE students SET absence_days = absence_days + ? WHERE student_id = ?")
        .bind(category.absence_weight())
        .bind(student_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

/// Ledger rows for one student, oldest first.
#[instrument]
pub async fn list_attendance_for_student(
    pool: &Pool<Sqlite>,
    student_id: &str,
) -> Result<Vec<AttendanceEvent>, AppError> {
    let rows = sqlx::query_as::<_, DbAttendanceEvent>(
        "SELECT id, student_id, attendance_date, category
         FROM attendance WHERE student_id = ? ORDER BY attendance_date, id",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(AttendanceEvent::from).collect())
}
