use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{DbScore, Score};

use super::is_foreign_key_violation;

/// Score rows for one subject across a class-year's students.
#[instrument]
pub async fn scores_for_class_subject(
    pool: &Pool<Sqlite>,
    ent_year: i64,
    class_id: &str,
    subject_id: &str,
) -> Result<Vec<Score>, AppError> {
    info!("Fetching scores for class and subject");
    let rows = sqlx::query_as::<_, DbScore>(
        "SELECT student_id, subject_id, score FROM scores
         WHERE subject_id = ?
           AND student_id IN (SELECT student_id FROM students WHERE ent_year = ? AND class_id = ?)
         ORDER BY student_id",
    )
    .bind(subject_id)
    .bind(ent_year)
    .bind(class_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Score::from).collect())
}

#[instrument]
pub async fn find_score(
    pool: &Pool<Sqlite>,
    student_id: &str,
    subject_id: &str,
) -> Result<Option<Score>, AppError> {
    let row = sqlx::query_as::<_, DbScore>(
        "SELECT student_id, subject_id, score FROM scores
         WHERE student_id = ? AND subject_id = ?",
    )
    .bind(student_id)
    .bind(subject_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Score::from))
}

/// Creates the (student, subject) row if absent, otherwise overwrites its
/// value. Submitting the same value twice leaves exactly one row.
#[instrument]
pub async fn upsert_score(
    pool: &Pool<Sqlite>,
    student_id: &str,
    subject_id: &str,
    score: i64,
) -> Result<(), AppError> {
    info!("Upserting score");

    let result = sqlx::query(
        "INSERT INTO scores (student_id, subject_id, score) VALUES (?, ?, ?)
         ON CONFLICT (student_id, subject_id) DO UPDATE SET score = excluded.score",
    )
    .bind(student_id)
    .bind(subject_id)
    .bind(score)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) if is_foreign_key_violation(&err) => Err(AppError::NotFound(format!(
            "Student {} or subject {} not found in database",
            student_id, subject_id
        ))),
        Err(err) => Err(err.into()),
    }
}
