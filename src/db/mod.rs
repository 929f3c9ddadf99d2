pub mod attendance;
pub mod catalog;
pub mod scores;
pub mod sessions;
pub mod students;
pub mod teachers;

pub use attendance::*;
pub use catalog::*;
pub use scores::*;
pub use sessions::*;
pub use students::*;
pub use teachers::*;

/// SQLite reports constraint failures as generic database errors; these
/// checks recover the specific constraint class so callers can map them to
/// distinct outcomes (referential protection, id collision).
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().contains("FOREIGN KEY constraint failed")
    )
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE constraint failed")
    )
}
