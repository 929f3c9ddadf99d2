use rocket::http::Status;
use serde::Serialize;

/// The authenticated teacher for the current request. Established at login,
/// resolved from the session cookie by the request guard, and passed into
/// every handler that needs it.
#[derive(Debug, Serialize, Clone)]
pub struct Teacher {
    pub teacher_id: i64,
    pub teacher_name: String,
    pub class_id: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbTeacher {
    pub teacher_id: Option<i64>,
    pub teacher_name: Option<String>,
    pub class_id: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
}

impl From<DbTeacher> for Teacher {
    fn from(row: DbTeacher) -> Self {
        Self {
            teacher_id: row.teacher_id.unwrap_or_default(),
            teacher_name: row.teacher_name.unwrap_or_default(),
            class_id: row.class_id,
            is_active: row.is_active.unwrap_or_default(),
            is_staff: row.is_staff.unwrap_or_default(),
        }
    }
}

impl Teacher {
    pub fn require_staff(&self) -> Result<(), Status> {
        if self.is_staff {
            Ok(())
        } else {
            tracing::warn!(
                teacher_id = %self.teacher_id,
                "Staff permission denied"
            );
            Err(Status::Forbidden)
        }
    }
}
