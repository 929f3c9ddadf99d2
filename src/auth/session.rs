use chrono::{NaiveDateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct TeacherSession {
    pub id: i64,
    pub teacher_id: i64,
    pub token: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbTeacherSession {
    pub id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub token: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub expires_at: Option<NaiveDateTime>,
}

impl From<DbTeacherSession> for TeacherSession {
    fn from(row: DbTeacherSession) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            teacher_id: row.teacher_id.unwrap_or_default(),
            token: row.token.unwrap_or_default(),
            created_at: row.created_at.unwrap_or_else(|| Utc::now().naive_utc()),
            expires_at: row.expires_at.unwrap_or_else(|| Utc::now().naive_utc()),
        }
    }
}

impl TeacherSession {
    pub fn generate_token() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn is_valid(&self) -> bool {
        self.expires_at > Utc::now().naive_utc()
    }
}
