use rocket::response::status::Custom;
use rocket::serde::{json::Json, Deserialize, Serialize};
use rocket::State;
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;

use crate::api::students::StudentData;
use crate::auth::Teacher;
use crate::db::{
    get_student, get_subject, scores_for_class_subject, search_students, subject_name_lookup,
    upsert_score,
};
use crate::models::Score;
use crate::validation::{AppErrorExt, ValidationResponse};

#[derive(Serialize, Deserialize)]
pub struct ScoreData {
    pub student_id: String,
    pub subject_id: String,
    pub score: i64,
}

impl From<Score> for ScoreData {
    fn from(score: Score) -> Self {
        Self {
            student_id: score.student_id,
            subject_id: score.subject_id,
            score: score.score,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ScoreListResponse {
    pub students: Vec<StudentData>,
    pub scores: Vec<ScoreData>,
    /// subject_id -> subject_name for every subject, so the client renders
    /// names without per-row lookups.
    pub subjects: HashMap<String, String>,
    pub selected_year: Option<i64>,
    pub selected_class: Option<String>,
    pub selected_subject: Option<String>,
}

#[get("/scores?<year>&<class>&<subject>")]
pub async fn api_score_list(
    year: Option<i64>,
    class: Option<String>,
    subject: Option<String>,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ScoreListResponse>, rocket::http::Status> {
    let subjects = subject_name_lookup(db).await?;

    let (students, scores) = match (year, class.as_deref(), subject.as_deref()) {
        (Some(year), Some(class_id), Some(subject_id)) => {
            let students = search_students(db, year, class_id).await?;
            let scores = scores_for_class_subject(db, year, class_id, subject_id).await?;
            (students, scores)
        }
        _ => (Vec::new(), Vec::new()),
    };

    Ok(Json(ScoreListResponse {
        students: students.into_iter().map(StudentData::from).collect(),
        scores: scores.into_iter().map(ScoreData::from).collect(),
        subjects,
        selected_year: year,
        selected_class: class,
        selected_subject: subject,
    }))
}

#[derive(Deserialize)]
pub struct ScoreEntry {
    pub student_id: String,
    /// A null score means "leave this student untouched".
    pub score: Option<i64>,
}

#[derive(Deserialize)]
pub struct ScoreExecuteRequest {
    pub class_id: String,
    pub ent_year: i64,
    pub subject_id: String,
    pub entries: Vec<ScoreEntry>,
}

#[derive(Serialize, Deserialize)]
pub struct ScoreExecuteResponse {
    pub students: Vec<StudentData>,
    pub scores: Vec<ScoreData>,
    pub subjects: HashMap<String, String>,
    pub subject_id: String,
}

#[post("/scores", data = "<request>")]
pub async fn api_score_execute(
    request: Json<ScoreExecuteRequest>,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ScoreExecuteResponse>, Custom<Json<ValidationResponse>>> {
    let request = request.into_inner();

    get_subject(db, &request.subject_id).await.validate_custom()?;

    for entry in &request.entries {
        let score = match entry.score {
            Some(score) => score,
            None => continue,
        };

        get_student(db, &entry.student_id).await.validate_custom()?;

        upsert_score(db, &entry.student_id, &request.subject_id, score)
            .await
            .validate_custom()?;
    }

    let students = search_students(db, request.ent_year, &request.class_id)
        .await
        .validate_custom()?;
    let scores =
        scores_for_class_subject(db, request.ent_year, &request.class_id, &request.subject_id)
            .await
            .validate_custom()?;
    let subjects = subject_name_lookup(db).await.validate_custom()?;

    Ok(Json(ScoreExecuteResponse {
        students: students.into_iter().map(StudentData::from).collect(),
        scores: scores.into_iter().map(ScoreData::from).collect(),
        subjects,
        subject_id: request.subject_id,
    }))
}
