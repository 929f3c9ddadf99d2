use chrono::{Datelike, NaiveDate, Utc};
use rocket::response::status::Custom;
use rocket::serde::{json::Json, Deserialize, Serialize};
use rocket::State;
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;

use crate::api::catalog::CourseData;
use crate::api::students::StudentData;
use crate::auth::Teacher;
use crate::db::{get_student, list_courses, record_attendance, search_students};
use crate::models::AttendanceCategory;
use crate::validation::{AppErrorExt, ValidationResponse};

#[derive(Serialize, Deserialize)]
pub struct AttendanceSearchResponse {
    pub students: Vec<StudentData>,
    pub courses: Vec<CourseData>,
    /// Year selection window, current year plus and minus ten.
    pub years: Vec<i64>,
    pub selected_year: Option<i64>,
    pub selected_class: Option<String>,
}

fn year_window() -> Vec<i64> {
    let current = Utc::now().year() as i64;
    (current - 10..=current + 10).collect()
}

/// Without a year/class selection this returns an empty student list, never
/// an error; the course and year options are always present.
#[get("/attendance/search?<year>&<class>")]
pub async fn api_attendance_search(
    year: Option<i64>,
    class: Option<String>,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AttendanceSearchResponse>, rocket::http::Status> {
    let students = match (year, class.as_deref()) {
        (Some(year), Some(class_id)) => search_students(db, year, class_id).await?,
        _ => Vec::new(),
    };

    let courses = list_courses(db).await?;

    Ok(Json(AttendanceSearchResponse {
        students: students.into_iter().map(StudentData::from).collect(),
        courses: courses.into_iter().map(CourseData::from).collect(),
        years: year_window(),
        selected_year: year,
        selected_class: class,
    }))
}

#[derive(Deserialize)]
pub struct AttendanceEntry {
    pub student_id: String,
    /// 0 = nothing to record, 1 = absent, 2 = late, 3 = early leave,
    /// 4 = other.
    pub category: i64,
}

#[derive(Deserialize)]
pub struct AttendanceInsertRequest {
    pub date: NaiveDate,
    pub entries: Vec<AttendanceEntry>,
}

#[derive(Serialize, Deserialize)]
pub struct AttendanceInsertResponse {
    pub date: NaiveDate,
    /// The submitted students, re-read with refreshed aggregates, for the
    /// confirmation view.
    pub students: Vec<StudentData>,
    pub categories: HashMap<i64, String>,
}

#[post("/attendance", data = "<request>")]
pub async fn api_attendance_insert(
    request: Json<AttendanceInsertRequest>,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<AttendanceInsertResponse>, Custom<Json<ValidationResponse>>> {
    let request = request.into_inner();

    let mut confirmed = Vec::with_capacity(request.entries.len());

    for entry in &request.entries {
        let category = AttendanceCategory::from_code(entry.category).validate_custom()?;

        // Resolve before touching anything so an unknown id aborts this
        // entry instead of leaving a half-applied pair.
        get_student(db, &entry.student_id).await.validate_custom()?;

        if let Some(category) = category {
            record_attendance(db, &entry.student_id, request.date, category)
                .await
                .validate_custom()?;
        }

        let student = get_student(db, &entry.student_id).await.validate_custom()?;
        confirmed.push(StudentData::from(student));
    }

    let categories = AttendanceCategory::all()
        .iter()
        .map(|c| (c.code(), c.label().to_string()))
        .collect();

    Ok(Json(AttendanceInsertResponse {
        date: request.date,
        students: confirmed,
        categories,
    }))
}
