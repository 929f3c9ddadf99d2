use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::{json::Json, Deserialize, Serialize};
use rocket::State;
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use validator::Validate;

use crate::auth::Teacher;
use crate::db::{
    create_course, create_subject, delete_course, delete_subject, get_course, get_subject,
    list_courses, list_subjects, teacher_name_lookup, update_course, update_subject,
};
use crate::models::{Course, Subject};
use crate::validation::{AppErrorExt, JsonValidateExt, ValidationResponse};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CourseData {
    pub class_id: String,
    pub course_name: String,
    pub teacher_id: Option<i64>,
}

impl From<Course> for CourseData {
    fn from(course: Course) -> Self {
        Self {
            class_id: course.class_id,
            course_name: course.course_name,
            teacher_id: course.teacher_id,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubjectData {
    pub subject_id: String,
    pub subject_name: String,
}

impl From<Subject> for SubjectData {
    fn from(subject: Subject) -> Self {
        Self {
            subject_id: subject.subject_id,
            subject_name: subject.subject_name,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct CourseListResponse {
    pub courses: Vec<CourseData>,
    /// teacher_id -> teacher_name for rendering the owning teacher column.
    pub teachers: HashMap<i64, String>,
}

#[get("/courses")]
pub async fn api_list_courses(
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<CourseListResponse>, Status> {
    let courses = list_courses(db).await?;
    let teachers = teacher_name_lookup(db).await?;

    Ok(Json(CourseListResponse {
        courses: courses.into_iter().map(CourseData::from).collect(),
        teachers,
    }))
}

#[derive(Deserialize, Validate, Clone)]
pub struct CreateCourseRequest {
    #[validate(length(min = 3, max = 3, message = "Class code must be exactly 3 characters"))]
    pub class_id: String,
    #[validate(length(min = 1, message = "Course name is required"))]
    pub course_name: String,
    pub teacher_id: Option<i64>,
}

#[post("/courses", data = "<request>")]
pub async fn api_create_course(
    request: Json<CreateCourseRequest>,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    let validated = request.validate_custom()?;

    create_course(
        db,
        &validated.class_id,
        &validated.course_name,
        validated.teacher_id,
    )
    .await
    .validate_custom()?;

    Ok(Status::Created)
}

#[derive(Deserialize, Validate, Clone)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, message = "Course name is required"))]
    pub course_name: String,
    pub teacher_id: Option<i64>,
}

#[put("/courses/<class_id>", data = "<request>")]
pub async fn api_update_course(
    class_id: &str,
    request: Json<UpdateCourseRequest>,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    let validated = request.validate_custom()?;

    update_course(db, class_id, &validated.course_name, validated.teacher_id)
        .await
        .validate_custom()?;

    Ok(Status::Ok)
}

/// The confirmation step of the two-step delete: shows what would be
/// removed without removing anything.
#[get("/courses/<class_id>/delete")]
pub async fn api_course_delete_confirm(
    class_id: &str,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<CourseData>, Status> {
    let course = get_course(db, class_id).await?;

    Ok(Json(CourseData::from(course)))
}

#[delete("/courses/<class_id>")]
pub async fn api_delete_course(
    class_id: &str,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    delete_course(db, class_id).await.validate_custom()?;

    Ok(Status::Ok)
}

#[get("/subjects")]
pub async fn api_list_subjects(
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<SubjectData>>, Status> {
    let subjects = list_subjects(db).await?;

    Ok(Json(subjects.into_iter().map(SubjectData::from).collect()))
}

#[derive(Deserialize, Validate, Clone)]
pub struct CreateSubjectRequest {
    #[validate(length(min = 1, max = 10, message = "Subject code must be 1 to 10 characters"))]
    pub subject_id: String,
    #[validate(length(min = 1, message = "Subject name is required"))]
    pub subject_name: String,
}

#[post("/subjects", data = "<request>")]
pub async fn api_create_subject(
    request: Json<CreateSubjectRequest>,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    let validated = request.validate_custom()?;

    create_subject(db, &validated.subject_id, &validated.subject_name)
        .await
        .validate_custom()?;

    Ok(Status::Created)
}

#[derive(Deserialize, Validate, Clone)]
pub struct UpdateSubjectRequest {
    #[validate(length(min = 1, message = "Subject name is required"))]
    pub subject_name: String,
}

#[put("/subjects/<subject_id>", data = "<request>")]
pub async fn api_update_subject(
    subject_id: &str,
    request: Json<UpdateSubjectRequest>,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    let validated = request.validate_custom()?;

    update_subject(db, subject_id, &validated.subject_name)
        .await
        .validate_custom()?;

    Ok(Status::Ok)
}

#[get("/subjects/<subject_id>/delete")]
pub async fn api_subject_delete_confirm(
    subject_id: &str,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<SubjectData>, Status> {
    let subject = get_subject(db, subject_id).await?;

    Ok(Json(SubjectData::from(subject)))
}

#[delete("/subjects/<subject_id>")]
pub async fn api_delete_subject(
    subject_id: &str,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    delete_subject(db, subject_id).await.validate_custom()?;

    Ok(Status::Ok)
}
