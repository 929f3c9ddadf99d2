use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::{json::Json, Deserialize, Serialize};
use rocket::State;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::Teacher;
use crate::db::{
    create_student, find_student, get_student, list_enrolled_students, update_student, NewStudent,
    StudentUpdate,
};
use crate::models::Student;
use crate::validation::{
    validate_phone_number, validate_postal_code, AppErrorExt, JsonValidateExt, ValidationResponse,
};

#[derive(Serialize, Deserialize, Debug)]
pub struct StudentData {
    pub student_id: String,
    pub last_name: String,
    pub first_name: String,
    pub postal_code: String,
    pub address1: String,
    pub address2: Option<String>,
    pub phone_number: String,
    pub ent_year: i64,
    pub class_id: String,
    pub absence_days: f64,
    pub enrolled: bool,
}

impl From<Student> for StudentData {
    fn from(student: Student) -> Self {
        Self {
            student_id: student.student_id,
            last_name: student.last_name,
            first_name: student.first_name,
            postal_code: student.postal_code,
            address1: student.address1,
            address2: student.address2,
            phone_number: student.phone_number,
            ent_year: student.ent_year,
            class_id: student.class_id,
            absence_days: student.absence_days,
            enrolled: student.enrolled,
        }
    }
}

#[derive(Deserialize, Validate, Clone)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    pub ent_year: i64,
    #[validate(length(min = 1, message = "Class code is required"))]
    pub class_id: String,
    #[validate(custom(function = validate_postal_code))]
    pub postal_code: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address1: String,
    pub address2: Option<String>,
    #[validate(custom(function = validate_phone_number))]
    pub phone_number: String,
}

#[get("/students")]
pub async fn api_list_students(
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<StudentData>>, Status> {
    let students = list_enrolled_students(db).await?;

    Ok(Json(students.into_iter().map(StudentData::from).collect()))
}

#[post("/students", data = "<request>")]
pub async fn api_create_student(
    request: Json<CreateStudentRequest>,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<StudentData>>, Custom<Json<ValidationResponse>>> {
    let validated = request.validate_custom()?;

    let new = NewStudent {
        last_name: validated.last_name,
        first_name: validated.first_name,
        postal_code: validated.postal_code,
        address1: validated.address1,
        address2: validated.address2,
        phone_number: validated.phone_number,
        ent_year: validated.ent_year,
        class_id: validated.class_id,
    };

    let student = create_student(db, &new).await.validate_custom()?;

    Ok(Custom(Status::Created, Json(StudentData::from(student))))
}

#[derive(Serialize, Deserialize)]
pub struct StudentDetailResponse {
    pub student: Option<StudentData>,
}

/// Missing or unknown ids produce an empty detail payload, not an error.
#[get("/students/detail?<student_id>")]
pub async fn api_student_detail(
    student_id: Option<String>,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<StudentDetailResponse>, Status> {
    let student = match student_id {
        Some(id) => find_student(db, &id).await?,
        None => None,
    };

    Ok(Json(StudentDetailResponse {
        student: student.map(StudentData::from),
    }))
}

/// The edit seed deliberately carries no absence field; the aggregate is not
/// editable through this flow.
#[derive(Serialize, Deserialize)]
pub struct StudentEditForm {
    pub student_id: String,
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

#[get("/students/<student_id>/edit")]
pub async fn api_student_edit_form(
    student_id: &str,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<StudentEditForm>, Status> {
    let student = get_student(db, student_id).await?;

    Ok(Json(StudentEditForm {
        student_id: student.student_id,
        last_name: student.last_name,
        first_name: student.first_name,
        postal_code: student.postal_code,
        address1: student.address1,
        address2: student.address2,
        phone_number: student.phone_number,
        ent_year: student.ent_year,
        class_id: student.class_id,
        enrolled: student.enrolled,
    }))
}

#[derive(Deserialize, Validate, Clone)]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    pub ent_year: i64,
    #[validate(length(min = 1, message = "Class code is required"))]
    pub class_id: String,
    #[validate(custom(function = validate_postal_code))]
    pub postal_code: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address1: String,
    pub address2: Option<String>,
    #[validate(custom(function = validate_phone_number))]
    pub phone_number: String,
    #[serde(default = "default_enrolled")]
    pub enrolled: bool,
    /// Where the edit came from; decides where the client goes next.
    pub return_to: Option<String>,
}

fn default_enrolled() -> bool {
    true
}

#[derive(Serialize, Deserialize)]
pub struct StudentUpdateResponse {
    pub student: StudentData,
    pub redirect_url: String,
}

#[put("/students/<student_id>", data = "<request>")]
pub async fn api_update_student(
    student_id: &str,
    request: Json<UpdateStudentRequest>,
    _teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<StudentUpdateResponse>, Custom<Json<ValidationResponse>>> {
    let validated = request.validate_custom()?;

    let update = StudentUpdate {
        last_name: validated.last_name,
        first_name: validated.first_name,
        postal_code: validated.postal_code,
        address1: validated.address1,
        address2: validated.address2,
        phone_number: validated.phone_number,
        ent_year: validated.ent_year,
        class_id: validated.class_id,
        enrolled: validated.enrolled,
    };

    let student = update_student(db, student_id, &update)
        .await
        .validate_custom()?;

    let redirect_url = match validated.return_to.as_deref() {
        Some("list") => "/ui/students".to_string(),
        _ => format!("/ui/students/detail?student_id={}", student.student_id),
    };

    Ok(Json(StudentUpdateResponse {
        student: StudentData::from(student),
        redirect_url,
    }))
}
