use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::{json::Json, Deserialize, Serialize};
use rocket::State;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Teacher, TeacherSession};
use crate::db::{authenticate_teacher, create_teacher, create_teacher_session, invalidate_session};
use crate::validation::{
    AppErrorExt, JsonValidateExt, PermissionCheckExt, ValidationResponse,
};

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    teacher_id: i64,
    password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub teacher: Option<TeacherData>,
    pub error: Option<String>,
    pub redirect_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TeacherData {
    pub teacher_id: i64,
    pub teacher_name: String,
    pub class_id: Option<String>,
    pub is_staff: bool,
}

impl From<Teacher> for TeacherData {
    fn from(teacher: Teacher) -> Self {
        Self {
            teacher_id: teacher.teacher_id,
            teacher_name: teacher.teacher_name.clone(),
            class_id: teacher.class_id.clone(),
            is_staff: teacher.is_staff,
        }
    }
}

#[post("/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    cookies: &rocket::http::CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<LoginResponse>, Custom<Json<ValidationResponse>>> {
    use chrono::Utc;
    use rocket::http::{Cookie, SameSite};

    let validated = login.validate_custom()?;

    match authenticate_teacher(db, validated.teacher_id, &validated.password)
        .await
        .validate_custom()?
    {
        Ok(teacher) => {
            let token = TeacherSession::generate_token();
            let expires_at = Utc::now() + chrono::Duration::hours(1);

            create_teacher_session(db, teacher.teacher_id, &token, expires_at.naive_utc())
                .await
                .validate_custom()?;

            let cookie = Cookie::build(("session_token", token))
                .same_site(SameSite::Lax)
                .http_only(true)
                .max_age(rocket::time::Duration::hours(1));
            cookies.add_private(cookie);

            cookies.add_private(
                Cookie::build(("teacher_id", teacher.teacher_id.to_string()))
                    .same_site(SameSite::Lax)
                    .http_only(true)
                    .max_age(rocket::time::Duration::hours(1)),
            );

            cookies.add_private(
                Cookie::build(("logged_in", teacher.teacher_name.clone()))
                    .same_site(SameSite::Lax)
                    .max_age(rocket::time::Duration::hours(1)),
            );

            Ok(Json(LoginResponse {
                success: true,
                teacher: Some(TeacherData::from(teacher)),
                error: None,
                redirect_url: Some("/ui/home".to_string()),
            }))
        }
        Err(failure) => Ok(Json(LoginResponse {
            success: false,
            teacher: None,
            error: Some(failure.message().to_string()),
            redirect_url: None,
        })),
    }
}

#[derive(Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
    pub redirect_url: String,
}

#[post("/logout")]
pub async fn api_logout(
    cookies: &rocket::http::CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Json<LogoutResponse> {
    let token = cookies
        .get_private("session_token")
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        let _ = invalidate_session(db, &token).await;
    }

    cookies.remove_private(rocket::http::Cookie::build("session_token"));
    cookies.remove_private(rocket::http::Cookie::build("teacher_id"));
    cookies.remove_private(rocket::http::Cookie::build("logged_in"));

    Json(LogoutResponse {
        message: "Logged out".to_string(),
        redirect_url: "/ui/login".to_string(),
    })
}

#[get("/me")]
pub async fn api_me(teacher: Teacher) -> Json<TeacherData> {
    Json(TeacherData::from(teacher))
}

#[get("/me", rank = 2)]
pub async fn api_me_unauthorized() -> Status {
    Status::Unauthorized
}

#[derive(Deserialize, Validate, Clone)]
pub struct RegisterTeacherRequest {
    teacher_id: i64,
    #[validate(length(min = 1, message = "Teacher name is required"))]
    teacher_name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password: String,
    class_id: Option<String>,
    #[serde(default)]
    is_staff: bool,
}

#[post("/teachers", data = "<registration>")]
pub async fn api_register_teacher(
    registration: Json<RegisterTeacherRequest>,
    teacher: Teacher,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, Custom<Json<ValidationResponse>>> {
    teacher.require_staff().validate_custom()?;

    let validated = registration.validate_custom()?;

    create_teacher(
        db,
        validated.teacher_id,
        &validated.teacher_name,
        &validated.password,
        validated.class_id.as_deref(),
        validated.is_staff,
    )
    .await
    .validate_custom()?;

    Ok(Status::Created)
}
