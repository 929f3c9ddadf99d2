#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod db;
mod env;
mod error;
mod models;
mod telemetry;
mod validation;
#[cfg(test)]
mod test;

use api::{
    api_attendance_insert, api_attendance_search, api_course_delete_confirm, api_create_course,
    api_create_student, api_create_subject, api_delete_course, api_delete_subject,
    api_list_courses, api_list_students, api_list_subjects, api_login, api_logout, api_me,
    api_me_unauthorized, api_register_teacher, api_score_execute, api_score_list,
    api_student_detail, api_student_edit_form, api_subject_delete_confirm, api_update_course,
    api_update_student, api_update_subject, health,
};
use auth::{forbidden_api, unauthorized_api};
use db::clean_expired_sessions;
use error::AppError;
use rocket::fairing::AdHoc;
use rocket::{tokio, Build, Rocket};
use telemetry::TelemetryFairing;
use thiserror::Error;

use sqlx::SqlitePool;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Figment(rocket::figment::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

impl From<rocket::figment::Error> for Error {
    fn from(value: rocket::figment::Error) -> Self {
        Error::Figment(value)
    }
}

#[launch]
async fn rocket() -> _ {
    telemetry::init_tracing();

    if let Err(e) = env::load_environment() {
        error!("Failed to load environment files: {}", e);
    }

    let database_url = std::env::var("DATABASE_URL").unwrap_or_default();

    let pool = SqlitePool::connect(&database_url)
        .await
        .expect("Failed to connect to SQLite database");

    let pool_clone = pool.clone();

    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool_clone).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
        }
    });

    info!("Running database migrations...");
    match sqlx::migrate!("./migrations").run(&pool).await {
        Ok(_) => info!("Migrations completed successfully"),
        Err(e) => {
            error!("Failed to run migrations: {}", e);
            panic!("Database migration failed: {}", e);
        }
    }

    init_rocket(pool).await
}

pub async fn init_rocket(pool: SqlitePool) -> Rocket<Build> {
    info!("Starting school admin service");

    rocket::build()
        .manage(pool)
        .mount(
            "/api",
            routes![
                api_login,
                api_logout,
                api_me,
                api_me_unauthorized,
                api_register_teacher,
                api_list_students,
                api_create_student,
                api_student_detail,
                api_student_edit_form,
                api_update_student,
                api_attendance_search,
                api_attendance_insert,
                api_score_list,
                api_score_execute,
                api_list_courses,
                api_create_course,
                api_update_course,
                api_course_delete_confirm,
                api_delete_course,
                api_list_subjects,
                api_create_subject,
                api_update_subject,
                api_subject_delete_confirm,
                api_delete_subject,
            ],
        )
        .register("/api", catchers![unauthorized_api, forbidden_api])
        .mount("/api", routes![health])
        .attach(TelemetryFairing)
        .attach(AdHoc::on_shutdown("Telemetry shutdown", |_| {
            Box::pin(async {
                telemetry::shutdown_telemetry();
            })
        }))
}
