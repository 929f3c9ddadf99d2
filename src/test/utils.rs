#[cfg(test)]
pub mod test_db {
    use crate::db::{create_course, create_student, create_subject, create_teacher, NewStudent};
    use crate::error::AppError;
    use sqlx::{Pool, Sqlite, SqlitePool};
    use std::sync::Once;
    use tracing::log::LevelFilter;

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";

    pub struct TestTeacher {
        pub teacher_id: i64,
        pub teacher_name: String,
        pub class_id: Option<String>,
        pub is_staff: bool,
        pub password: String,
    }

    pub struct TestCourse {
        pub class_id: String,
        pub course_name: String,
        pub teacher_id: Option<i64>,
    }

    pub struct TestSubject {
        pub subject_id: String,
        pub subject_name: String,
    }

    pub struct TestStudent {
        pub last_name: String,
        pub first_name: String,
        pub ent_year: i64,
        pub class_id: String,
    }

    #[derive(Default)]
    pub struct TestDbBuilder {
        teachers: Vec<TestTeacher>,
        courses: Vec<TestCourse>,
        subjects: Vec<TestSubject>,
        students: Vec<TestStudent>,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn teacher(mut self, teacher_id: i64, teacher_name: &str) -> Self {
            self.teachers.push(TestTeacher {
                teacher_id,
                teacher_name: teacher_name.to_string(),
                class_id: None,
                is_staff: false,
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn staff_teacher(mut self, teacher_id: i64, teacher_name: &str) -> Self {
            self.teachers.push(TestTeacher {
                teacher_id,
                teacher_name: teacher_name.to_string(),
                class_id: None,
                is_staff: true,
                password: STANDARD_PASSWORD.to_string(),
            });
            self
        }

        pub fn course(
            mut self,
            class_id: &str,
            course_name: &str,
            teacher_id: Option<i64>,
        ) -> Self {
            self.courses.push(TestCourse {
                class_id: class_id.to_string(),
                course_name: course_name.to_string(),
                teacher_id,
            });
            self
        }

        pub fn subject(mut self, subject_id: &str, subject_name: &str) -> Self {
            self.subjects.push(TestSubject {
                subject_id: subject_id.to_string(),
                subject_name: subject_name.to_string(),
            });
            self
        }

        pub fn student(
            mut self,
            last_name: &str,
            first_name: &str,
            ent_year: i64,
            class_id: &str,
        ) -> Self {
            self.students.push(TestStudent {
                last_name: last_name.to_string(),
                first_name: first_name.to_string(),
                ent_year,
                class_id: class_id.to_string(),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder()
                    .filter_level(LevelFilter::Debug)
                    .is_test(true)
                    .try_init();
            });

            let pool = SqlitePool::connect("sqlite::memory:").await?;

            sqlx::migrate!("./migrations").run(&pool).await?;

            for teacher in &self.teachers {
                create_teacher(
                    &pool,
                    teacher.teacher_id,
                    &teacher.teacher_name,
                    &teacher.password,
                    teacher.class_id.as_deref(),
                    teacher.is_staff,
                )
                .await?;
            }

            for course in &self.courses {
                create_course(&pool, &course.class_id, &course.course_name, course.teacher_id)
                    .await?;
            }

            for subject in &self.subjects {
                create_subject(&pool, &subject.subject_id, &subject.subject_name).await?;
            }

            let mut student_ids = Vec::new();
            for student in &self.students {
                let new = NewStudent {
                    last_name: student.last_name.clone(),
                    first_name: student.first_name.clone(),
                    postal_code: "3800921".to_string(),
                    address1: "123 Kurita, Nagano".to_string(),
                    address2: None,
                    phone_number: "09012345678".to_string(),
                    ent_year: student.ent_year,
                    class_id: student.class_id.clone(),
                };
                let created = create_student(&pool, &new).await?;
                student_ids.push(created.student_id);
            }

            Ok(TestDb { pool, student_ids })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        /// Ids of the seeded students, in insertion order.
        pub student_ids: Vec<String>,
    }

    impl TestDb {
        pub fn student_id(&self, index: usize) -> &str {
            &self.student_ids[index]
        }
    }
}

#[cfg(test)]
pub mod test_utils {
    pub use super::test_db::{TestDb, TestDbBuilder, STANDARD_PASSWORD};

    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;
    use serde_json::json;

    /// One staff and one regular teacher, two courses, two subjects, and two
    /// students in class 101 of entry year 2024.
    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .staff_teacher(1001, "Tanaka Hiroshi")
            .teacher(1002, "Sato Yuki")
            .course("101", "Systems Development", Some(1001))
            .course("102", "Network Engineering", Some(1002))
            .subject("A01", "Mathematics")
            .subject("B01", "English")
            .student("Nagano", "Taro", 2024, "101")
            .student("Suzuki", "Hanako", 2024, "101")
            .build()
            .await
            .expect("Failed to build test database")
    }

    pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
        let rocket = crate::init_rocket(test_db.pool.clone()).await;
        let client = Client::tracked(rocket)
            .await
            .expect("Failed to build test client");
        (client, test_db)
    }

    /// Logs in through the API. The tracked client keeps the session cookies,
    /// so subsequent requests on the same client are authenticated.
    pub async fn login_test_teacher(client: &Client, teacher_id: i64, password: &str) {
        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "teacher_id": teacher_id,
                    "password": password
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
    }
}
