#[cfg(test)]
mod tests {
    use crate::api::{
        AttendanceInsertResponse, AttendanceSearchResponse, CourseListResponse, LoginResponse,
        ScoreExecuteResponse, ScoreListResponse, StudentData, StudentDetailResponse,
        StudentEditForm, StudentUpdateResponse, SubjectData, TeacherData,
    };
    use crate::test::test_utils::{
        create_standard_test_db, login_test_teacher, setup_test_client, STANDARD_PASSWORD,
    };
    use rocket::http::{ContentType, Cookie, Status};
    use serde_json::json;

    #[rocket::async_test]
    async fn test_login_api() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "teacher_id": 1001,
                    "password": STANDARD_PASSWORD
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let login_response: LoginResponse = serde_json::from_str(&body).unwrap();

        assert!(login_response.success);
        let teacher = login_response.teacher.expect("Teacher data missing");
        assert_eq!(teacher.teacher_id, 1001);
        assert_eq!(teacher.teacher_name, "Tanaka Hiroshi");
        assert!(teacher.is_staff);
        assert_eq!(login_response.redirect_url.as_deref(), Some("/ui/home"));
    }

    #[rocket::async_test]
    async fn test_login_failures_are_distinguished() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "teacher_id": 9999,
                    "password": STANDARD_PASSWORD
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let login_response: LoginResponse = serde_json::from_str(&body).unwrap();
        assert!(!login_response.success);
        assert_eq!(login_response.error.as_deref(), Some("Unknown teacher id"));

        let response = client
            .post("/api/login")
            .header(ContentType::JSON)
            .body(
                json!({
                    "teacher_id": 1001,
                    "password": "wrong_password"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let login_response: LoginResponse = serde_json::from_str(&body).unwrap();
        assert!(!login_response.success);
        assert_eq!(login_response.error.as_deref(), Some("Incorrect password"));
    }

    #[rocket::async_test]
    async fn test_auth_required_apis() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let endpoints = vec![
            "/api/me",
            "/api/students",
            "/api/attendance/search",
            "/api/scores",
            "/api/courses",
            "/api/subjects",
        ];

        for endpoint in endpoints {
            let response = client.get(endpoint).dispatch().await;
            assert_eq!(
                response.status(),
                Status::Unauthorized,
                "Endpoint {} did not require authentication",
                endpoint
            );
        }
    }

    #[rocket::async_test]
    async fn test_api_session_security() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let forged_cookie = Cookie::build(("session_token", "fake_token")).build();

        let response = client
            .get("/api/me")
            .private_cookie(forged_cookie)
            .dispatch()
            .await;

        assert_eq!(
            response.status(),
            Status::Unauthorized,
            "Forged session token was accepted"
        );

        login_test_teacher(&client, 1001, STANDARD_PASSWORD).await;

        let response = client.get("/api/me").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().await.unwrap();
        let me: TeacherData = serde_json::from_str(&body).unwrap();
        assert_eq!(me.teacher_id, 1001);
    }

    #[rocket::async_test]
    async fn test_logout_ends_session() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_teacher(&client, 1002, STANDARD_PASSWORD).await;

        let response = client.get("/api/me").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.post("/api/logout").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.get("/api/me").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn test_register_teacher_requires_staff() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let registration = json!({
            "teacher_id": 1003,
            "teacher_name": "Yamada Kenji",
            "password": "password123"
        })
        .to_string();

        login_test_teacher(&client, 1002, STANDARD_PASSWORD).await;

        let response = client
            .post("/api/teachers")
            .header(ContentType::JSON)
            .body(registration.clone())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);

        let response = client.post("/api/logout").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        login_test_teacher(&client, 1001, STANDARD_PASSWORD).await;

        let response = client
            .post("/api/teachers")
            .header(ContentType::JSON)
            .body(registration.clone())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);

        // The same id twice is a conflict.
        let response = client
            .post("/api/teachers")
            .header(ContentType::JSON)
            .body(registration)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Conflict);

        // The new account can log in.
        let response = client.post("/api/logout").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        login_test_teacher(&client, 1003, "password123").await;
    }

    #[rocket::async_test]
    async fn test_student_registration_flow() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_teacher(&client, 1001, STANDARD_PASSWORD).await;

        let response = client
            .post("/api/students")
            .header(ContentType::JSON)
            .body(
                json!({
                    "last_name": "Takahashi",
                    "first_name": "Kenta",
                    "ent_year": 2025,
                    "class_id": "102",
                    "postal_code": "3800921",
                    "address1": "456 Wakasato, Nagano",
                    "phone_number": "07011112222"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Created);
        let body = response.into_string().await.unwrap();
        let created: StudentData = serde_json::from_str(&body).unwrap();
        assert_eq!(created.student_id, "0000000003");
        assert_eq!(created.absence_days, 0.0);
        assert!(created.enrolled);

        let response = client.get("/api/students").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let students: Vec<StudentData> = serde_json::from_str(&body).unwrap();
        assert_eq!(students.len(), 3);

        let response = client
            .get("/api/students/detail?student_id=0000000003")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let detail: StudentDetailResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(
            detail.student.expect("Student missing").last_name,
            "Takahashi"
        );

        // Unknown and missing ids both produce an empty payload.
        let response = client
            .get("/api/students/detail?student_id=0000009999")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let detail: StudentDetailResponse = serde_json::from_str(&body).unwrap();
        assert!(detail.student.is_none());
    }

    #[rocket::async_test]
    async fn test_student_registration_validation() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_teacher(&client, 1001, STANDARD_PASSWORD).await;

        let response = client
            .post("/api/students")
            .header(ContentType::JSON)
            .body(
                json!({
                    "last_name": "",
                    "first_name": "Kenta",
                    "ent_year": 2025,
                    "class_id": "102",
                    "postal_code": "380-0921",
                    "address1": "456 Wakasato, Nagano",
                    "phone_number": "0261234567"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::UnprocessableEntity);
        let body = response.into_string().await.unwrap();
        let errors: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(errors["status"], "error");
        assert!(errors["errors"].get("last_name").is_some());
        assert!(errors["errors"].get("postal_code").is_some());
        assert!(errors["errors"].get("phone_number").is_some());

        // Nothing was persisted.
        let response = client.get("/api/students").dispatch().await;
        let body = response.into_string().await.unwrap();
        let students: Vec<StudentData> = serde_json::from_str(&body).unwrap();
        assert_eq!(students.len(), 2);
    }

    #[rocket::async_test]
    async fn test_student_edit_flow() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;
        let student_id = test_db.student_id(0).to_string();

        login_test_teacher(&client, 1001, STANDARD_PASSWORD).await;

        let response = client
            .get(format!("/api/students/{}/edit", student_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let form: StudentEditForm = serde_json::from_str(&body).unwrap();
        assert_eq!(form.student_id, student_id);
        assert_eq!(form.last_name, "Nagano");

        let response = client
            .put(format!("/api/students/{}", student_id))
            .header(ContentType::JSON)
            .body(
                json!({
                    "last_name": form.last_name,
                    "first_name": "Ichiro",
                    "ent_year": form.ent_year,
                    "class_id": "102",
                    "postal_code": form.postal_code,
                    "address1": form.address1,
                    "phone_number": form.phone_number,
                    "enrolled": true,
                    "return_to": "list"
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let updated: StudentUpdateResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(updated.student.first_name, "Ichiro");
        assert_eq!(updated.student.class_id, "102");
        assert_eq!(updated.redirect_url, "/ui/students");

        // Editing an unknown student is a 404.
        let response = client
            .put("/api/students/0000009999")
            .header(ContentType::JSON)
            .body(
                json!({
                    "last_name": "Ghost",
                    "first_name": "Nobody",
                    "ent_year": 2024,
                    "class_id": "101",
                    "postal_code": "3800921",
                    "address1": "Nowhere",
                    "phone_number": "09012345678"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_attendance_flow() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;
        let first = test_db.student_id(0).to_string();
        let second = test_db.student_id(1).to_string();

        login_test_teacher(&client, 1001, STANDARD_PASSWORD).await;

        let response = client
            .get("/api/attendance/search?year=2024&class=101")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let search: AttendanceSearchResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(search.students.len(), 2);
        assert_eq!(search.courses.len(), 2);
        assert_eq!(search.years.len(), 21);
        assert_eq!(search.selected_year, Some(2024));

        // Without a selection the student list is empty, not an error.
        let response = client.get("/api/attendance/search").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let search: AttendanceSearchResponse = serde_json::from_str(&body).unwrap();
        assert!(search.students.is_empty());
        assert_eq!(search.courses.len(), 2);

        let response = client
            .post("/api/attendance")
            .header(ContentType::JSON)
            .body(
                json!({
                    "date": "2026-04-10",
                    "entries": [
                        { "student_id": first, "category": 1 },
                        { "student_id": second, "category": 0 }
                    ]
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let inserted: AttendanceInsertResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(inserted.students.len(), 2);
        assert_eq!(inserted.students[0].absence_days, 1.0);
        assert_eq!(inserted.students[1].absence_days, 0.0);
        assert_eq!(inserted.categories.get(&1).map(String::as_str), Some("Absent"));

        // An out-of-range category is rejected before anything is written.
        let response = client
            .post("/api/attendance")
            .header(ContentType::JSON)
            .body(
                json!({
                    "date": "2026-04-11",
                    "entries": [{ "student_id": first, "category": 7 }]
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn test_score_flow() {
        let test_db = create_standard_test_db().await;
        let (client, test_db) = setup_test_client(test_db).await;
        let first = test_db.student_id(0).to_string();
        let second = test_db.student_id(1).to_string();

        login_test_teacher(&client, 1001, STANDARD_PASSWORD).await;

        let response = client
            .post("/api/scores")
            .header(ContentType::JSON)
            .body(
                json!({
                    "class_id": "101",
                    "ent_year": 2024,
                    "subject_id": "A01",
                    "entries": [
                        { "student_id": first, "score": 72 },
                        { "student_id": second, "score": null }
                    ]
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let executed: ScoreExecuteResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(executed.students.len(), 2);
        assert_eq!(executed.scores.len(), 1);
        assert_eq!(executed.scores[0].student_id, first);
        assert_eq!(executed.scores[0].score, 72);
        assert_eq!(
            executed.subjects.get("A01").map(String::as_str),
            Some("Mathematics")
        );

        let response = client
            .get("/api/scores?year=2024&class=101&subject=A01")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let listed: ScoreListResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(listed.scores.len(), 1);
        assert_eq!(listed.selected_subject.as_deref(), Some("A01"));

        // An unknown subject aborts the whole batch.
        let response = client
            .post("/api/scores")
            .header(ContentType::JSON)
            .body(
                json!({
                    "class_id": "101",
                    "ent_year": 2024,
                    "subject_id": "Z99",
                    "entries": [{ "student_id": first, "score": 50 }]
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_catalog_flow() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        login_test_teacher(&client, 1001, STANDARD_PASSWORD).await;

        let response = client
            .post("/api/courses")
            .header(ContentType::JSON)
            .body(
                json!({
                    "class_id": "103",
                    "course_name": "Web Design",
                    "teacher_id": 1002
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);

        // Class codes are exactly three characters.
        let response = client
            .post("/api/courses")
            .header(ContentType::JSON)
            .body(
                json!({
                    "class_id": "10",
                    "course_name": "Too Short"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);

        let response = client.get("/api/courses").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        let listed: CourseListResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(listed.courses.len(), 3);
        assert_eq!(
            listed.teachers.get(&1002).map(String::as_str),
            Some("Sato Yuki")
        );

        // Two-step delete: the confirmation is read-only.
        let response = client.get("/api/courses/103/delete").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let response = client.get("/api/courses").dispatch().await;
        let body = response.into_string().await.unwrap();
        let listed: CourseListResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(listed.courses.len(), 3);

        let response = client.delete("/api/courses/103").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        // A course with students refuses to go.
        let response = client.delete("/api/courses/101").dispatch().await;
        assert_eq!(response.status(), Status::Conflict);

        let response = client
            .post("/api/subjects")
            .header(ContentType::JSON)
            .body(
                json!({
                    "subject_id": "C01",
                    "subject_name": "Physics"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);

        let response = client
            .put("/api/subjects/C01")
            .header(ContentType::JSON)
            .body(json!({ "subject_name": "Applied Physics" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.get("/api/subjects").dispatch().await;
        let body = response.into_string().await.unwrap();
        let subjects: Vec<SubjectData> = serde_json::from_str(&body).unwrap();
        assert_eq!(subjects.len(), 3);
        assert!(subjects
            .iter()
            .any(|s| s.subject_name == "Applied Physics"));

        let response = client.delete("/api/subjects/C01").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn test_health_endpoint_is_public() {
        let test_db = create_standard_test_db().await;
        let (client, _) = setup_test_client(test_db).await;

        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await.unwrap(), "OK");
    }
}
