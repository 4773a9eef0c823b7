//! # REST API for the Student Roster
//!
//! Endpoints for enrolling, looking up, listing and deleting students.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use tracing::{info, warn};

use super::mappers::StudentMapper;
use super::{api_error, student_not_found, ApiError};
use crate::AppState;
use shared::{CreateStudentRequest, Student, StudentListResponse, StudentResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route("/students/:id", get(get_student).delete(delete_student))
        .route("/dni/:dni", get(get_student_by_dni))
        .route("/courses/:course/:division/students", get(list_course_students))
}

/// List the whole roster in insertion order
pub async fn list_students(State(state): State<AppState>) -> Json<StudentListResponse> {
    info!("GET /api/students");
    let students = state.repository.list_students().await;
    Json(StudentMapper::to_student_list_dto(students))
}

/// Enroll a new student
pub async fn create_student(
    State(state): State<AppState>,
    Json(request): Json<CreateStudentRequest>,
) -> Result<(StatusCode, Json<StudentResponse>), ApiError> {
    info!("POST /api/students - course {}-{}", request.course, request.division);

    let command = StudentMapper::to_command(request).validated().map_err(|e| {
        warn!("Rejected new student: {}", e);
        api_error(StatusCode::BAD_REQUEST, e.to_string(), "INVALID_INPUT")
    })?;

    if let Some(existing) = state.repository.get_student_by_dni(&command.dni).await {
        warn!("Rejected new student: DNI already belongs to {}", existing.id);
        return Err(api_error(
            StatusCode::CONFLICT,
            "A student with this DNI is already enrolled",
            "DUPLICATE_DNI",
        ));
    }

    let student = state
        .repository
        .add_student(&command.name, command.course, &command.division, &command.dni)
        .await;
    info!("Created student {}", student.id);
    let message = format!("{} enrolled in {}-{}", student.name, student.course, student.division);

    Ok((
        StatusCode::CREATED,
        Json(StudentMapper::to_student_response(student, message)),
    ))
}

pub async fn get_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<Student>, ApiError> {
    info!("GET /api/students/{}", student_id);

    match state.repository.get_student(&student_id).await {
        Some(student) => Ok(Json(StudentMapper::to_dto(student))),
        None => Err(student_not_found(&student_id)),
    }
}

pub async fn get_student_by_dni(
    State(state): State<AppState>,
    Path(dni): Path<String>,
) -> Result<Json<Student>, ApiError> {
    info!("GET /api/dni/{}", dni);

    match state.repository.get_student_by_dni(&dni).await {
        Some(student) => Ok(Json(StudentMapper::to_dto(student))),
        None => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("No student with DNI {}", dni),
            "STUDENT_NOT_FOUND",
        )),
    }
}

/// Delete a student together with their attendance history
pub async fn delete_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    info!("DELETE /api/students/{}", student_id);

    if state.repository.get_student(&student_id).await.is_none() {
        return Err(student_not_found(&student_id));
    }
    state.repository.delete_student(&student_id).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_course_students(
    State(state): State<AppState>,
    Path((course, division)): Path<(u32, String)>,
) -> Json<StudentListResponse> {
    info!("GET /api/courses/{}/{}/students", course, division);
    let students = state.repository.get_students_by_course(course, &division).await;
    Json(StudentMapper::to_student_list_dto(students))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::MemoryRemoteStore;
    use crate::test_support::{self, body_json, get, post_json};
    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use serde_json::json;
    use shared::ErrorResponse;
    use std::sync::Arc;
    use tower::util::ServiceExt; // for `oneshot`

    async fn setup_test_app() -> (Router, AppState) {
        let state = test_support::app_state(Arc::new(MemoryRemoteStore::new())).await;
        (router().with_state(state.clone()), state)
    }

    #[tokio::test]
    async fn test_create_student() {
        let (app, state) = setup_test_app().await;

        let request = post_json(
            "/students",
            json!({ "name": "Ana", "course": 3, "division": "II", "dni": "12345678" }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let created: StudentResponse = body_json(response).await;
        assert_eq!(created.student.name, "Ana");
        assert!(created.student.attendance_records.is_empty());
        assert!(created.student.synced);
        assert!(state.repository.get_student(&created.student.id).await.is_some());
    }

    #[tokio::test]
    async fn test_create_student_rejects_blank_name() {
        let (app, state) = setup_test_app().await;

        let request = post_json(
            "/students",
            json!({ "name": "  ", "course": 3, "division": "II", "dni": "12345678" }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.code, "INVALID_INPUT");
        assert!(state.repository.list_students().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_student_rejects_duplicate_dni() {
        let (app, state) = setup_test_app().await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/students",
                json!({ "name": "Ana", "course": 3, "division": "II", "dni": "12345678" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let ana: StudentResponse = body_json(response).await;

        let response = app
            .oneshot(post_json(
                "/students",
                json!({ "name": "Bruno", "course": 4, "division": "I", "dni": " 12345678 " }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.code, "DUPLICATE_DNI");

        let students = state.repository.list_students().await;
        assert_eq!(students.len(), 1);
        assert_eq!(
            state.scan_service.resolve("12345678").await.unwrap().id,
            ana.student.id
        );
    }

    #[tokio::test]
    async fn test_create_student_rejects_unknown_course() {
        let (app, state) = setup_test_app().await;

        for body in [
            json!({ "name": "Ana", "course": 0, "division": "II", "dni": "1" }),
            json!({ "name": "Ana", "course": 99, "division": "II", "dni": "2" }),
            json!({ "name": "Ana", "course": 3, "division": "XYZ", "dni": "3" }),
        ] {
            let response = app.clone().oneshot(post_json("/students", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let error: ErrorResponse = body_json(response).await;
            assert_eq!(error.code, "INVALID_INPUT");
        }
        assert!(state.repository.list_students().await.is_empty());
    }

    #[tokio::test]
    async fn test_get_student_by_id_and_dni() {
        let (app, state) = setup_test_app().await;
        let ana = state.repository.add_student("Ana", 3, "II", "12345678").await;

        let response = app.clone().oneshot(get(&format!("/students/{}", ana.id))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let student: Student = body_json(response).await;
        assert_eq!(student.dni, "12345678");

        let response = app.clone().oneshot(get("/dni/12345678")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let student: Student = body_json(response).await;
        assert_eq!(student.id, ana.id);

        let response = app.oneshot(get("/students/missing")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.code, "STUDENT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_course_students() {
        let (app, state) = setup_test_app().await;
        state.repository.add_student("Ana", 3, "II", "1").await;
        state.repository.add_student("Bruno", 3, "I", "2").await;
        state.repository.add_student("Carla", 3, "II", "3").await;

        let response = app.clone().oneshot(get("/courses/3/II/students")).await.unwrap();
        let list: StudentListResponse = body_json(response).await;
        let names: Vec<&str> = list.students.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Carla"]);

        let response = app.clone().oneshot(get("/courses/5/III/students")).await.unwrap();
        let list: StudentListResponse = body_json(response).await;
        assert!(list.students.is_empty());

        let response = app.oneshot(get("/students")).await.unwrap();
        let list: StudentListResponse = body_json(response).await;
        assert_eq!(list.students.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_student() {
        let (app, state) = setup_test_app().await;
        let ana = state.repository.add_student("Ana", 3, "II", "12345678").await;

        let request = Request::builder()
            .method(Method::DELETE)
            .uri(format!("/students/{}", ana.id))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.repository.get_student(&ana.id).await.is_none());

        let request = Request::builder()
            .method(Method::DELETE)
            .uri(format!("/students/{}", ana.id))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
