//! # REST API for Marking Attendance
//!
//! Marking a student present or absent for today, and resolving scanned
//! payloads to a student before marking.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use tracing::{info, warn};

use super::mappers::StudentMapper;
use super::{api_error, student_not_found, ApiError};
use crate::domain::ScanError;
use crate::AppState;
use shared::{MarkAttendanceRequest, ScanRequest, Student, StudentResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/students/:id/attendance", post(mark_attendance))
        .route("/scan", post(resolve_scan))
}

/// Mark a student present or absent today; a second mark the same day overwrites the first
pub async fn mark_attendance(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(request): Json<MarkAttendanceRequest>,
) -> Result<Json<StudentResponse>, ApiError> {
    info!("POST /api/students/{}/attendance - request: {:?}", student_id, request);

    if state.repository.get_student(&student_id).await.is_none() {
        return Err(student_not_found(&student_id));
    }

    state
        .repository
        .mark_attendance(&student_id, request.present)
        .await;

    // Deleted between the check and the mark
    let student = state
        .repository
        .get_student(&student_id)
        .await
        .ok_or_else(|| student_not_found(&student_id))?;
    let message = format!(
        "{} marked {}",
        student.name,
        if request.present { "present" } else { "absent" }
    );

    Ok(Json(StudentMapper::to_student_response(student, message)))
}

/// Resolve a scanned or typed payload to the student it identifies
pub async fn resolve_scan(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<Student>, ApiError> {
    info!("POST /api/scan - payload: {:?}", request.payload);

    match state.scan_service.resolve(&request.payload).await {
        Ok(student) => Ok(Json(StudentMapper::to_dto(student))),
        Err(e @ ScanError::InvalidFormat(_)) => {
            warn!("Rejected scan payload: {}", e);
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string(), "INVALID_SCAN"))
        }
        Err(e @ ScanError::NotFound(_)) => {
            Err(api_error(StatusCode::NOT_FOUND, e.to_string(), "STUDENT_NOT_FOUND"))
        }
    }
}
