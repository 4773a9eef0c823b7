//! # REST API Interface Layer
//!
//! HTTP endpoints for the attendance tracker, nested under `/api`.
//!
//! - Translates JSON requests into domain calls and domain results into
//!   `shared` DTOs through the mappers
//! - Performs the caller-side checks (blank fields, malformed dates)
//! - Reports failures as `{ "error", "code" }` JSON bodies

pub mod attendance_apis;
pub mod mappers;
pub mod report_apis;
pub mod student_apis;
pub mod sync_apis;

use axum::{http::StatusCode, response::Json, Router};
use shared::ErrorResponse;

use crate::AppState;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

pub fn student_not_found(student_id: &str) -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        format!("Student {} not found", student_id),
        "STUDENT_NOT_FOUND",
    )
}

/// All API routes, to be nested under `/api`
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(student_apis::router())
        .merge(attendance_apis::router())
        .merge(report_apis::router())
        .merge(sync_apis::router())
}
