//! # REST API for Attendance Reports

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tracing::{error, info};

use super::mappers::SyncMapper;
use super::{api_error, student_not_found, ApiError};
use crate::AppState;
use shared::{CourseAttendanceSummary, MonthlyHistory};

// Query parameters for the daily course sheet
#[derive(Debug, Deserialize)]
pub struct DailySummaryQuery {
    pub date: Option<String>,
}

// Query parameters for a student's monthly history
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courses/:course/:division/attendance", get(course_attendance))
        .route("/students/:id/history", get(student_history))
}

/// Daily attendance sheet for a course; defaults to today
pub async fn course_attendance(
    State(state): State<AppState>,
    Path((course, division)): Path<(u32, String)>,
    Query(query): Query<DailySummaryQuery>,
) -> Result<Json<CourseAttendanceSummary>, ApiError> {
    info!("GET /api/courses/{}/{}/attendance - query: {:?}", course, division, query);

    let date = match query.date.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
            api_error(
                StatusCode::BAD_REQUEST,
                format!("Invalid date {:?}: {}", raw, e),
                "INVALID_DATE",
            )
        })?,
        None => state.repository.clock().today(),
    };

    Ok(Json(
        state
            .report_service
            .daily_course_summary(course, &division, date)
            .await,
    ))
}

/// A student's records for one month, newest first; defaults to the current month
pub async fn student_history(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<MonthlyHistory>, ApiError> {
    info!("GET /api/students/{}/history - query: {:?}", student_id, query);

    let today = state.repository.clock().today();
    let year = query.year.unwrap_or(today.year());
    let month = query.month.unwrap_or(today.month());

    match state
        .report_service
        .monthly_history(&student_id, year, month)
        .await
    {
        Ok(Some(history)) => Ok(Json(SyncMapper::to_history_dto(history))),
        Ok(None) => Err(student_not_found(&student_id)),
        Err(e) => {
            error!("Failed to build history for {}: {}", student_id, e);
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string(), "INVALID_MONTH"))
        }
    }
}
