use crate::domain::{LoadOutcome, ReconcileReport, RepositoryStatus, StudentMonth};
use shared::{LoadResponse, MonthlyHistory, ReconcileResponse, StatusResponse};

use super::student_mapper::StudentMapper;

/// Mapper for repository lifecycle and report results.
pub struct SyncMapper;

impl SyncMapper {
    pub fn to_load_dto(outcome: LoadOutcome) -> LoadResponse {
        LoadResponse {
            source: outcome.source,
            student_count: outcome.student_count,
        }
    }

    pub fn to_reconcile_dto(report: ReconcileReport) -> ReconcileResponse {
        ReconcileResponse {
            students_synced: report.students_synced,
            records_synced: report.records_synced,
            deletions_synced: report.deletions_synced,
            still_pending: report.still_pending,
        }
    }

    pub fn to_status_dto(status: RepositoryStatus) -> StatusResponse {
        StatusResponse {
            state: status.state.as_str().to_string(),
            remote_backend: status.remote_backend.to_string(),
            student_count: status.student_count,
            pending_students: status.pending_students,
            pending_records: status.pending_records,
            pending_deletions: status.pending_deletions,
        }
    }

    pub fn to_history_dto(month: StudentMonth) -> MonthlyHistory {
        MonthlyHistory {
            student_id: month.student_id,
            cursor: month.cursor,
            previous: month.cursor.previous(),
            next: month.cursor.next(),
            records: month
                .records
                .into_iter()
                .map(StudentMapper::record_to_dto)
                .collect(),
            present_days: month.present_days,
            absent_days: month.absent_days,
        }
    }
}
