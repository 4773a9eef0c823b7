//! # Storage Traits
//!
//! The repository only talks to storage through these traits, so the hosted
//! backend and the offline snapshot can be swapped out (or faked in tests)
//! without touching the attendance rules.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::{CacheError, StoreError};
use crate::domain::models::Student;

/// A row of the remote `students` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRow {
    pub id: String,
    pub name: String,
    pub course: i64,
    pub division: String,
    pub dni: String,
    pub created_at: String, // RFC 3339
}

/// A row of the remote `attendance_records` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRow {
    pub id: String,
    pub student_id: String,
    pub date: String, // YYYY-MM-DD
    pub present: bool,
    #[serde(default)]
    pub time: Option<String>,
    pub created_at: String, // RFC 3339
}

/// Operations used against the hosted store
///
/// Inserting a student whose id already exists must succeed without changing
/// the stored row, so that pushing a pending student twice is harmless.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Short name for logs and status output
    fn backend_name(&self) -> &'static str;

    async fn select_students(&self) -> Result<Vec<StudentRow>, StoreError>;

    async fn select_attendance_records(&self) -> Result<Vec<AttendanceRow>, StoreError>;

    async fn insert_student(&self, row: &StudentRow) -> Result<(), StoreError>;

    /// Find the record for a student on a date (equality filter on both columns)
    async fn find_attendance_record(
        &self,
        student_id: &str,
        date: &str,
    ) -> Result<Option<AttendanceRow>, StoreError>;

    async fn insert_attendance_record(&self, row: &AttendanceRow) -> Result<(), StoreError>;

    async fn update_attendance_record(
        &self,
        id: &str,
        present: bool,
        time: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn delete_attendance_records_for_student(&self, student_id: &str) -> Result<(), StoreError>;

    async fn delete_student(&self, id: &str) -> Result<(), StoreError>;
}

/// Durable slot holding the last known roster
#[async_trait]
pub trait LocalCache: Send + Sync {
    /// Returns `None` when nothing has been cached yet
    async fn read_snapshot(&self) -> Result<Option<Vec<Student>>, CacheError>;

    async fn write_snapshot(&self, students: &[Student]) -> Result<(), CacheError>;
}
