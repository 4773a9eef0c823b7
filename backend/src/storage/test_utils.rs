//! In-memory storage doubles shared by the domain and REST tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use super::error::{CacheError, StoreError};
use super::traits::{AttendanceRow, LocalCache, RemoteStore, StudentRow};
use crate::domain::models::Student;

/// Remote store kept in memory, with switches to simulate an outage
#[derive(Default)]
pub struct MemoryRemoteStore {
    students: Mutex<Vec<StudentRow>>,
    records: Mutex<Vec<AttendanceRow>>,
    failing: AtomicBool,
    hanging: AtomicBool,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that fails every call until `set_failing(false)`
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every call sleeps for an hour before answering
    pub fn set_hanging(&self, hanging: bool) {
        self.hanging.store(hanging, Ordering::SeqCst);
    }

    pub async fn student_rows(&self) -> Vec<StudentRow> {
        self.students.lock().await.clone()
    }

    pub async fn attendance_rows(&self) -> Vec<AttendanceRow> {
        self.records.lock().await.clone()
    }

    pub async fn seed_student(&self, row: StudentRow) {
        self.students.lock().await.push(row);
    }

    pub async fn seed_record(&self, row: AttendanceRow) {
        self.records.lock().await.push(row);
    }

    async fn gate(&self) -> Result<(), StoreError> {
        if self.hanging.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn select_students(&self) -> Result<Vec<StudentRow>, StoreError> {
        self.gate().await?;
        Ok(self.students.lock().await.clone())
    }

    async fn select_attendance_records(&self) -> Result<Vec<AttendanceRow>, StoreError> {
        self.gate().await?;
        Ok(self.records.lock().await.clone())
    }

    async fn insert_student(&self, row: &StudentRow) -> Result<(), StoreError> {
        self.gate().await?;
        let mut students = self.students.lock().await;
        if !students.iter().any(|s| s.id == row.id) {
            students.push(row.clone());
        }
        Ok(())
    }

    async fn find_attendance_record(
        &self,
        student_id: &str,
        date: &str,
    ) -> Result<Option<AttendanceRow>, StoreError> {
        self.gate().await?;
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|r| r.student_id == student_id && r.date == date)
            .cloned())
    }

    async fn insert_attendance_record(&self, row: &AttendanceRow) -> Result<(), StoreError> {
        self.gate().await?;
        let student_exists = self.students.lock().await.iter().any(|s| s.id == row.student_id);
        if !student_exists {
            return Err(StoreError::Rejected {
                status: 409,
                body: format!("student {} does not exist", row.student_id),
            });
        }
        self.records.lock().await.push(row.clone());
        Ok(())
    }

    async fn update_attendance_record(
        &self,
        id: &str,
        present: bool,
        time: Option<&str>,
    ) -> Result<(), StoreError> {
        self.gate().await?;
        if let Some(record) = self.records.lock().await.iter_mut().find(|r| r.id == id) {
            record.present = present;
            record.time = time.map(|t| t.to_string());
        }
        Ok(())
    }

    async fn delete_attendance_records_for_student(&self, student_id: &str) -> Result<(), StoreError> {
        self.gate().await?;
        self.records.lock().await.retain(|r| r.student_id != student_id);
        Ok(())
    }

    async fn delete_student(&self, id: &str) -> Result<(), StoreError> {
        self.gate().await?;
        self.students.lock().await.retain(|s| s.id != id);
        Ok(())
    }
}

/// Local cache kept in memory
#[derive(Default)]
pub struct MemoryCache {
    snapshot: Mutex<Option<Vec<Student>>>,
    writes: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(students: Vec<Student>) -> Self {
        Self {
            snapshot: Mutex::new(Some(students)),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Option<Vec<Student>> {
        self.snapshot.lock().await.clone()
    }
}

#[async_trait]
impl LocalCache for MemoryCache {
    async fn read_snapshot(&self) -> Result<Option<Vec<Student>>, CacheError> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn write_snapshot(&self, students: &[Student]) -> Result<(), CacheError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.snapshot.lock().await = Some(students.to_vec());
        Ok(())
    }
}
