//! Attendance repository: the in-memory roster and its mirrors.
//!
//! The roster is authoritative once loaded. Every write is attempted against
//! the remote store first (bounded by a timeout) and then applied to the
//! roster whatever the remote outcome was. Writes the remote store did not
//! accept are tagged `Pending` so `reconcile` can push them later. Callers
//! never see a remote failure.

use chrono::{DateTime, NaiveDate, Utc};
use shared::LoadSource;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::models::{AttendanceRecord, Student, SyncState};
use crate::storage::{AttendanceRow, LocalCache, RemoteStore, StoreError, StudentRow};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryState {
    Uninitialized,
    Loading,
    Ready,
}

impl RepositoryState {
    pub fn as_str(self) -> &'static str {
        match self {
            RepositoryState::Uninitialized => "uninitialized",
            RepositoryState::Loading => "loading",
            RepositoryState::Ready => "ready",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RepositoryOptions {
    /// Upper bound for each remote operation
    pub remote_timeout: Duration,
    /// Write the cache snapshot after every mutation
    pub auto_persist: bool,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(5),
            auto_persist: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    pub source: LoadSource,
    pub student_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub students_synced: usize,
    pub records_synced: usize,
    pub deletions_synced: usize,
    pub still_pending: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryStatus {
    pub state: RepositoryState,
    pub remote_backend: &'static str,
    pub student_count: usize,
    pub pending_students: usize,
    pub pending_records: usize,
    pub pending_deletions: usize,
}

impl RepositoryStatus {
    pub fn pending_total(&self) -> usize {
        self.pending_students + self.pending_records + self.pending_deletions
    }
}

struct Roster {
    students: Vec<Student>,
    state: RepositoryState,
    /// Students removed locally whose remote delete has not gone through
    pending_deletions: Vec<String>,
}

impl Roster {
    fn find_mut(&mut self, student_id: &str) -> Option<&mut Student> {
        self.students.iter_mut().find(|s| s.id == student_id)
    }
}

#[derive(Clone)]
pub struct AttendanceRepository {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<dyn LocalCache>,
    clock: Arc<dyn Clock>,
    options: RepositoryOptions,
    roster: Arc<RwLock<Roster>>,
}

impl AttendanceRepository {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        cache: Arc<dyn LocalCache>,
        clock: Arc<dyn Clock>,
        options: RepositoryOptions,
    ) -> Self {
        Self {
            remote,
            cache,
            clock,
            options,
            roster: Arc::new(RwLock::new(Roster {
                students: Vec::new(),
                state: RepositoryState::Uninitialized,
                pending_deletions: Vec::new(),
            })),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub async fn state(&self) -> RepositoryState {
        self.roster.read().await.state
    }

    /// Fetch the full roster from the remote store, falling back to the cache
    /// snapshot and then to an empty roster. Always ends in `Ready`.
    pub async fn load(&self) -> LoadOutcome {
        self.roster.write().await.state = RepositoryState::Loading;
        info!("Loading roster from {} store", self.remote.backend_name());

        let (students, source) = match self.fetch_remote_roster().await {
            Ok(students) => (students, LoadSource::Remote),
            Err(e) => {
                warn!("Remote load failed, falling back to local cache: {}", e);
                match self.cache.read_snapshot().await {
                    Ok(Some(students)) => (students, LoadSource::Cache),
                    Ok(None) => (Vec::new(), LoadSource::Empty),
                    Err(e) => {
                        warn!("Cache snapshot unreadable, starting with an empty roster: {}", e);
                        (Vec::new(), LoadSource::Empty)
                    }
                }
            }
        };

        let student_count = students.len();
        {
            let mut roster = self.roster.write().await;
            roster.students = students;
            if source == LoadSource::Remote {
                roster.pending_deletions.clear();
            }
            roster.state = RepositoryState::Ready;
        }

        // A fresh remote roster replaces whatever the cache held
        if source == LoadSource::Remote {
            self.save().await;
        }

        info!("Roster ready with {} students (source: {:?})", student_count, source);
        LoadOutcome { source, student_count }
    }

    /// Load again, e.g. after the remote store comes back
    pub async fn reload(&self) -> LoadOutcome {
        self.load().await
    }

    pub async fn add_student(&self, name: &str, course: u32, division: &str, dni: &str) -> Student {
        let mut student = Student {
            id: Student::generate_id(),
            name: name.to_string(),
            course,
            division: division.to_string(),
            dni: dni.to_string(),
            created_at: self.clock.now_utc(),
            attendance_records: Vec::new(),
            sync: SyncState::Synced,
        };

        let outcome = self
            .bounded("insert_student", self.remote.insert_student(&student_row(&student)))
            .await;
        if let Err(e) = &outcome {
            warn!("Remote insert of student {} failed, keeping it local: {}", student.id, e);
        }
        student.sync = SyncState::from_outcome(&outcome);

        self.roster.write().await.students.push(student.clone());
        info!("Added student {} ({}) to course {}-{}", student.name, student.id, course, division);

        self.after_mutation().await;
        student
    }

    pub async fn get_student(&self, id: &str) -> Option<Student> {
        self.roster
            .read()
            .await
            .students
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub async fn get_student_by_dni(&self, dni: &str) -> Option<Student> {
        self.roster
            .read()
            .await
            .students
            .iter()
            .find(|s| s.dni == dni)
            .cloned()
    }

    pub async fn list_students(&self) -> Vec<Student> {
        self.roster.read().await.students.clone()
    }

    /// Students of one course in roster order
    pub async fn get_students_by_course(&self, course: u32, division: &str) -> Vec<Student> {
        self.roster
            .read()
            .await
            .students
            .iter()
            .filter(|s| s.in_course(course, division))
            .cloned()
            .collect()
    }

    /// Mark a student present or absent today, at the current wall-clock time
    pub async fn mark_attendance(&self, student_id: &str, present: bool) {
        let today = self.clock.today();
        let time = self.clock.wall_time();
        self.mark_attendance_on(student_id, today, time, present).await
    }

    /// Upsert-by-date: overwrite the record for `date` or append a new one
    pub async fn mark_attendance_on(&self, student_id: &str, date: NaiveDate, time: String, present: bool) {
        let date_key = date.format(DATE_FORMAT).to_string();

        let outcome = self
            .bounded(
                "mark_attendance",
                self.push_mark(student_id, &date_key, present, Some(&time)),
            )
            .await;
        if let Err(e) = &outcome {
            warn!(
                "Remote attendance write for {} on {} failed, keeping it pending: {}",
                student_id, date_key, e
            );
        }

        let record = AttendanceRecord {
            date,
            present,
            time: Some(time),
            sync: SyncState::from_outcome(&outcome),
        };

        let updated = {
            let mut roster = self.roster.write().await;
            match roster.find_mut(student_id) {
                Some(student) => {
                    let appended = student.upsert_record(record);
                    debug!(
                        "{} attendance for {} on {} (present: {})",
                        if appended { "Recorded" } else { "Updated" },
                        student_id,
                        date_key,
                        present
                    );
                    true
                }
                None => {
                    warn!("Attendance marked for {} which is not on the roster", student_id);
                    false
                }
            }
        };

        if updated {
            self.after_mutation().await;
        }
    }

    /// Remove a student and, with it, all of their attendance records
    pub async fn delete_student(&self, id: &str) {
        let outcome = self.bounded("delete_student", self.push_delete(id)).await;

        let removed = {
            let mut roster = self.roster.write().await;
            let before = roster.students.len();
            roster.students.retain(|s| s.id != id);

            match &outcome {
                Ok(()) => roster.pending_deletions.retain(|p| p != id),
                Err(e) => {
                    warn!("Remote delete of student {} failed, will retry on reconcile: {}", id, e);
                    if !roster.pending_deletions.iter().any(|p| p == id) {
                        roster.pending_deletions.push(id.to_string());
                    }
                }
            }

            before != roster.students.len()
        };

        if removed {
            info!("Deleted student {}", id);
        } else {
            debug!("Delete requested for {} which is not on the roster", id);
        }

        self.after_mutation().await;
    }

    /// Write the roster to the local cache. Failures are logged only.
    pub async fn save(&self) {
        let students = self.roster.read().await.students.clone();
        if let Err(e) = self.cache.write_snapshot(&students).await {
            warn!("Failed to write roster snapshot: {}", e);
        }
    }

    /// Push every pending student, record and deletion to the remote store
    pub async fn reconcile(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let (pending_students, pending_deletions) = {
            let roster = self.roster.read().await;
            let students: Vec<Student> = roster
                .students
                .iter()
                .filter(|s| s.sync.is_pending())
                .cloned()
                .collect();
            (students, roster.pending_deletions.clone())
        };

        for student in &pending_students {
            match self
                .bounded("insert_student", self.remote.insert_student(&student_row(student)))
                .await
            {
                Ok(()) => {
                    if let Some(s) = self.roster.write().await.find_mut(&student.id) {
                        s.sync = SyncState::Synced;
                    }
                    report.students_synced += 1;
                }
                Err(e) => warn!("Student {} still not accepted by remote: {}", student.id, e),
            }
        }

        // Records of students the remote store does not know yet would be rejected
        let students = self.list_students().await;
        for student in students.iter().filter(|s| !s.sync.is_pending()) {
            for record in student.pending_records() {
                let date_key = record.date.format(DATE_FORMAT).to_string();
                let pushed = self
                    .bounded(
                        "mark_attendance",
                        self.push_mark(&student.id, &date_key, record.present, record.time.as_deref()),
                    )
                    .await;
                match pushed {
                    Ok(()) => {
                        self.mark_record_synced(&student.id, record).await;
                        report.records_synced += 1;
                    }
                    Err(e) => warn!(
                        "Attendance for {} on {} still not accepted by remote: {}",
                        student.id, date_key, e
                    ),
                }
            }
        }

        for id in &pending_deletions {
            match self.bounded("delete_student", self.push_delete(id)).await {
                Ok(()) => {
                    self.roster.write().await.pending_deletions.retain(|p| p != id);
                    report.deletions_synced += 1;
                }
                Err(e) => warn!("Delete of student {} still not accepted by remote: {}", id, e),
            }
        }

        report.still_pending = self.status().await.pending_total();
        self.after_mutation().await;

        info!(
            "Reconcile pushed {} students, {} records, {} deletions; {} still pending",
            report.students_synced, report.records_synced, report.deletions_synced, report.still_pending
        );
        report
    }

    pub async fn status(&self) -> RepositoryStatus {
        let roster = self.roster.read().await;
        RepositoryStatus {
            state: roster.state,
            remote_backend: self.remote.backend_name(),
            student_count: roster.students.len(),
            pending_students: roster.students.iter().filter(|s| s.sync.is_pending()).count(),
            pending_records: roster.students.iter().map(|s| s.pending_records().count()).sum(),
            pending_deletions: roster.pending_deletions.len(),
        }
    }

    async fn after_mutation(&self) {
        if self.options.auto_persist {
            self.save().await;
        }
    }

    /// Only flips the flag if the record still holds the values that were pushed
    async fn mark_record_synced(&self, student_id: &str, pushed: &AttendanceRecord) {
        let mut roster = self.roster.write().await;
        if let Some(student) = roster.find_mut(student_id) {
            if let Some(record) = student
                .attendance_records
                .iter_mut()
                .find(|r| r.date == pushed.date && r.present == pushed.present && r.time == pushed.time)
            {
                record.sync = SyncState::Synced;
            }
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.options.remote_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                operation,
                after_ms: self.options.remote_timeout.as_millis() as u64,
            }),
        }
    }

    async fn fetch_remote_roster(&self) -> Result<Vec<Student>, StoreError> {
        let student_rows = self
            .bounded("select_students", self.remote.select_students())
            .await?;
        let record_rows = self
            .bounded("select_attendance_records", self.remote.select_attendance_records())
            .await?;
        Ok(join_roster(student_rows, record_rows))
    }

    /// Check-then-write against the remote: update the day's row if it exists,
    /// otherwise insert a new one. Not atomic on the remote side.
    async fn push_mark(
        &self,
        student_id: &str,
        date: &str,
        present: bool,
        time: Option<&str>,
    ) -> Result<(), StoreError> {
        match self.remote.find_attendance_record(student_id, date).await? {
            Some(existing) => {
                self.remote
                    .update_attendance_record(&existing.id, present, time)
                    .await
            }
            None => {
                let row = AttendanceRow {
                    id: uuid::Uuid::new_v4().to_string(),
                    student_id: student_id.to_string(),
                    date: date.to_string(),
                    present,
                    time: time.map(|t| t.to_string()),
                    created_at: self.clock.now_utc().to_rfc3339(),
                };
                self.remote.insert_attendance_record(&row).await
            }
        }
    }

    async fn push_delete(&self, id: &str) -> Result<(), StoreError> {
        self.remote.delete_attendance_records_for_student(id).await?;
        self.remote.delete_student(id).await
    }
}

fn student_row(student: &Student) -> StudentRow {
    StudentRow {
        id: student.id.clone(),
        name: student.name.clone(),
        course: i64::from(student.course),
        division: student.division.clone(),
        dni: student.dni.clone(),
        created_at: student.created_at.to_rfc3339(),
    }
}

fn student_from_row(row: StudentRow) -> Option<Student> {
    let course = match u32::try_from(row.course) {
        Ok(course) => course,
        Err(_) => {
            warn!("Skipping student {} with invalid course {}", row.id, row.course);
            return None;
        }
    };
    let created_at = match DateTime::parse_from_rfc3339(&row.created_at) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(e) => {
            warn!("Student {} has unparsable created_at {:?}: {}", row.id, row.created_at, e);
            Utc::now()
        }
    };

    Some(Student {
        id: row.id,
        name: row.name,
        course,
        division: row.division,
        dni: row.dni,
        created_at,
        attendance_records: Vec::new(),
        sync: SyncState::Synced,
    })
}

/// Attach each attendance row to its student. Rows for unknown students or
/// with unparsable dates are skipped; duplicate dates collapse to the last row.
fn join_roster(student_rows: Vec<StudentRow>, record_rows: Vec<AttendanceRow>) -> Vec<Student> {
    let mut students: Vec<Student> = student_rows.into_iter().filter_map(student_from_row).collect();
    let index: HashMap<String, usize> = students
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.clone(), i))
        .collect();

    for row in record_rows {
        let Some(&position) = index.get(&row.student_id) else {
            debug!("Skipping attendance record {} for unknown student {}", row.id, row.student_id);
            continue;
        };
        let date = match NaiveDate::parse_from_str(&row.date, DATE_FORMAT) {
            Ok(date) => date,
            Err(e) => {
                warn!("Skipping attendance record {} with bad date {:?}: {}", row.id, row.date, e);
                continue;
            }
        };
        students[position].upsert_record(AttendanceRecord {
            date,
            present: row.present,
            time: row.time,
            sync: SyncState::Synced,
        });
    }

    students
}
