//! Domain models for students and their attendance records.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Whether the remote store is known to hold the latest version of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SyncState {
    #[default]
    Synced,
    Pending,
}

impl SyncState {
    pub fn from_outcome<T, E>(outcome: &Result<T, E>) -> Self {
        if outcome.is_ok() {
            SyncState::Synced
        } else {
            SyncState::Pending
        }
    }

    pub fn is_pending(self) -> bool {
        self == SyncState::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub present: bool,
    pub time: Option<String>, // HH:MM:SS, local wall clock at marking
    #[serde(default)]
    pub sync: SyncState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub course: u32,
    pub division: String,
    pub dni: String,
    pub created_at: DateTime<Utc>,
    pub attendance_records: Vec<AttendanceRecord>,
    #[serde(default)]
    pub sync: SyncState,
}

impl Student {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn in_course(&self, course: u32, division: &str) -> bool {
        self.course == course && self.division == division
    }

    pub fn record_on(&self, date: NaiveDate) -> Option<&AttendanceRecord> {
        self.attendance_records.iter().find(|r| r.date == date)
    }

    /// Overwrites the record for `record.date` in place, or appends it.
    /// Returns true when a new record was appended.
    pub fn upsert_record(&mut self, record: AttendanceRecord) -> bool {
        match self.attendance_records.iter_mut().find(|r| r.date == record.date) {
            Some(existing) => {
                existing.present = record.present;
                existing.time = record.time;
                existing.sync = record.sync;
                false
            }
            None => {
                self.attendance_records.push(record);
                true
            }
        }
    }

    pub fn pending_records(&self) -> impl Iterator<Item = &AttendanceRecord> {
        self.attendance_records.iter().filter(|r| r.sync.is_pending())
    }
}
