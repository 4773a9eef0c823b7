use serde::{Deserialize, Serialize};
use std::fmt;
use chrono::Datelike;

/// Divisions offered within every course year
pub const DIVISIONS: [&str; 3] = ["I", "II", "III"];

/// Course years the school runs
pub const YEARS: [u32; 6] = [1, 2, 3, 4, 5, 6];

/// Represents a student on the roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    /// Course year (grade level)
    pub course: u32,
    /// Section label within the course, e.g. "II"
    pub division: String,
    /// National ID, printed on the student's QR card
    pub dni: String,
    pub attendance_records: Vec<AttendanceRecord>,
    pub created_at: String, // RFC 3339 timestamp
    /// False while the remote store has not confirmed this student
    pub synced: bool,
}

/// A single day of attendance for one student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub date: String, // ISO 8601 date format (YYYY-MM-DD)
    pub present: bool,
    pub time: Option<String>, // Local wall-clock time (HH:MM:SS)
    pub synced: bool,
}

/// A (year, division) pair used to group students
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Course {
    pub year: u32,
    pub division: String,
}

impl Course {
    pub fn new(year: u32, division: impl Into<String>) -> Self {
        Self {
            year,
            division: division.into(),
        }
    }

    /// Stable key for the course, e.g. "3-II"
    pub fn key(&self) -> String {
        format!("{}-{}", self.year, self.division)
    }

    /// Whether the course is one of the known year/division combinations
    pub fn is_known(&self) -> bool {
        YEARS.contains(&self.year) && DIVISIONS.contains(&self.division.as_str())
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}° \"{}\"", self.year, self.division)
    }
}

/// Request for registering a new student
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateStudentRequest {
    pub name: String,
    pub course: u32,
    pub division: String,
    pub dni: String,
}

/// Response after registering a student
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentResponse {
    pub student: Student,
    pub success_message: String,
}

/// Response containing a list of students
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentListResponse {
    pub students: Vec<Student>,
}

/// Request for marking a student present or absent today
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkAttendanceRequest {
    pub present: bool,
}

/// Request carrying a raw payload read by the QR scanner or typed by staff
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanRequest {
    pub payload: String,
}

/// Attendance status of a student on a given day
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AttendanceStatus {
    Present,
    Absent,
    NotRegistered,
}

/// One row of the daily attendance sheet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentAttendanceRow {
    pub student_id: String,
    pub name: String,
    pub status: AttendanceStatus,
    pub time: Option<String>,
}

/// Daily attendance sheet for one course
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseAttendanceSummary {
    pub course: Course,
    pub date: String, // ISO 8601 date format (YYYY-MM-DD)
    pub total_students: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub not_registered_count: usize,
    pub present_percentage: u32,
    pub absent_percentage: u32,
    pub not_registered_percentage: u32,
    pub rows: Vec<StudentAttendanceRow>,
}

/// Month/year pair used to page through attendance history
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthCursor {
    pub year: i32,
    pub month: u32, // 1 = January
}

impl Default for MonthCursor {
    fn default() -> Self {
        let now = chrono::Local::now();
        Self {
            year: now.year(),
            month: now.month(),
        }
    }
}

impl MonthCursor {
    /// Month before this one; stays put at the lowest representable year
    pub fn previous(self) -> Self {
        if self.month <= 1 {
            self.year
                .checked_sub(1)
                .map_or(self, |year| Self { year, month: 12 })
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    /// Month after this one; stays put at the highest representable year
    pub fn next(self) -> Self {
        if self.month >= 12 {
            self.year
                .checked_add(1)
                .map_or(self, |year| Self { year, month: 1 })
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }
}

/// A student's attendance records for one month, newest first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyHistory {
    pub student_id: String,
    pub cursor: MonthCursor,
    pub previous: MonthCursor,
    pub next: MonthCursor,
    pub records: Vec<AttendanceRecord>,
    pub present_days: usize,
    pub absent_days: usize,
}

/// Where the roster came from on the last load
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Cache,
    Empty,
}

/// Response after (re)loading the roster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadResponse {
    pub source: LoadSource,
    pub student_count: usize,
}

/// Outcome of pushing unsynced changes to the remote store
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReconcileResponse {
    pub students_synced: usize,
    pub records_synced: usize,
    pub deletions_synced: usize,
    pub still_pending: usize,
}

/// Snapshot of the roster and its sync backlog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub state: String,
    pub remote_backend: String,
    pub student_count: usize,
    pub pending_students: usize,
    pub pending_records: usize,
    pub pending_deletions: usize,
}

/// Error body returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
