pub mod student;

pub use student::{AttendanceRecord, Student, SyncState};
