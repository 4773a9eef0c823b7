//! Attendance reports built from the roster: the daily sheet for one course
//! and a student's monthly history.

use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use shared::{AttendanceStatus, Course, CourseAttendanceSummary, MonthCursor, StudentAttendanceRow};
use tracing::debug;

use super::attendance_repository::AttendanceRepository;
use super::models::AttendanceRecord;

/// One student's records for a single month, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct StudentMonth {
    pub student_id: String,
    pub cursor: MonthCursor,
    pub records: Vec<AttendanceRecord>,
    pub present_days: usize,
    pub absent_days: usize,
}

/// Share of `count` in `total` as a whole percentage, rounding halves up
pub fn rounded_percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count * 200 + total) / (total * 2)) as u32
}

#[derive(Clone)]
pub struct ReportService {
    repository: AttendanceRepository,
}

impl ReportService {
    pub fn new(repository: AttendanceRepository) -> Self {
        Self { repository }
    }

    pub async fn daily_course_summary(
        &self,
        course: u32,
        division: &str,
        date: NaiveDate,
    ) -> CourseAttendanceSummary {
        let students = self.repository.get_students_by_course(course, division).await;

        let rows: Vec<StudentAttendanceRow> = students
            .iter()
            .map(|student| {
                let record = student.record_on(date);
                let status = match record {
                    Some(r) if r.present => AttendanceStatus::Present,
                    Some(_) => AttendanceStatus::Absent,
                    None => AttendanceStatus::NotRegistered,
                };
                StudentAttendanceRow {
                    student_id: student.id.clone(),
                    name: student.name.clone(),
                    status,
                    time: record.and_then(|r| r.time.clone()),
                }
            })
            .collect();

        let count = |status: AttendanceStatus| rows.iter().filter(|r| r.status == status).count();
        let total_students = rows.len();
        let present_count = count(AttendanceStatus::Present);
        let absent_count = count(AttendanceStatus::Absent);
        let not_registered_count = count(AttendanceStatus::NotRegistered);

        debug!(
            "Course {}-{} on {}: {} present, {} absent, {} not registered",
            course, division, date, present_count, absent_count, not_registered_count
        );

        CourseAttendanceSummary {
            course: Course::new(course, division),
            date: date.format("%Y-%m-%d").to_string(),
            total_students,
            present_count,
            absent_count,
            not_registered_count,
            present_percentage: rounded_percentage(present_count, total_students),
            absent_percentage: rounded_percentage(absent_count, total_students),
            not_registered_percentage: rounded_percentage(not_registered_count, total_students),
            rows,
        }
    }

    /// `Ok(None)` when the student is not on the roster
    pub async fn monthly_history(
        &self,
        student_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Option<StudentMonth>> {
        if !(1..=12).contains(&month) {
            return Err(anyhow!("Invalid month {}, expected 1-12", month));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(anyhow!("Year {} is out of range", year));
        }

        let Some(student) = self.repository.get_student(student_id).await else {
            return Ok(None);
        };

        let mut records: Vec<AttendanceRecord> = student
            .attendance_records
            .into_iter()
            .filter(|r| r.date.year() == year && r.date.month() == month)
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));

        let present_days = records.iter().filter(|r| r.present).count();
        let absent_days = records.len() - present_days;

        Ok(Some(StudentMonth {
            student_id: student.id,
            cursor: MonthCursor { year, month },
            records,
            present_days,
            absent_days,
        }))
    }
}
