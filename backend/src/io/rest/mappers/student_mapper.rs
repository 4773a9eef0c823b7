use crate::domain::commands::students::AddStudentCommand;
use crate::domain::models::{AttendanceRecord as DomainRecord, Student as DomainStudent};
use shared::{
    AttendanceRecord as SharedRecord, CreateStudentRequest, Student as SharedStudent,
    StudentListResponse, StudentResponse,
};

/// Mapper to convert between shared student DTOs and domain models.
pub struct StudentMapper;

impl StudentMapper {
    pub fn record_to_dto(domain: DomainRecord) -> SharedRecord {
        SharedRecord {
            date: domain.date.format("%Y-%m-%d").to_string(),
            present: domain.present,
            time: domain.time,
            synced: !domain.sync.is_pending(),
        }
    }

    pub fn to_dto(domain: DomainStudent) -> SharedStudent {
        SharedStudent {
            id: domain.id,
            name: domain.name,
            course: domain.course,
            division: domain.division,
            dni: domain.dni,
            attendance_records: domain
                .attendance_records
                .into_iter()
                .map(Self::record_to_dto)
                .collect(),
            created_at: domain.created_at.to_rfc3339(),
            synced: !domain.sync.is_pending(),
        }
    }

    pub fn to_student_list_dto(students: Vec<DomainStudent>) -> StudentListResponse {
        StudentListResponse {
            students: students.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_student_response(domain: DomainStudent, success_message: String) -> StudentResponse {
        StudentResponse {
            student: Self::to_dto(domain),
            success_message,
        }
    }

    pub fn to_command(request: CreateStudentRequest) -> AddStudentCommand {
        AddStudentCommand {
            name: request.name,
            course: request.course,
            division: request.division,
            dni: request.dni,
        }
    }
}
