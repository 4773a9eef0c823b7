pub mod student_mapper;
pub mod sync_mapper;

pub use student_mapper::StudentMapper;
pub use sync_mapper::SyncMapper;
