//! Scan boundary: turns a raw scanned or typed payload into a student.
//!
//! Payloads are either a bare identifier (DNI or student id) or a URL whose
//! last path segment is the identifier, which is what the printed QR codes
//! carry.

use tracing::{debug, info};

use super::attendance_repository::AttendanceRepository;
use super::models::Student;

const MAX_TOKEN_LEN: usize = 64;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("Unrecognized scan payload: {0}")]
    InvalidFormat(String),
    #[error("No student matches {0}")]
    NotFound(String),
}

/// Extract the lookup token from a scan payload
pub fn normalize_scan_payload(raw: &str) -> Result<String, ScanError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScanError::InvalidFormat("empty payload".to_string()));
    }

    let token = match strip_scheme(trimmed) {
        Some(rest) => last_path_segment(rest)
            .ok_or_else(|| ScanError::InvalidFormat(format!("no identifier in {}", trimmed)))?,
        None => trimmed,
    };

    if token.len() > MAX_TOKEN_LEN {
        return Err(ScanError::InvalidFormat(format!(
            "identifier longer than {} characters",
            MAX_TOKEN_LEN
        )));
    }
    if !token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ScanError::InvalidFormat(format!("unexpected characters in {}", token)));
    }

    Ok(token.to_string())
}

fn strip_scheme(payload: &str) -> Option<&str> {
    let lower = payload.to_ascii_lowercase();
    ["https://", "http://"]
        .iter()
        .find(|scheme| lower.starts_with(*scheme))
        .map(|scheme| &payload[scheme.len()..])
}

/// Last non-empty path segment after the host, ignoring query and fragment
fn last_path_segment(without_scheme: &str) -> Option<&str> {
    let end = without_scheme.find(['?', '#']).unwrap_or(without_scheme.len());
    without_scheme[..end]
        .split('/')
        .skip(1)
        .filter(|segment| !segment.is_empty())
        .last()
}

#[derive(Clone)]
pub struct ScanService {
    repository: AttendanceRepository,
}

impl ScanService {
    pub fn new(repository: AttendanceRepository) -> Self {
        Self { repository }
    }

    /// Resolve a payload by DNI first, then by student id
    pub async fn resolve(&self, raw: &str) -> Result<Student, ScanError> {
        let token = normalize_scan_payload(raw)?;
        debug!("Resolving scan token {}", token);

        if let Some(student) = self.repository.get_student_by_dni(&token).await {
            info!("Scan matched student {} by DNI", student.id);
            return Ok(student);
        }
        if let Some(student) = self.repository.get_student(&token).await {
            info!("Scan matched student {} by id", student.id);
            return Ok(student);
        }

        Err(ScanError::NotFound(token))
    }
}
