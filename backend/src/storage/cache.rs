use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::CacheError;
use super::traits::LocalCache;
use crate::domain::models::Student;

/// Local cache holding the roster as a JSON array in a single file
#[derive(Clone)]
pub struct JsonFileCache {
    path: PathBuf,
}

impl JsonFileCache {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LocalCache for JsonFileCache {
    async fn read_snapshot(&self) -> Result<Option<Vec<Student>>, CacheError> {
        if !self.path.exists() {
            debug!("No cache snapshot at {:?}", self.path);
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let students: Vec<Student> = serde_json::from_str(&content)?;
        info!("Read {} students from cache snapshot {:?}", students.len(), self.path);
        Ok(Some(students))
    }

    async fn write_snapshot(&self, students: &[Student]) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string(students)?;

        // Atomic write using temp file
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;

        debug!("Wrote {} students to cache snapshot {:?}", students.len(), self.path);
        Ok(())
    }
}
