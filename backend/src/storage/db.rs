use async_trait::async_trait;
use sqlx::{migrate::MigrateDatabase, sqlite::SqliteRow, Row, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::info;

use super::error::StoreError;
use super::traits::{AttendanceRow, RemoteStore, StudentRow};

/// Remote store backed by a SQLite database with the hosted schema
#[derive(Clone)]
pub struct SqliteRemoteStore {
    pool: Arc<SqlitePool>,
}

impl SqliteRemoteStore {
    /// Open (creating if needed) the database at `url` and set up the schema
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePool::connect(url).await?;

        Self::setup_schema(&pool).await?;
        info!("Connected to SQLite store at {}", url);

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Initialize a test database with a unique name
    #[cfg(test)]
    pub async fn init_test() -> Result<Self, StoreError> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);

        Self::new(&db_url).await
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS students (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                course INTEGER NOT NULL,
                division TEXT NOT NULL,
                dni TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS attendance_records (
                id TEXT PRIMARY KEY,
                student_id TEXT NOT NULL,
                date TEXT NOT NULL,
                present BOOLEAN NOT NULL,
                time TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (student_id) REFERENCES students (id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Lookups by (student_id, date) on every mark
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_attendance_records_student_date
            ON attendance_records(student_id, date);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    fn student_from_row(r: &SqliteRow) -> Result<StudentRow, StoreError> {
        Ok(StudentRow {
            id: r.try_get("id")?,
            name: r.try_get("name")?,
            course: r.try_get("course")?,
            division: r.try_get("division")?,
            dni: r.try_get("dni")?,
            created_at: r.try_get("created_at")?,
        })
    }

    fn attendance_from_row(r: &SqliteRow) -> Result<AttendanceRow, StoreError> {
        Ok(AttendanceRow {
            id: r.try_get("id")?,
            student_id: r.try_get("student_id")?,
            date: r.try_get("date")?,
            present: r.try_get("present")?,
            time: r.try_get("time")?,
            created_at: r.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl RemoteStore for SqliteRemoteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn select_students(&self) -> Result<Vec<StudentRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, course, division, dni, created_at
            FROM students
            ORDER BY ROWID ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(Self::student_from_row).collect()
    }

    async fn select_attendance_records(&self) -> Result<Vec<AttendanceRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, student_id, date, present, time, created_at
            FROM attendance_records
            ORDER BY ROWID ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(Self::attendance_from_row).collect()
    }

    async fn insert_student(&self, row: &StudentRow) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO students (id, name, course, division, dni, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&row.id)
        .bind(&row.name)
        .bind(row.course)
        .bind(&row.division)
        .bind(&row.dni)
        .bind(&row.created_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn find_attendance_record(
        &self,
        student_id: &str,
        date: &str,
    ) -> Result<Option<AttendanceRow>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, student_id, date, present, time, created_at
            FROM attendance_records
            WHERE student_id = ? AND date = ?
            LIMIT 1
            "#,
        )
        .bind(student_id)
        .bind(date)
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref().map(Self::attendance_from_row).transpose()
    }

    async fn insert_attendance_record(&self, row: &AttendanceRow) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO attendance_records (id, student_id, date, present, time, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.student_id)
        .bind(&row.date)
        .bind(row.present)
        .bind(&row.time)
        .bind(&row.created_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn update_attendance_record(
        &self,
        id: &str,
        present: bool,
        time: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE attendance_records SET present = ?, time = ? WHERE id = ?")
            .bind(present)
            .bind(time)
            .bind(id)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn delete_attendance_records_for_student(&self, student_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM attendance_records WHERE student_id = ?")
            .bind(student_id)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn delete_student(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student_row(id: &str) -> StudentRow {
        StudentRow {
            id: id.to_string(),
            name: "Ana".to_string(),
            course: 3,
            division: "II".to_string(),
            dni: "12345678".to_string(),
            created_at: "2024-03-01T10:00:00+00:00".to_string(),
        }
    }

    fn attendance_row(id: &str, student_id: &str, date: &str, present: bool) -> AttendanceRow {
        AttendanceRow {
            id: id.to_string(),
            student_id: student_id.to_string(),
            date: date.to_string(),
            present,
            time: Some("08:00:00".to_string()),
            created_at: "2024-03-04T11:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_select_students() {
        let store = SqliteRemoteStore::init_test().await.expect("Failed to create test database");

        store.insert_student(&student_row("s1")).await.unwrap();
        store.insert_student(&student_row("s2")).await.unwrap();

        let students = store.select_students().await.unwrap();
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].id, "s1");
        assert_eq!(students[1].id, "s2");
        assert_eq!(students[0].course, 3);
    }

    #[tokio::test]
    async fn test_insert_student_twice_is_harmless() {
        let store = SqliteRemoteStore::init_test().await.expect("Failed to create test database");

        store.insert_student(&student_row("s1")).await.unwrap();
        let mut renamed = student_row("s1");
        renamed.name = "Other".to_string();
        store.insert_student(&renamed).await.unwrap();

        let students = store.select_students().await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].name, "Ana");
    }

    #[tokio::test]
    async fn test_find_and_update_attendance_record() {
        let store = SqliteRemoteStore::init_test().await.expect("Failed to create test database");
        store.insert_student(&student_row("s1")).await.unwrap();
        store
            .insert_attendance_record(&attendance_row("r1", "s1", "2024-03-04", true))
            .await
            .unwrap();

        let found = store.find_attendance_record("s1", "2024-03-04").await.unwrap();
        assert_eq!(found.as_ref().map(|r| r.id.as_str()), Some("r1"));
        assert!(store.find_attendance_record("s1", "2024-03-05").await.unwrap().is_none());

        store.update_attendance_record("r1", false, Some("09:15:00")).await.unwrap();
        let updated = store.find_attendance_record("s1", "2024-03-04").await.unwrap().unwrap();
        assert!(!updated.present);
        assert_eq!(updated.time.as_deref(), Some("09:15:00"));
    }

    #[tokio::test]
    async fn test_cascade_delete() {
        let store = SqliteRemoteStore::init_test().await.expect("Failed to create test database");
        store.insert_student(&student_row("s1")).await.unwrap();
        store.insert_student(&student_row("s2")).await.unwrap();
        store
            .insert_attendance_record(&attendance_row("r1", "s1", "2024-03-04", true))
            .await
            .unwrap();
        store
            .insert_attendance_record(&attendance_row("r2", "s2", "2024-03-04", false))
            .await
            .unwrap();

        store.delete_attendance_records_for_student("s1").await.unwrap();
        store.delete_student("s1").await.unwrap();

        let students = store.select_students().await.unwrap();
        assert_eq!(students.len(), 1);
        let records = store.select_attendance_records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].student_id, "s2");
    }

    #[tokio::test]
    async fn test_record_for_unknown_student_is_rejected() {
        let store = SqliteRemoteStore::init_test().await.expect("Failed to create test database");

        let result = store
            .insert_attendance_record(&attendance_row("r1", "ghost", "2024-03-04", true))
            .await;
        assert!(result.is_err());
    }
}
