//! Remote store speaking the hosted backend's REST protocol.
//!
//! Tables live under `{base_url}/rest/v1/{table}`. Filters are query
//! parameters of the form `column=eq.value`, and every request carries the
//! project key both as `apikey` and as a bearer token. Full-table selects
//! are paged with `limit`/`offset` because the server silently caps the
//! number of rows in one response.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

use super::error::StoreError;
use super::traits::{AttendanceRow, RemoteStore, StudentRow};

const STUDENTS_TABLE: &str = "students";
const ATTENDANCE_TABLE: &str = "attendance_records";
const PAGE_SIZE: usize = 1000;

pub struct PostgrestRemoteStore {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    page_size: usize,
}

impl PostgrestRemoteStore {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
            page_size: PAGE_SIZE,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    fn headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|e| StoreError::Unavailable(format!("invalid api key header: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| StoreError::Unavailable(format!("invalid auth header: {e}")))?;
        headers.insert(HeaderName::from_static("apikey"), key);
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }

    fn write_headers(&self, prefer: &'static str) -> Result<HeaderMap, StoreError> {
        let mut headers = self.headers()?;
        headers.insert(HeaderName::from_static("prefer"), HeaderValue::from_static(prefer));
        Ok(headers)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    /// Every row of `table`, oldest first. A page shorter than `page_size`
    /// may still be capped by the server, so only an empty page ends the scan.
    async fn select_all<T: serde::de::DeserializeOwned>(&self, table: &str) -> Result<Vec<T>, StoreError> {
        let mut rows: Vec<T> = Vec::new();
        loop {
            let response = self
                .client
                .get(self.table_url(table))
                .headers(self.headers()?)
                .query(&[
                    ("select", "*".to_string()),
                    ("order", "created_at.asc,id.asc".to_string()),
                    ("limit", self.page_size.to_string()),
                    ("offset", rows.len().to_string()),
                ])
                .send()
                .await?;
            let page: Vec<T> = Self::decode(Self::check(response).await?).await?;
            if page.is_empty() {
                break;
            }
            debug!("GET {} page at offset {} returned {} rows", table, rows.len(), page.len());
            rows.extend(page);
        }
        Ok(rows)
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreError> {
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

fn eq_filter(value: &str) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl RemoteStore for PostgrestRemoteStore {
    fn backend_name(&self) -> &'static str {
        "postgrest"
    }

    #[instrument(name = "postgrest_select_students", skip(self))]
    async fn select_students(&self) -> Result<Vec<StudentRow>, StoreError> {
        self.select_all(STUDENTS_TABLE).await
    }

    #[instrument(name = "postgrest_select_attendance", skip(self))]
    async fn select_attendance_records(&self) -> Result<Vec<AttendanceRow>, StoreError> {
        self.select_all(ATTENDANCE_TABLE).await
    }

    async fn insert_student(&self, row: &StudentRow) -> Result<(), StoreError> {
        debug!("POST {} id={}", STUDENTS_TABLE, row.id);
        let response = self
            .client
            .post(self.table_url(STUDENTS_TABLE))
            .headers(self.write_headers("return=minimal,resolution=ignore-duplicates")?)
            .query(&[("on_conflict", "id")])
            .json(row)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn find_attendance_record(
        &self,
        student_id: &str,
        date: &str,
    ) -> Result<Option<AttendanceRow>, StoreError> {
        let response = self
            .client
            .get(self.table_url(ATTENDANCE_TABLE))
            .headers(self.headers()?)
            .query(&[
                ("select", "*".to_string()),
                ("student_id", eq_filter(student_id)),
                ("date", eq_filter(date)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<AttendanceRow> = Self::decode(Self::check(response).await?).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_attendance_record(&self, row: &AttendanceRow) -> Result<(), StoreError> {
        debug!("POST {} student_id={} date={}", ATTENDANCE_TABLE, row.student_id, row.date);
        let response = self
            .client
            .post(self.table_url(ATTENDANCE_TABLE))
            .headers(self.write_headers("return=minimal")?)
            .json(row)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update_attendance_record(
        &self,
        id: &str,
        present: bool,
        time: Option<&str>,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .patch(self.table_url(ATTENDANCE_TABLE))
            .headers(self.write_headers("return=minimal")?)
            .query(&[("id", eq_filter(id))])
            .json(&json!({ "present": present, "time": time }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_attendance_records_for_student(&self, student_id: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.table_url(ATTENDANCE_TABLE))
            .headers(self.write_headers("return=minimal")?)
            .query(&[("student_id", eq_filter(student_id))])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_student(&self, id: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.table_url(STUDENTS_TABLE))
            .headers(self.write_headers("return=minimal")?)
            .query(&[("id", eq_filter(id))])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
