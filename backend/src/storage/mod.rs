//! # Storage Module
//!
//! Persistence for the attendance tracker. Two kinds of storage sit behind
//! traits so the domain never knows which one it is talking to:
//!
//! - **Remote store**: the hosted relational backend holding the `students`
//!   and `attendance_records` collections. Implemented over SQLite (sqlx) and
//!   over the hosted REST protocol (reqwest).
//! - **Local cache**: a single durable slot with the last known roster, used
//!   when the remote store cannot be reached.

pub mod cache;
pub mod db;
pub mod error;
pub mod postgrest;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

pub use cache::JsonFileCache;
pub use db::SqliteRemoteStore;
pub use error::{CacheError, StoreError};
pub use postgrest::PostgrestRemoteStore;
pub use traits::{AttendanceRow, LocalCache, RemoteStore, StudentRow};
