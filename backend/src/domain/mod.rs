//! # Domain Module
//!
//! Business logic for the attendance tracker, independent of the HTTP layer
//! and of which remote store is configured.
//!
//! ## Module Organization
//!
//! - **attendance_repository**: the roster, its remote mirror and local cache,
//!   and the upsert-by-date attendance rule
//! - **scan**: turns scanned or typed payloads into students
//! - **report_service**: daily course sheets and monthly student history
//! - **clock**: source of today's date and the marking time
//! - **commands**: validated inputs coming from the REST layer
//!
//! ## Business Rules
//!
//! - A student has at most one attendance record per calendar date; marking
//!   again the same day overwrites it
//! - "Today" and the marking time are taken from the local wall clock
//! - Remote failures never fail an operation; the change stays local and is
//!   tagged pending until reconciled

pub mod attendance_repository;
pub mod clock;
pub mod commands;
pub mod models;
pub mod report_service;
pub mod scan;

pub use attendance_repository::{
    AttendanceRepository, LoadOutcome, ReconcileReport, RepositoryOptions, RepositoryState,
    RepositoryStatus,
};
pub use clock::{Clock, SystemClock};
pub use report_service::{ReportService, StudentMonth};
pub use scan::{ScanError, ScanService};
