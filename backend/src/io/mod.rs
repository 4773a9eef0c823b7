//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain. Currently only a REST
//! API built on axum.

pub mod rest;
