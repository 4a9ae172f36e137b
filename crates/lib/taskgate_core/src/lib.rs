//! # taskgate_core
//!
//! Core domain logic for Taskgate: credentials, password-reset tokens,
//! access/refresh tokens, persistence and the per-user task list.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod notify;
pub mod store;
pub mod tasks;
pub mod uuid;
