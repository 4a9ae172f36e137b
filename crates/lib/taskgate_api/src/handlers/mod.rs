//! Request handlers.

pub mod auth;
pub mod ping;
pub mod tasks;
