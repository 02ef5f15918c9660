//! Top-level routed pages.

pub mod auth;
pub mod users;
