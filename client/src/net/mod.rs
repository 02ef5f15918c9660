//! Networking modules for the REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` performs HTTP calls against the server and `types` defines the
//! shared wire schema.

pub mod api;
pub mod types;
