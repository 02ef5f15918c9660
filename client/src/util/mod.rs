//! Utility helpers shared across client UI modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate auth orchestration and redirect rules from page
//! markup to improve reuse and testability.

pub mod auth;
pub mod auth_flow;
