//! Reusable UI components.

pub mod conversation_list;
pub mod toaster;
