//! Conversation listing route.

use axum::extract::State;
use axum::response::Json;

use super::auth::CurrentUser;
use crate::services::conversation::{self, Conversation};
use crate::state::AppState;

/// `GET /api/conversations` — the caller's conversations, most recent first.
///
/// Always `200`: anonymous callers and store failures both get `[]`.
pub async fn list_conversations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<Vec<Conversation>> {
    Json(conversation::get_conversations(state.conversations.as_ref(), user.as_ref()).await)
}

#[cfg(test)]
#[path = "conversations_test.rs"]
mod tests;
