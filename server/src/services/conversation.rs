//! Conversation listing for the signed-in user.
//!
//! DESIGN
//! ======
//! Route handlers call [`get_conversations`] with whatever user the session
//! resolved to. Storage sits behind [`ConversationStore`] so the listing
//! contract can be exercised without Postgres.
//!
//! ERROR HANDLING
//! ==============
//! A store failure is logged and downgraded to an empty list. Callers cannot
//! tell "no conversations" from "query failed"; the HTTP surface keeps that
//! contract.

use std::collections::HashMap;

use futures::try_join;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::session::SessionUser;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Public projection of a user inside a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationUser {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub image: Option<String>,
}

/// One message with its sender and read receipts expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub body: Option<String>,
    pub image: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub sender: ConversationUser,
    pub seen: Vec<ConversationUser>,
}

/// A conversation with participants and messages expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversation {
    pub id: Uuid,
    pub name: Option<String>,
    pub is_group: bool,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Milliseconds since the Unix epoch. Listing order key.
    pub last_message_at: i64,
    pub user_ids: Vec<Uuid>,
    pub users: Vec<ConversationUser>,
    /// Oldest first.
    pub messages: Vec<Message>,
}

// =============================================================================
// STORE
// =============================================================================

/// Read access to conversations. Enables mocking in tests.
#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    /// Conversations the user participates in, most recent message first,
    /// with participants and messages expanded.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversationError`] if the underlying query fails.
    async fn conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>, ConversationError>;
}

/// Postgres-backed store.
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Conversation columns before participants and messages are attached.
#[derive(Debug, Clone)]
pub(crate) struct ConversationRow {
    pub id: Uuid,
    pub name: Option<String>,
    pub is_group: bool,
    pub created_at: i64,
    pub last_message_at: i64,
}

/// Message columns plus the conversation they belong to.
#[derive(Debug, Clone)]
pub(crate) struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub body: Option<String>,
    pub image: Option<String>,
    pub created_at: i64,
    pub sender: ConversationUser,
}

fn user_from_row(row: &PgRow, prefix: &str) -> ConversationUser {
    ConversationUser {
        id: row.get(format!("{prefix}id").as_str()),
        name: row.get(format!("{prefix}name").as_str()),
        email: row.get(format!("{prefix}email").as_str()),
        image: row.get(format!("{prefix}image").as_str()),
    }
}

#[async_trait::async_trait]
impl ConversationStore for PgConversationStore {
    async fn conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>, ConversationError> {
        let rows = sqlx::query(
            r"SELECT c.id, c.name, c.is_group,
                     (EXTRACT(EPOCH FROM c.created_at) * 1000)::BIGINT AS created_at,
                     (EXTRACT(EPOCH FROM c.last_message_at) * 1000)::BIGINT AS last_message_at
              FROM conversations c
              WHERE EXISTS (
                  SELECT 1 FROM conversation_users cu
                  WHERE cu.conversation_id = c.id AND cu.user_id = $1
              )
              ORDER BY c.last_message_at DESC, c.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let conversations: Vec<ConversationRow> = rows
            .iter()
            .map(|r| ConversationRow {
                id: r.get("id"),
                name: r.get("name"),
                is_group: r.get("is_group"),
                created_at: r.get("created_at"),
                last_message_at: r.get("last_message_at"),
            })
            .collect();
        if conversations.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = conversations.iter().map(|c| c.id).collect();

        let participants_q = sqlx::query(
            r"SELECT cu.conversation_id, u.id, u.name, u.email, u.image
              FROM conversation_users cu
              JOIN users u ON u.id = cu.user_id
              WHERE cu.conversation_id = ANY($1)
              ORDER BY cu.joined_at, u.id",
        )
        .bind(&ids)
        .fetch_all(&self.pool);

        let messages_q = sqlx::query(
            r"SELECT m.id, m.conversation_id, m.body, m.image,
                     (EXTRACT(EPOCH FROM m.created_at) * 1000)::BIGINT AS created_at,
                     u.id AS sender_id, u.name AS sender_name,
                     u.email AS sender_email, u.image AS sender_image
              FROM messages m
              JOIN users u ON u.id = m.sender_id
              WHERE m.conversation_id = ANY($1)
              ORDER BY m.created_at, m.id",
        )
        .bind(&ids)
        .fetch_all(&self.pool);

        let seen_q = sqlx::query(
            r"SELECT ms.message_id, u.id, u.name, u.email, u.image
              FROM message_seen ms
              JOIN messages m ON m.id = ms.message_id
              JOIN users u ON u.id = ms.user_id
              WHERE m.conversation_id = ANY($1)
              ORDER BY ms.seen_at, u.id",
        )
        .bind(&ids)
        .fetch_all(&self.pool);

        let (participant_rows, message_rows, seen_rows) = try_join!(participants_q, messages_q, seen_q)?;

        let participants: Vec<(Uuid, ConversationUser)> = participant_rows
            .iter()
            .map(|r| (r.get("conversation_id"), user_from_row(r, "")))
            .collect();
        let messages: Vec<MessageRow> = message_rows
            .iter()
            .map(|r| MessageRow {
                id: r.get("id"),
                conversation_id: r.get("conversation_id"),
                body: r.get("body"),
                image: r.get("image"),
                created_at: r.get("created_at"),
                sender: user_from_row(r, "sender_"),
            })
            .collect();
        let seen: Vec<(Uuid, ConversationUser)> = seen_rows
            .iter()
            .map(|r| (r.get("message_id"), user_from_row(r, "")))
            .collect();

        Ok(assemble(conversations, participants, messages, seen))
    }
}

/// Attach participants, messages and read receipts to their conversations.
///
/// Input order is preserved within each group; rows referencing unknown
/// conversations or messages are dropped.
pub(crate) fn assemble(
    conversations: Vec<ConversationRow>,
    participants: Vec<(Uuid, ConversationUser)>,
    messages: Vec<MessageRow>,
    seen: Vec<(Uuid, ConversationUser)>,
) -> Vec<Conversation> {
    let mut users_by_conversation: HashMap<Uuid, Vec<ConversationUser>> = HashMap::new();
    for (conversation_id, user) in participants {
        users_by_conversation.entry(conversation_id).or_default().push(user);
    }

    let mut seen_by_message: HashMap<Uuid, Vec<ConversationUser>> = HashMap::new();
    for (message_id, user) in seen {
        seen_by_message.entry(message_id).or_default().push(user);
    }

    let mut messages_by_conversation: HashMap<Uuid, Vec<Message>> = HashMap::new();
    for row in messages {
        let seen = seen_by_message.remove(&row.id).unwrap_or_default();
        messages_by_conversation
            .entry(row.conversation_id)
            .or_default()
            .push(Message {
                id: row.id,
                conversation_id: row.conversation_id,
                body: row.body,
                image: row.image,
                created_at: row.created_at,
                sender: row.sender,
                seen,
            });
    }

    conversations
        .into_iter()
        .map(|c| {
            let users = users_by_conversation.remove(&c.id).unwrap_or_default();
            Conversation {
                id: c.id,
                name: c.name,
                is_group: c.is_group,
                created_at: c.created_at,
                last_message_at: c.last_message_at,
                user_ids: users.iter().map(|u| u.id).collect(),
                users,
                messages: messages_by_conversation.remove(&c.id).unwrap_or_default(),
            }
        })
        .collect()
}

// =============================================================================
// LISTING
// =============================================================================

fn sort_most_recent_first(conversations: &mut [Conversation]) {
    conversations.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
}

/// List the current user's conversations, most recent message first.
///
/// Returns an empty list without touching the store when there is no current
/// user, and an empty list when the store fails.
pub async fn get_conversations(store: &dyn ConversationStore, current_user: Option<&SessionUser>) -> Vec<Conversation> {
    let Some(user) = current_user else {
        return Vec::new();
    };

    match store.conversations_for_user(user.id).await {
        Ok(mut conversations) => {
            sort_most_recent_first(&mut conversations);
            conversations
        }
        Err(e) => {
            tracing::warn!(error = %e, user_id = %user.id, "conversation query failed");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;
