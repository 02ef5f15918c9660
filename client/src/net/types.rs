//! Wire DTOs for the client/server boundary.
//!
//! DESIGN
//! ======
//! These types mirror the server's JSON responses. Identifiers stay strings
//! and timestamps stay epoch milliseconds so the client needs no UUID or
//! date-time crates.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// A user as exposed by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier (UUID string).
    pub id: String,
    /// Display name.
    pub name: String,
    pub email: Option<String>,
    /// Avatar image URL.
    pub image: Option<String>,
}

/// A chat message with sender and read receipts expanded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub body: Option<String>,
    pub image: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub sender: User,
    /// Users who have seen this message.
    #[serde(default)]
    pub seen: Vec<User>,
}

/// A conversation thread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub is_group: bool,
    pub created_at: i64,
    /// Milliseconds since the Unix epoch; the listing is sorted on this.
    pub last_message_at: i64,
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub users: Vec<User>,
    /// Oldest first.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Most recent message, if any.
    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Title for list rows: the explicit name, else the other participants.
    #[must_use]
    pub fn display_name(&self, current_user_id: Option<&str>) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_owned();
        }
        let others: Vec<&str> = self
            .users
            .iter()
            .filter(|u| Some(u.id.as_str()) != current_user_id)
            .map(|u| u.name.as_str())
            .collect();
        if others.is_empty() { "Just you".to_owned() } else { others.join(", ") }
    }
}

/// Form data for login and registration. `name` is ignored when logging in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Outcome of a sign-in call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInResponse {
    pub ok: bool,
    pub error: Option<String>,
    pub url: Option<String>,
}

/// Body of `GET /api/auth/session`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SessionResponse {
    pub status: String,
    pub user: Option<User>,
}
