//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the database pool, the conversation store seam, and the
//! identity-provider configuration loaded at startup.

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::auth::OAuthProviders;
use crate::services::conversation::{ConversationStore, PgConversationStore};

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub conversations: Arc<dyn ConversationStore>,
    pub oauth: Arc<OAuthProviders>,
    /// bcrypt work factor for new passwords.
    pub bcrypt_cost: u32,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, oauth: OAuthProviders, bcrypt_cost: u32) -> Self {
        let conversations = Arc::new(PgConversationStore::new(pool.clone()));
        Self { pool, conversations, oauth: Arc::new(oauth), bcrypt_cost }
    }

    /// Swap the conversation store, e.g. for an in-memory fake.
    #[must_use]
    pub fn with_conversation_store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.conversations = store;
        self
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
