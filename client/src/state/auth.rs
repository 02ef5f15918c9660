//! Auth-session and auth-form state for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionState` is provided as context and drives route redirects.
//! `AuthVariant` selects which fields the auth form shows and which
//! submission path runs.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::net::types::{SessionResponse, User};

/// Whether the auth form logs in or registers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthVariant {
    #[default]
    Login,
    Register,
}

impl AuthVariant {
    /// The other variant.
    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Self::Login => Self::Register,
            Self::Register => Self::Login,
        }
    }

    #[must_use]
    pub fn submit_label(self) -> &'static str {
        match self {
            Self::Login => "Sign in",
            Self::Register => "Register",
        }
    }

    #[must_use]
    pub fn toggle_prompt(self) -> &'static str {
        match self {
            Self::Login => "New to Messenger?",
            Self::Register => "Already have an account?",
        }
    }

    #[must_use]
    pub fn toggle_label(self) -> &'static str {
        match self {
            Self::Login => "Create an account",
            Self::Register => "Login",
        }
    }

    /// The name field is only collected when registering.
    #[must_use]
    pub fn shows_name(self) -> bool {
        self == Self::Register
    }
}

/// Auth form state: active variant plus in-flight flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AuthFormState {
    pub variant: AuthVariant,
    pub loading: bool,
}

impl AuthFormState {
    pub fn toggle_variant(&mut self) {
        self.variant = self.variant.toggle();
    }
}

/// Session status as reported by the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Loading,
    Unauthenticated,
    Authenticated,
}

/// Current session: status plus the user when authenticated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub status: SessionStatus,
    pub user: Option<User>,
}

impl SessionState {
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self { status: SessionStatus::Unauthenticated, user: None }
    }

    /// Authenticated only when the server says so and sent a user.
    #[must_use]
    pub fn from_response(resp: SessionResponse) -> Self {
        match (resp.status.as_str(), resp.user) {
            ("authenticated", Some(user)) => Self { status: SessionStatus::Authenticated, user: Some(user) },
            _ => Self::unauthenticated(),
        }
    }
}
