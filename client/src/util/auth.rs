//! Session-driven redirects.
//!
//! SYSTEM CONTEXT
//! ==============
//! The auth page leaves as soon as the session becomes authenticated, no
//! matter what caused it; protected pages bounce unauthenticated visitors
//! back to the auth page.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;

use super::auth_flow::LANDING_ROUTE;
use crate::state::auth::{SessionState, SessionStatus};

/// Route of the auth page.
pub const AUTH_ROUTE: &str = "/";

/// Tracks session status and reports each transition into `Authenticated`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionObserver {
    last: Option<SessionStatus>,
}

impl SessionObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `status`; `true` when it just became `Authenticated`.
    pub fn observe(&mut self, status: SessionStatus) -> bool {
        let previous = self.last.replace(status);
        status == SessionStatus::Authenticated && previous != Some(SessionStatus::Authenticated)
    }
}

#[must_use]
pub fn should_redirect_unauth(state: &SessionState) -> bool {
    state.status == SessionStatus::Unauthenticated
}

/// Navigate to the landing route whenever the session becomes authenticated.
pub fn install_authenticated_redirect<F>(session: RwSignal<SessionState>, navigate: F)
where
    F: Fn(&str, NavigateOptions) + Clone + 'static,
{
    let mut observer = SessionObserver::new();
    Effect::new(move || {
        let status = session.with(|s| s.status);
        if observer.observe(status) {
            navigate(LANDING_ROUTE, NavigateOptions::default());
        }
    });
}

/// Redirect to the auth page once the session is known to be anonymous.
pub fn install_unauth_redirect<F>(session: RwSignal<SessionState>, navigate: F)
where
    F: Fn(&str, NavigateOptions) + Clone + 'static,
{
    Effect::new(move || {
        if session.with(should_redirect_unauth) {
            navigate(AUTH_ROUTE, NavigateOptions::default());
        }
    });
}
