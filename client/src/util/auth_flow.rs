//! Auth form submission flow: register, credential login, provider login.
//!
//! DESIGN
//! ======
//! `AuthFlow` holds no state of its own. The network lives behind
//! [`AuthApi`]; loading flag, toasts and navigation live behind
//! [`AuthEffects`]. Pages plug in the HTTP client and reactive signals, tests
//! plug in recorders.
//!
//! Every operation raises `loading` before its first call and lowers it once
//! the last call settles, whatever the outcome. Overlapping operations are
//! not coordinated: whichever finishes last decides the final flag.

#[cfg(test)]
#[path = "auth_flow_test.rs"]
mod auth_flow_test;

use crate::net::types::{Credentials, SignInResponse};
use crate::state::auth::AuthVariant;
use crate::state::ui::ToastLevel;

/// Route shown after a successful sign-in.
pub const LANDING_ROUTE: &str = "/users";
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong!";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";
pub const LOGGED_IN_MESSAGE: &str = "Logged in!";

/// Identity providers offered on the auth page.
pub const SOCIAL_PROVIDERS: [&str; 2] = ["github", "google"];

/// Remote calls the auth flow depends on.
///
/// `redirect` asks the implementation to navigate by itself after a
/// successful sign-in; with `false` the caller handles the result.
#[allow(async_fn_in_trait)]
pub trait AuthApi {
    /// Create an account.
    ///
    /// # Errors
    ///
    /// Rejected registration or transport failure.
    async fn register(&self, credentials: &Credentials) -> Result<(), String>;

    /// Establish a session from email and password.
    ///
    /// # Errors
    ///
    /// Transport failure only; rejected credentials come back as
    /// `Ok` with `error` set.
    async fn sign_in_credentials(&self, credentials: &Credentials, redirect: bool) -> Result<SignInResponse, String>;

    /// Establish a session through a named identity provider.
    ///
    /// # Errors
    ///
    /// Transport failure only.
    async fn sign_in_provider(&self, provider: &str, redirect: bool) -> Result<SignInResponse, String>;
}

/// UI side effects of the auth flow. All fire-and-forget.
pub trait AuthEffects {
    fn set_loading(&self, loading: bool);
    fn notify(&self, level: ToastLevel, message: &str);
    fn navigate(&self, path: &str);
}

pub struct AuthFlow<A, E> {
    api: A,
    effects: E,
}

impl<A: AuthApi, E: AuthEffects> AuthFlow<A, E> {
    pub fn new(api: A, effects: E) -> Self {
        Self { api, effects }
    }

    /// Submit the form for the given variant.
    pub async fn submit(&self, variant: AuthVariant, credentials: &Credentials) {
        self.effects.set_loading(true);
        match variant {
            AuthVariant::Register => self.register_then_sign_in(credentials).await,
            AuthVariant::Login => {
                let result = self.api.sign_in_credentials(credentials, false).await;
                self.finish_sign_in(result);
            }
        }
        self.effects.set_loading(false);
    }

    /// Sign in through an identity provider such as `"github"`.
    pub async fn social_action(&self, provider: &str) {
        self.effects.set_loading(true);
        let result = self.api.sign_in_provider(provider, false).await;
        self.finish_sign_in(result);
        self.effects.set_loading(false);
    }

    async fn register_then_sign_in(&self, credentials: &Credentials) {
        if let Err(e) = self.api.register(credentials).await {
            log_failure("register", &e);
            self.effects.notify(ToastLevel::Error, GENERIC_ERROR_MESSAGE);
            return;
        }
        // The provider navigates on success; the session observer covers the rest.
        if let Err(e) = self.api.sign_in_credentials(credentials, true).await {
            log_failure("sign in after register", &e);
            self.effects.notify(ToastLevel::Error, GENERIC_ERROR_MESSAGE);
        }
    }

    /// Shared result handling for credential and provider sign-in.
    fn finish_sign_in(&self, result: Result<SignInResponse, String>) {
        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                log_failure("sign in", &e);
                self.effects.notify(ToastLevel::Error, GENERIC_ERROR_MESSAGE);
                return;
            }
        };

        if resp.error.is_some() {
            self.effects.notify(ToastLevel::Error, INVALID_CREDENTIALS_MESSAGE);
        } else if resp.ok {
            self.effects.notify(ToastLevel::Success, LOGGED_IN_MESSAGE);
            self.effects.navigate(LANDING_ROUTE);
        }
    }
}

fn log_failure(action: &str, error: &str) {
    #[cfg(feature = "hydrate")]
    log::warn!("{action} failed: {error}");
    #[cfg(not(feature = "hydrate"))]
    let _ = (action, error);
}
