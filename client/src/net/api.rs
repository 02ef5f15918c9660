//! REST API helpers for communicating with the server.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`.
//! Server-side (SSR): stubs returning `None`/error since these endpoints
//! are only meaningful in the browser.
//!
//! ERROR HANDLING
//! ==============
//! Callers get `Option`/`Result` outputs instead of panics so auth and
//! listing failures degrade UI behavior without crashing hydration.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use super::types::{Conversation, Credentials, SignInResponse};
use crate::state::auth::SessionState;
use crate::util::auth_flow::AuthApi;
#[cfg(feature = "hydrate")]
use crate::util::auth_flow::LANDING_ROUTE;

#[cfg(any(test, feature = "hydrate"))]
fn provider_signin_endpoint(provider: &str) -> String {
    format!("/api/auth/signin/{provider}")
}

#[cfg(any(test, feature = "hydrate"))]
fn register_failed_message(status: u16) -> String {
    format!("register failed: {status}")
}

#[cfg(any(test, feature = "hydrate"))]
fn sign_in_failed_message(status: u16) -> String {
    format!("sign in failed: {status}")
}

/// Where to send the browser after a sign-in that asked for a redirect.
#[cfg(any(test, feature = "hydrate"))]
fn redirect_target(resp: &SignInResponse, fallback: &str) -> Option<String> {
    if !resp.ok || resp.error.is_some() {
        return None;
    }
    Some(resp.url.clone().unwrap_or_else(|| fallback.to_owned()))
}

/// Split a provider sign-in response into the authorize URL the browser must
/// leave for, and the result reported back to the caller.
///
/// While the browser is away at the provider nothing is signed in yet, so a
/// handoff reports neither success nor error.
#[cfg(any(test, feature = "hydrate"))]
fn provider_handoff(body: SignInResponse) -> (Option<String>, SignInResponse) {
    match body.url.clone().filter(|_| body.ok && body.error.is_none()) {
        Some(url) => (Some(url.clone()), SignInResponse { ok: false, error: None, url: Some(url) }),
        None => (None, body),
    }
}

#[cfg(feature = "hydrate")]
fn assign_location(url: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_href(url);
    }
}

/// Read a [`SignInResponse`] from any status; the server sends one for
/// rejected credentials too.
#[cfg(feature = "hydrate")]
async fn read_sign_in_response(resp: gloo_net::http::Response) -> Result<SignInResponse, String> {
    let status = resp.status();
    resp.json::<SignInResponse>()
        .await
        .map_err(|_| sign_in_failed_message(status))
}

/// Fetch the session status from `/api/auth/session`.
/// Any failure reads as unauthenticated.
pub async fn fetch_session() -> SessionState {
    #[cfg(feature = "hydrate")]
    {
        let Ok(resp) = gloo_net::http::Request::get("/api/auth/session").send().await else {
            return SessionState::unauthenticated();
        };
        if !resp.ok() {
            return SessionState::unauthenticated();
        }
        resp.json::<super::types::SessionResponse>()
            .await
            .map_or_else(|_| SessionState::unauthenticated(), SessionState::from_response)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        SessionState::default()
    }
}

/// Fetch the caller's conversations from `/api/conversations`.
/// Returns an empty list on any failure or on the server.
pub async fn fetch_conversations() -> Vec<Conversation> {
    #[cfg(feature = "hydrate")]
    {
        let Ok(resp) = gloo_net::http::Request::get("/api/conversations").send().await else {
            return Vec::new();
        };
        if !resp.ok() {
            return Vec::new();
        }
        resp.json::<Vec<Conversation>>().await.unwrap_or_default()
    }
    #[cfg(not(feature = "hydrate"))]
    {
        Vec::new()
    }
}

/// Log out the current user by calling `POST /api/auth/logout`.
pub async fn logout() {
    #[cfg(feature = "hydrate")]
    {
        let _ = gloo_net::http::Request::post("/api/auth/logout")
            .send()
            .await;
    }
}

/// Create an account via `POST /api/register`.
///
/// # Errors
///
/// Returns an error string if the request fails or is rejected.
pub async fn register(credentials: &Credentials) -> Result<(), String> {
    #[cfg(feature = "hydrate")]
    {
        let resp = gloo_net::http::Request::post("/api/register")
            .json(credentials)
            .map_err(|e| e.to_string())?
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !resp.ok() {
            return Err(register_failed_message(resp.status()));
        }
        Ok(())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = credentials;
        Err("not available on server".to_owned())
    }
}

/// Sign in with email and password via `POST /api/auth/callback/credentials`.
///
/// With `redirect`, a successful sign-in moves the browser itself.
///
/// # Errors
///
/// Returns an error string on transport failure or an unreadable response.
pub async fn sign_in_credentials(credentials: &Credentials, redirect: bool) -> Result<SignInResponse, String> {
    #[cfg(feature = "hydrate")]
    {
        #[derive(serde::Serialize)]
        struct Body<'a> {
            email: &'a str,
            password: &'a str,
        }
        let resp = gloo_net::http::Request::post("/api/auth/callback/credentials")
            .json(&Body { email: &credentials.email, password: &credentials.password })
            .map_err(|e| e.to_string())?
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let body = read_sign_in_response(resp).await?;
        if redirect {
            if let Some(target) = redirect_target(&body, LANDING_ROUTE) {
                assign_location(&target);
            }
        }
        Ok(body)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (credentials, redirect);
        Err("not available on server".to_owned())
    }
}

/// Start an identity-provider sign-in via `POST /api/auth/signin/{provider}`.
///
/// The provider's consent screen lives on another origin, so the browser is
/// sent to the returned authorize URL whenever one comes back, regardless of
/// `redirect`. The caller then sees a result that is neither ok nor an error;
/// the provider callback finishes the sign-in.
///
/// # Errors
///
/// Returns an error string on transport failure or an unreadable response.
pub async fn sign_in_provider(provider: &str, redirect: bool) -> Result<SignInResponse, String> {
    #[cfg(feature = "hydrate")]
    {
        let _ = redirect;
        let resp = gloo_net::http::Request::post(&provider_signin_endpoint(provider))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let (authorize_url, result) = provider_handoff(read_sign_in_response(resp).await?);
        if let Some(url) = authorize_url {
            assign_location(&url);
        }
        Ok(result)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (provider, redirect);
        Err("not available on server".to_owned())
    }
}

/// [`AuthApi`] backed by the HTTP helpers above.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpAuthApi;

impl AuthApi for HttpAuthApi {
    async fn register(&self, credentials: &Credentials) -> Result<(), String> {
        register(credentials).await
    }

    async fn sign_in_credentials(&self, credentials: &Credentials, redirect: bool) -> Result<SignInResponse, String> {
        sign_in_credentials(credentials, redirect).await
    }

    async fn sign_in_provider(&self, provider: &str, redirect: bool) -> Result<SignInResponse, String> {
        sign_in_provider(provider, redirect).await
    }
}
