//! Auth routes: registration, credential and provider sign-in, session status.
//!
//! Sign-in endpoints answer with a [`SignInResponse`] so the browser client can
//! decide whether to navigate itself.

use std::convert::Infallible;

use axum::extract::{FromRef, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::services::auth::{self as auth_svc, AuthError, OAuthProvider};
use crate::services::credentials::{self, CredentialsError, CredentialsRequest, RegisterRequest};
use crate::services::session::{self, SessionUser};
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";
const OAUTH_STATE_COOKIE_NAME: &str = "oauth_state";
/// Where a freshly signed-in browser lands.
pub(crate) const LANDING_ROUTE: &str = "/users";
const SESSION_MAX_AGE_DAYS: i64 = 30;

/// Error code reported for rejected credentials.
pub(crate) const CREDENTIALS_SIGNIN_ERROR: &str = "CredentialsSignin";
/// Error code reported when the server itself failed.
pub(crate) const CONFIGURATION_ERROR: &str = "Configuration";
/// Error code reported when a provider identity would claim an existing,
/// unverified email.
pub(crate) const ACCOUNT_NOT_LINKED_ERROR: &str = "OAuthAccountNotLinked";

/// Auth page URL carrying a sign-in error code.
pub(crate) fn auth_error_route(code: &str) -> String {
    format!("/?error={code}")
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

pub(crate) fn cookie_secure(state: &AppState) -> bool {
    env_bool("COOKIE_SECURE").unwrap_or_else(|| state.oauth.any_https_redirect())
}

fn base_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub(crate) fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(COOKIE_NAME, token, secure);
    cookie.set_max_age(Duration::days(SESSION_MAX_AGE_DAYS));
    cookie
}

pub(crate) fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(name, String::new(), secure);
    cookie.set_max_age(Duration::ZERO);
    cookie
}

// =============================================================================
// EXTRACTORS
// =============================================================================

/// Authenticated user extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: SessionUser,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, token)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(Self { user, token: token.to_owned() })
    }
}

/// The session user if one resolves. Never rejects: a missing cookie, an
/// expired session and a failed lookup all yield `None`.
pub struct CurrentUser(pub Option<SessionUser>);

impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar.get(COOKIE_NAME).map(Cookie::value).filter(|t| !t.is_empty()) else {
            return Ok(Self(None));
        };

        let app_state = AppState::from_ref(state);
        match session::validate_session(&app_state.pool, token).await {
            Ok(user) => Ok(Self(user)),
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed");
                Ok(Self(None))
            }
        }
    }
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Result of a sign-in attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignInResponse {
    pub ok: bool,
    pub error: Option<String>,
    /// Where the browser should go next, if anywhere.
    pub url: Option<String>,
}

impl SignInResponse {
    #[must_use]
    pub fn success(url: impl Into<String>) -> Self {
        Self { ok: true, error: None, url: Some(url.into()) }
    }

    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self { ok: false, error: Some(error.into()), url: None }
    }
}

/// Session status as seen by the browser.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatusResponse {
    pub status: &'static str,
    pub user: Option<SessionUser>,
}

pub(crate) fn credentials_error_to_status(err: &CredentialsError) -> StatusCode {
    match err {
        CredentialsError::InvalidEmail | CredentialsError::MissingName | CredentialsError::MissingPassword => {
            StatusCode::BAD_REQUEST
        }
        CredentialsError::EmailTaken => StatusCode::CONFLICT,
        CredentialsError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        CredentialsError::Hash(_) | CredentialsError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn auth_error_to_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::UnknownProvider(_) => StatusCode::NOT_FOUND,
        AuthError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::TokenExchange(_) | AuthError::ProviderApi(_) => StatusCode::BAD_GATEWAY,
        AuthError::AccountNotLinked(_) => StatusCode::CONFLICT,
        AuthError::Config(_) | AuthError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/register` — create an email + password account.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<SessionUser>, (StatusCode, String)> {
    match credentials::register_user(&state.pool, &req, state.bcrypt_cost).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "user registered");
            Ok(Json(user))
        }
        Err(e) => {
            let status = credentials_error_to_status(&e);
            if status.is_server_error() {
                tracing::error!(error = %e, "registration failed");
            }
            Err((status, e.to_string()))
        }
    }
}

/// `POST /api/auth/callback/credentials` — verify email/password and start a session.
pub async fn credentials_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<CredentialsRequest>,
) -> Response {
    let user_id = match credentials::verify_credentials(&state.pool, &req).await {
        Ok(id) => id,
        Err(CredentialsError::InvalidCredentials) => {
            return (StatusCode::UNAUTHORIZED, Json(SignInResponse::failure(CREDENTIALS_SIGNIN_ERROR)))
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "credential verification failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(SignInResponse::failure(CONFIGURATION_ERROR)))
                .into_response();
        }
    };

    let token = match session::create_session(&state.pool, user_id).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "session creation failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(SignInResponse::failure(CONFIGURATION_ERROR)))
                .into_response();
        }
    };

    let jar = jar.add(session_cookie(token, cookie_secure(&state)));
    (jar, Json(SignInResponse::success(LANDING_ROUTE))).into_response()
}

/// `POST /api/auth/signin/{provider}` — hand back the provider authorize URL.
pub async fn provider_signin(State(state): State<AppState>, Path(provider): Path<String>) -> Response {
    let config = match provider
        .parse::<OAuthProvider>()
        .and_then(|p| state.oauth.get(p).ok_or(AuthError::NotConfigured(p)))
    {
        Ok(config) => config,
        Err(e) => return (auth_error_to_status(&e), Json(SignInResponse::failure(e.to_string()))).into_response(),
    };

    let oauth_state = session::generate_token();
    let url = match config.authorize_url(&oauth_state) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(error = %e, %provider, "authorize url build failed");
            return (auth_error_to_status(&e), Json(SignInResponse::failure(CONFIGURATION_ERROR))).into_response();
        }
    };

    let mut state_cookie = base_cookie(OAUTH_STATE_COOKIE_NAME, oauth_state, cookie_secure(&state));
    state_cookie.set_max_age(Duration::minutes(10));
    let jar = CookieJar::new().add(state_cookie);
    (jar, Json(SignInResponse::success(url))).into_response()
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
}

/// `GET /auth/{provider}/callback` — exchange code, upsert user, set cookie,
/// redirect to the landing route.
pub async fn provider_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Response {
    let config = match provider
        .parse::<OAuthProvider>()
        .and_then(|p| state.oauth.get(p).ok_or(AuthError::NotConfigured(p)))
    {
        Ok(config) => config.clone(),
        Err(e) => return (auth_error_to_status(&e), e.to_string()).into_response(),
    };
    let secure = cookie_secure(&state);

    // Verify OAuth CSRF state from cookie.
    let Some(callback_state) = params.state.as_deref() else {
        return (StatusCode::BAD_REQUEST, "missing oauth state").into_response();
    };
    let expected_state = jar
        .get(OAUTH_STATE_COOKIE_NAME)
        .map(Cookie::value)
        .unwrap_or_default();
    if expected_state.is_empty() || expected_state != callback_state {
        return (StatusCode::UNAUTHORIZED, "invalid oauth state").into_response();
    }
    let Some(code) = params.code.as_deref() else {
        return (StatusCode::BAD_REQUEST, "missing oauth code").into_response();
    };

    let access_token = match auth_svc::exchange_code(&config, code).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, %provider, "oauth code exchange failed");
            return (auth_error_to_status(&e), "OAuth code exchange failed").into_response();
        }
    };

    let profile = match auth_svc::fetch_profile(config.provider, &access_token).await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, %provider, "provider profile fetch failed");
            return (auth_error_to_status(&e), "Failed to fetch provider profile").into_response();
        }
    };

    let user_id = match auth_svc::upsert_oauth_user(&state.pool, &profile).await {
        Ok(id) => id,
        Err(e @ AuthError::AccountNotLinked(_)) => {
            tracing::warn!(error = %e, %provider, "provider sign-in refused");
            let jar = jar.add(expired_cookie(OAUTH_STATE_COOKIE_NAME, secure));
            return (jar, Redirect::temporary(&auth_error_route(ACCOUNT_NOT_LINKED_ERROR))).into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, %provider, "user upsert failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user").into_response();
        }
    };

    let token = match session::create_session(&state.pool, user_id).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "session creation failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session").into_response();
        }
    };

    tracing::info!(%user_id, %provider, "provider sign-in");
    let jar = jar
        .add(session_cookie(token, secure))
        .add(expired_cookie(OAUTH_STATE_COOKIE_NAME, secure));
    (jar, Redirect::temporary(LANDING_ROUTE)).into_response()
}

/// `GET /api/auth/session` — report whether the caller is signed in.
pub async fn session_status(CurrentUser(user): CurrentUser) -> Json<SessionStatusResponse> {
    let status = if user.is_some() { "authenticated" } else { "unauthenticated" };
    Json(SessionStatusResponse { status, user })
}

/// `GET /api/auth/me` — return current user.
pub async fn me(auth: AuthUser) -> Json<SessionUser> {
    Json(auth.user)
}

/// `POST /api/auth/logout` — delete session, clear cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(e) = session::delete_session(&state.pool, &auth.token).await {
        tracing::warn!(error = %e, "session delete failed");
    }

    let jar = CookieJar::new().add(expired_cookie(COOKIE_NAME, cookie_secure(&state)));
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
