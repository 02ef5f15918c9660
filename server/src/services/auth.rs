//! Identity-provider OAuth service: authorize URLs, code exchange, profile
//! fetch, and user/account upsert.
//!
//! DESIGN
//! ======
//! Each provider is enabled independently from its own environment variables.
//! Provider-specific JSON is mapped into a common [`OAuthProfile`] before it
//! reaches the database.

use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use serde::Deserialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

// =============================================================================
// PROVIDERS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    GitHub,
    Google,
}

impl OAuthProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::Google => "google",
        }
    }

    fn env_prefix(self) -> &'static str {
        match self {
            Self::GitHub => "GITHUB",
            Self::Google => "GOOGLE",
        }
    }

    fn authorize_endpoint(self) -> &'static str {
        match self {
            Self::GitHub => "https://github.com/login/oauth/authorize",
            Self::Google => "https://accounts.google.com/o/oauth2/v2/auth",
        }
    }

    fn token_endpoint(self) -> &'static str {
        match self {
            Self::GitHub => "https://github.com/login/oauth/access_token",
            Self::Google => "https://oauth2.googleapis.com/token",
        }
    }

    fn scope(self) -> &'static str {
        match self {
            Self::GitHub => "read:user user:email",
            Self::Google => "openid email profile",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OAuthProvider {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(Self::GitHub),
            "google" => Ok(Self::Google),
            other => Err(AuthError::UnknownProvider(other.to_owned())),
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// OAuth client configuration for one provider.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub provider: OAuthProvider,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl OAuthConfig {
    /// Load from `<PROVIDER>_CLIENT_ID`, `<PROVIDER>_CLIENT_SECRET`,
    /// `<PROVIDER>_REDIRECT_URI`. Returns `None` if any are missing.
    #[must_use]
    pub fn from_env(provider: OAuthProvider) -> Option<Self> {
        let prefix = provider.env_prefix();
        let var = |suffix: &str| std::env::var(format!("{prefix}_{suffix}")).ok().filter(|v| !v.is_empty());
        Some(Self {
            provider,
            client_id: var("CLIENT_ID")?,
            client_secret: var("CLIENT_SECRET")?,
            redirect_uri: var("REDIRECT_URI")?,
        })
    }

    /// Build the provider authorization URL carrying the CSRF `state`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if the URL cannot be assembled.
    pub fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        let mut params = vec![
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("scope", self.provider.scope()),
            ("state", state),
        ];
        if self.provider == OAuthProvider::Google {
            params.push(("response_type", "code"));
        }
        Url::parse_with_params(self.provider.authorize_endpoint(), &params)
            .map(String::from)
            .map_err(|e| AuthError::Config(e.to_string()))
    }
}

/// Every provider that has complete configuration.
#[derive(Debug, Clone, Default)]
pub struct OAuthProviders {
    pub github: Option<OAuthConfig>,
    pub google: Option<OAuthConfig>,
}

impl OAuthProviders {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            github: OAuthConfig::from_env(OAuthProvider::GitHub),
            google: OAuthConfig::from_env(OAuthProvider::Google),
        }
    }

    #[must_use]
    pub fn get(&self, provider: OAuthProvider) -> Option<&OAuthConfig> {
        match provider {
            OAuthProvider::GitHub => self.github.as_ref(),
            OAuthProvider::Google => self.google.as_ref(),
        }
    }

    /// Whether any configured redirect URI is served over HTTPS.
    #[must_use]
    pub fn any_https_redirect(&self) -> bool {
        [self.github.as_ref(), self.google.as_ref()]
            .into_iter()
            .flatten()
            .any(|c| c.redirect_uri.starts_with("https://"))
    }
}

// =============================================================================
// PROFILE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider not configured: {0}")]
    NotConfigured(OAuthProvider),
    #[error("config error: {0}")]
    Config(String),
    #[error("token exchange failed: {0}")]
    TokenExchange(String),
    #[error("provider api error: {0}")]
    ProviderApi(String),
    /// The email belongs to an existing user and the provider does not vouch for it.
    #[error("provider account not linked: email unverified by {0}")]
    AccountNotLinked(OAuthProvider),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Provider-neutral identity returned after a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    pub provider: OAuthProvider,
    pub provider_account_id: String,
    pub name: String,
    pub email: Option<String>,
    /// The provider attests that `email` belongs to this account.
    pub email_verified: bool,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitHubUser {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

/// The public profile email on `/user` carries no verification flag.
impl From<GitHubUser> for OAuthProfile {
    fn from(gh: GitHubUser) -> Self {
        Self {
            provider: OAuthProvider::GitHub,
            provider_account_id: gh.id.to_string(),
            name: gh.name.filter(|n| !n.trim().is_empty()).unwrap_or(gh.login),
            email: gh.email.map(|e| e.to_ascii_lowercase()),
            email_verified: false,
            image: gh.avatar_url,
        }
    }
}

/// One entry of GitHub's `/user/emails`.
#[derive(Debug, Deserialize)]
pub(crate) struct GitHubEmail {
    email: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    verified: bool,
}

pub(crate) fn primary_verified_email(emails: &[GitHubEmail]) -> Option<String> {
    emails
        .iter()
        .find(|e| e.primary && e.verified)
        .map(|e| e.email.to_ascii_lowercase())
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleUser {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    picture: Option<String>,
}

impl From<GoogleUser> for OAuthProfile {
    fn from(g: GoogleUser) -> Self {
        let email = g.email.map(|e| e.to_ascii_lowercase());
        let name = g
            .name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| email.as_deref().and_then(|e| e.split('@').next()).map(str::to_owned))
            .unwrap_or_else(|| "user".to_owned());
        let email_verified = g.email_verified && email.is_some();
        Self { provider: OAuthProvider::Google, provider_account_id: g.sub, name, email, email_verified, image: g.picture }
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// Longest slice of a provider error body kept in an error message.
const MAX_ERROR_BODY: usize = 120;

/// Shorten a provider response body for error messages.
pub(crate) fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_owned(),
    }
}

/// Exchange an OAuth code for an access token.
pub async fn exchange_code(config: &OAuthConfig, code: &str) -> Result<String, AuthError> {
    let client = reqwest::Client::new();
    let request = client.post(config.provider.token_endpoint()).header("Accept", "application/json");
    let request = match config.provider {
        OAuthProvider::GitHub => request.json(&serde_json::json!({
            "client_id": config.client_id,
            "client_secret": config.client_secret,
            "code": code,
            "redirect_uri": config.redirect_uri,
        })),
        OAuthProvider::Google => request.form(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ]),
    };

    let resp = request
        .send()
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;
    let body = resp
        .text()
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;
    parse_token_response(&body)
}

/// Pull `access_token` out of a token endpoint body. Error responses carry
/// only the provider's `error` code, never the raw body.
pub(crate) fn parse_token_response(body: &str) -> Result<String, AuthError> {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: String,
    }

    if let Ok(token_resp) = serde_json::from_str::<TokenResponse>(body) {
        return Ok(token_resp.access_token);
    }
    let reason = serde_json::from_str::<ErrorResponse>(body)
        .map_or_else(|_| "unexpected response".to_owned(), |e| truncate_body(&e.error));
    Err(AuthError::TokenExchange(reason))
}

async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    access_token: &str,
) -> Result<T, AuthError> {
    let resp = client
        .get(url)
        .header("Authorization", format!("Bearer {access_token}"))
        .header("Accept", "application/json")
        .header("User-Agent", "messenger")
        .send()
        .await
        .map_err(|e| AuthError::ProviderApi(e.to_string()))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(AuthError::ProviderApi(format!("{status}: {}", truncate_body(&body))));
    }

    resp.json::<T>()
        .await
        .map_err(|e| AuthError::ProviderApi(e.to_string()))
}

/// Fetch the authenticated user's profile from the provider.
///
/// GitHub only vouches for addresses listed as verified on `/user/emails`;
/// when that list is unavailable the profile stays unverified.
pub async fn fetch_profile(provider: OAuthProvider, access_token: &str) -> Result<OAuthProfile, AuthError> {
    let client = reqwest::Client::new();
    match provider {
        OAuthProvider::GitHub => {
            let user: GitHubUser = get_json(&client, "https://api.github.com/user", access_token).await?;
            let mut profile = OAuthProfile::from(user);
            match get_json::<Vec<GitHubEmail>>(&client, "https://api.github.com/user/emails", access_token).await {
                Ok(emails) => {
                    if let Some(email) = primary_verified_email(&emails) {
                        profile.email = Some(email);
                        profile.email_verified = true;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "github email lookup failed"),
            }
            Ok(profile)
        }
        OAuthProvider::Google => {
            get_json::<GoogleUser>(&client, "https://openidconnect.googleapis.com/v1/userinfo", access_token)
                .await
                .map(OAuthProfile::from)
        }
    }
}

// =============================================================================
// PERSISTENCE
// =============================================================================

async fn linked_user(
    conn: &mut sqlx::PgConnection,
    provider: OAuthProvider,
    provider_account_id: &str,
) -> Result<Option<Uuid>, sqlx::Error> {
    let row = sqlx::query("SELECT user_id FROM accounts WHERE provider = $1 AND provider_account_id = $2")
        .bind(provider.as_str())
        .bind(provider_account_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(|r| r.get("user_id")))
}

/// Resolve the user for a provider identity, creating or linking as needed.
///
/// An already-linked account wins. A new identity whose email matches an
/// existing user is linked only when the provider verified that email;
/// otherwise the sign-in fails with [`AuthError::AccountNotLinked`]. With no
/// matching user a new one is created.
pub async fn upsert_oauth_user(pool: &PgPool, profile: &OAuthProfile) -> Result<Uuid, AuthError> {
    let mut tx = pool.begin().await?;

    if let Some(user_id) = linked_user(&mut tx, profile.provider, &profile.provider_account_id).await? {
        sqlx::query("UPDATE users SET image = COALESCE($2, image), updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(&profile.image)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        return Ok(user_id);
    }

    let created = sqlx::query(
        r"INSERT INTO users (name, email, image, email_verified)
          VALUES ($1, $2, $3, CASE WHEN $4 THEN now() ELSE NULL END)
          ON CONFLICT (email) DO NOTHING
          RETURNING id",
    )
    .bind(&profile.name)
    .bind(&profile.email)
    .bind(&profile.image)
    .bind(profile.email_verified)
    .fetch_optional(&mut *tx)
    .await?;

    let user_id: Uuid = if let Some(row) = created {
        row.get("id")
    } else {
        // A concurrent first sign-in of this identity may have created the user.
        if let Some(user_id) = linked_user(&mut tx, profile.provider, &profile.provider_account_id).await? {
            tx.commit().await?;
            return Ok(user_id);
        }
        // Email already registered: only a provider-verified address may claim it.
        if !profile.email_verified {
            return Err(AuthError::AccountNotLinked(profile.provider));
        }
        let row = sqlx::query(
            r"UPDATE users
              SET email_verified = COALESCE(email_verified, now()),
                  image = COALESCE(image, $2),
                  updated_at = now()
              WHERE email = $1
              RETURNING id",
        )
        .bind(&profile.email)
        .bind(&profile.image)
        .fetch_one(&mut *tx)
        .await?;
        row.get("id")
    };

    let inserted = sqlx::query(
        r"INSERT INTO accounts (user_id, provider, provider_account_id) VALUES ($1, $2, $3)
          ON CONFLICT (provider, provider_account_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(profile.provider.as_str())
    .bind(&profile.provider_account_id)
    .execute(&mut *tx)
    .await?;

    if inserted.rows_affected() == 0 {
        // A concurrent first sign-in linked the same identity; use its user.
        tx.rollback().await?;
        let mut conn = pool.acquire().await?;
        return linked_user(&mut conn, profile.provider, &profile.provider_account_id)
            .await?
            .ok_or_else(|| AuthError::Db(sqlx::Error::RowNotFound));
    }

    tx.commit().await?;
    Ok(user_id)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
