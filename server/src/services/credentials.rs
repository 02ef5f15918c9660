//! Email + password accounts: registration and credential verification.
//!
//! Passwords are hashed with bcrypt on a blocking worker so request tasks
//! stay responsive. Lookups use the normalized (trimmed, lowercase) email.

use serde::Deserialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::session::SessionUser;

const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("name is required")]
    MissingName,
    #[error("password is required")]
    MissingPassword,
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Registration payload as posted by the auth form.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Credential sign-in payload. Extra form fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

/// Read `BCRYPT_COST`, clamped to the range bcrypt accepts.
#[must_use]
pub fn bcrypt_cost() -> u32 {
    parse_bcrypt_cost(std::env::var("BCRYPT_COST").ok().as_deref())
}

pub(crate) fn parse_bcrypt_cost(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .map_or(bcrypt::DEFAULT_COST, |c| c.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST))
}

/// Validated registration fields: `(name, normalized email)`.
pub(crate) fn validate_registration(req: &RegisterRequest) -> Result<(String, String), CredentialsError> {
    let email = normalize_email(&req.email).ok_or(CredentialsError::InvalidEmail)?;
    let name = req.name.trim();
    if name.is_empty() {
        return Err(CredentialsError::MissingName);
    }
    if req.password.is_empty() {
        return Err(CredentialsError::MissingPassword);
    }
    Ok((name.to_owned(), email))
}

pub async fn hash_password(password: &str, cost: u32) -> Result<String, CredentialsError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| CredentialsError::Hash(e.to_string()))?
        .map_err(|e| CredentialsError::Hash(e.to_string()))
}

pub async fn verify_password(password: &str, hashed: &str) -> Result<bool, CredentialsError> {
    let password = password.to_owned();
    let hashed = hashed.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hashed))
        .await
        .map_err(|e| CredentialsError::Hash(e.to_string()))?
        .map_err(|e| CredentialsError::Hash(e.to_string()))
}

/// Create an email + password user.
///
/// # Errors
///
/// Validation failures, [`CredentialsError::EmailTaken`] when the email is
/// already registered, or a database/hashing error.
pub async fn register_user(pool: &PgPool, req: &RegisterRequest, cost: u32) -> Result<SessionUser, CredentialsError> {
    let (name, email) = validate_registration(req)?;
    let hashed = hash_password(&req.password, cost).await?;

    let row = sqlx::query(
        r"INSERT INTO users (name, email, hashed_password)
          VALUES ($1, $2, $3)
          ON CONFLICT (email) DO NOTHING
          RETURNING id, name, email, image",
    )
    .bind(&name)
    .bind(&email)
    .bind(hashed)
    .fetch_optional(pool)
    .await?
    .ok_or(CredentialsError::EmailTaken)?;

    Ok(SessionUser { id: row.get("id"), name: row.get("name"), email: row.get("email"), image: row.get("image") })
}

/// Check an email/password pair, returning the user id on success.
///
/// Unknown emails, provider-only accounts and wrong passwords all collapse
/// into [`CredentialsError::InvalidCredentials`].
pub async fn verify_credentials(pool: &PgPool, req: &CredentialsRequest) -> Result<Uuid, CredentialsError> {
    let email = normalize_email(&req.email).ok_or(CredentialsError::InvalidCredentials)?;
    if req.password.is_empty() {
        return Err(CredentialsError::InvalidCredentials);
    }

    let row = sqlx::query("SELECT id, hashed_password FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?
        .ok_or(CredentialsError::InvalidCredentials)?;

    let hashed: Option<String> = row.get("hashed_password");
    let Some(hashed) = hashed else {
        return Err(CredentialsError::InvalidCredentials);
    };

    if verify_password(&req.password, &hashed).await? {
        Ok(row.get("id"))
    } else {
        Err(CredentialsError::InvalidCredentials)
    }
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
