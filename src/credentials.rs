//! Credential store
//!
//! Owns user registration and lookup. Passwords are hashed with bcrypt (salted, cost
//! factor from [`AppConfig::bcrypt_cost`](crate::config::AppConfig)) before they reach
//! the repository; the plaintext is dropped as soon as the hash exists.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{RegisterUserRequest, User};
use crate::repository::RepositoryState;

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 30;
pub const PASSWORD_MIN_LENGTH: usize = 6;
/// bcrypt only reads the first 72 bytes; longer input would silently collide.
pub const PASSWORD_MAX_BYTES: usize = 72;
const EMAIL_MAX_LENGTH: usize = 254;
// Hashed once per store and compared against when a username is unknown.
const DUMMY_PASSWORD: &str = "inkwell-unknown-user";

/// CredentialStore
///
/// Cheap to clone: holds the shared repository handle and the hashing cost.
#[derive(Clone)]
pub struct CredentialStore {
    repo: RepositoryState,
    bcrypt_cost: u32,
    dummy_hash: Arc<OnceCell<String>>,
}

impl CredentialStore {
    pub fn new(repo: RepositoryState, bcrypt_cost: u32) -> Self {
        Self {
            repo,
            bcrypt_cost,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// create
    ///
    /// Validates the candidate, hashes the password and inserts the user. Duplicate
    /// username or email surfaces as `ApiError::Validation`.
    pub async fn create(&self, candidate: RegisterUserRequest) -> ApiResult<User> {
        let RegisterUserRequest {
            username,
            password,
            email,
        } = candidate;

        let username = normalize_username(&username)?;
        let email = normalize_email(&email)?;
        check_password_policy(&password)?;

        // Early duplicate check gives a clean message; the unique index is still the arbiter.
        if self
            .repo
            .find_user_by_username(&username)
            .await
            .map_err(|e| e.into_api("Fail to create user"))?
            .is_some()
        {
            return Err(ApiError::validation("username already exists"));
        }

        let password_hash = hash_password(password, self.bcrypt_cost).await?;

        let user = User {
            id: Uuid::new_v4(),
            username,
            password_hash,
            email,
            registration_date: Utc::now(),
        };

        let created = self
            .repo
            .insert_user(user)
            .await
            .map_err(|e| e.into_api("Fail to create user"))?;

        tracing::info!(user_id = %created.id, username = %created.username, "user registered");
        Ok(created)
    }

    /// find_by_username
    ///
    /// Exact lookup on the trimmed name.
    pub async fn find_by_username(&self, username: &str) -> ApiResult<User> {
        self.repo
            .find_user_by_username(username.trim())
            .await
            .map_err(|e| e.into_api("Fail to load user"))?
            .ok_or_else(|| ApiError::not_found("user does not exist"))
    }

    /// find_by_id
    ///
    /// Resolves a typed user reference.
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<User> {
        self.repo
            .find_user_by_id(id)
            .await
            .map_err(|e| e.into_api("Fail to load user"))?
            .ok_or_else(|| ApiError::not_found("user does not exist"))
    }

    /// verify_unknown_user
    ///
    /// Runs a full bcrypt comparison at the store's cost against a throwaway hash, so a
    /// lookup miss costs as much time as a wrong password.
    pub async fn verify_unknown_user(&self, password: &str) -> ApiResult<()> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| hash_password(DUMMY_PASSWORD.to_string(), self.bcrypt_cost))
            .await?;
        verify_password(password.to_string(), hash.clone()).await?;
        Ok(())
    }
}

/// Hashes on the blocking pool: a bcrypt round at production cost takes ~100ms+.
pub async fn hash_password(password: String, cost: u32) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| {
            tracing::error!("hash task failed: {:?}", e);
            ApiError::internal("Fail to create user")
        })?
        .map_err(|e| {
            tracing::error!("bcrypt hash error: {:?}", e);
            ApiError::internal("Fail to create user")
        })
}

/// Verifies with bcrypt's own constant-time check. A malformed stored hash counts as
/// a mismatch rather than an error, so it can never authenticate.
pub async fn verify_password(password: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|e| {
            tracing::error!("verify task failed: {:?}", e);
            ApiError::internal("fail to login")
        })
}

pub fn normalize_username(raw: &str) -> ApiResult<String> {
    let username = raw.trim();
    let len = username.chars().count();
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&len) {
        return Err(ApiError::validation(format!(
            "username must be between {USERNAME_MIN_LENGTH} and {USERNAME_MAX_LENGTH} characters"
        )));
    }
    // A colon would make the Basic-auth payload ambiguous.
    if username.contains(':') {
        return Err(ApiError::validation("username must not contain ':'"));
    }
    Ok(username.to_string())
}

pub fn normalize_email(raw: &str) -> ApiResult<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::validation("email is required"));
    }
    if email.len() > EMAIL_MAX_LENGTH || !is_valid_email(&email) {
        return Err(ApiError::validation("invalid email format"));
    }
    Ok(email)
}

pub fn check_password_policy(password: &str) -> ApiResult<()> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(ApiError::validation(format!(
            "password must be at least {PASSWORD_MIN_LENGTH} characters"
        )));
    }
    if password.len() > PASSWORD_MAX_BYTES {
        return Err(ApiError::validation(format!(
            "password must be at most {PASSWORD_MAX_BYTES} bytes"
        )));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > 64 || local.chars().any(char::is_whitespace) {
        return false;
    }

    if domain.is_empty() || !domain.contains('.') || domain.contains('@') {
        return false;
    }

    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return false;
    }

    !(domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains(".."))
}
