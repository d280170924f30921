use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use base64::{Engine, engine::general_purpose};
use uuid::Uuid;

use crate::{
    credentials::{CredentialStore, verify_password},
    error::{ApiError, ApiResult},
    models::User,
};

/// AuthUser
///
/// The resolved identity of an authenticated request. The request gate inserts it into
/// the request extensions; handlers take it as an argument.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// BasicCredentials
///
/// The decoded `username:password` pair of a Basic `Authorization` header.
#[derive(Clone, PartialEq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// parse_basic_authorization
///
/// Accepts `Basic <base64(username:password)>` (scheme case-insensitive) and splits the
/// decoded payload on the FIRST colon, so passwords may contain colons. Returns `None`
/// for any other shape.
pub fn parse_basic_authorization(value: &str) -> Option<BasicCredentials> {
    let (scheme, payload) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = general_purpose::STANDARD.decode(payload.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    if username.is_empty() {
        return None;
    }

    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Authenticator
///
/// Verifies presented credentials against the credential store. Stateless: no token is
/// issued, so every protected request carries the credentials again.
#[derive(Clone)]
pub struct Authenticator {
    credentials: CredentialStore,
}

impl Authenticator {
    pub fn new(credentials: CredentialStore) -> Self {
        Self { credentials }
    }

    /// verify_login
    ///
    /// `NotFound` when the username is unknown, `Unauthorized` when the password does
    /// not match the stored hash. Both paths pay for one bcrypt comparison.
    pub async fn verify_login(&self, username: &str, password: &str) -> ApiResult<User> {
        let user = match self.credentials.find_by_username(username).await {
            Ok(user) => user,
            Err(not_found @ ApiError::NotFound(_)) => {
                self.credentials.verify_unknown_user(password).await?;
                return Err(not_found);
            }
            Err(e) => return Err(e),
        };

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            tracing::debug!(username = %user.username, "password mismatch");
            return Err(ApiError::unauthorized("wrong password"));
        }

        Ok(user)
    }

    /// resolve_identity
    ///
    /// Per-request identity resolution from the `Authorization` header. Every failure,
    /// including an unknown username, is reported as `Unauthorized` so the response does
    /// not reveal which usernames exist.
    pub async fn resolve_identity(&self, headers: &HeaderMap) -> ApiResult<AuthUser> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthorized("missing authorization"))?
            .to_str()
            .map_err(|_| ApiError::unauthorized("malformed authorization"))?;

        let presented = parse_basic_authorization(value)
            .ok_or_else(|| ApiError::unauthorized("malformed authorization"))?;

        match self
            .verify_login(&presented.username, &presented.password)
            .await
        {
            Ok(user) => Ok(AuthUser::from(&user)),
            Err(ApiError::NotFound(_)) | Err(ApiError::Unauthorized(_)) => {
                Err(ApiError::unauthorized("invalid credentials"))
            }
            Err(other) => Err(other),
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Reads the identity the request gate attached to the request. When a route is mounted
/// without the gate, it falls back to resolving the `Authorization` header itself, so a
/// handler taking `AuthUser` can never run unauthenticated.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Authenticator: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let authenticator = Authenticator::from_ref(state);
        let user = authenticator.resolve_identity(&parts.headers).await?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
