use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use std::{fmt, str::FromStr};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// --- Stored Documents (one per collection) ---

/// User
///
/// A record of the `users` collection. Carries the bcrypt hash, so it is never
/// serialized directly; responses go through [`UserProfile`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    // Trimmed, unique, 3-30 characters.
    pub username: String,
    // bcrypt hash in modular crypt format. The plaintext is never stored.
    pub password_hash: String,
    // Trimmed, lower-cased, unique.
    pub email: String,
    pub registration_date: DateTime<Utc>,
}

/// Blog
///
/// A record of the `blogs` collection. `author` is a non-owning reference to a user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: Uuid,
    #[ts(type = "string")]
    pub creation_date: DateTime<Utc>,
    pub categories: String,
}

/// Comment
///
/// A record of the `comments` collection. Both references are lookups only: removing
/// the parent blog leaves the comment in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Comment {
    pub id: Uuid,
    // Wire names are part of the public JSON contract.
    #[serde(rename = "reference_to_User")]
    pub reference_to_user: Uuid,
    pub text: String,
    #[serde(rename = "reference_to_BlogPost")]
    pub reference_to_blog_post: Uuid,
    #[ts(type = "string")]
    pub creation_date: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input payload for POST /regist. The password only lives long enough to be hashed.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    #[schema(example = "a111")]
    pub username: String,
    #[schema(example = "123456")]
    pub password: String,
    #[schema(example = "a111@x.com")]
    pub email: String,
}

impl std::fmt::Debug for RegisterUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterUserRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("email", &self.email)
            .finish()
    }
}

/// LoginRequest
///
/// Input payload for POST /login.
#[derive(Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// CreateBlogRequest
///
/// Input payload for POST /postBlogs. When `author` is omitted the post is attributed
/// to the authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateBlogRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Uuid>,
    #[serde(default)]
    pub categories: String,
}

/// UpdateBlogRequest
///
/// Partial update payload for PUT /postBlogs/{id}. Only `Some` fields are written.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateBlogRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<String>,
}

impl UpdateBlogRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.author.is_none()
            && self.categories.is_none()
    }
}

/// CreateCommentRequest
///
/// Input payload for POST /blogposts/{id}/comments. `reference_to_User` defaults to
/// the authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    #[serde(
        rename = "reference_to_User",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reference_to_user: Option<Uuid>,
    #[serde(default)]
    pub text: String,
}

/// BlogFilter
///
/// Sparse exact-match filter for GET /postBlogs. Absent fields are unconstrained.
#[derive(Debug, Clone, Serialize, Deserialize, IntoParams, Default, PartialEq)]
#[into_params(parameter_in = Query)]
pub struct BlogFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub author: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub categories: Option<String>,
}

/// `?title=` leaves the field unconstrained instead of matching an empty title.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(de::Error::custom),
    }
}

impl BlogFilter {
    /// Returns true when `blog` satisfies every constrained field.
    pub fn matches(&self, blog: &Blog) -> bool {
        self.title.as_ref().is_none_or(|t| *t == blog.title)
            && self.content.as_ref().is_none_or(|c| *c == blog.content)
            && self.author.is_none_or(|a| a == blog.author)
            && self.creation_date.is_none_or(|d| d == blog.creation_date)
            && self.categories.as_ref().is_none_or(|c| *c == blog.categories)
    }
}

// --- Response Schemas (Output) ---

/// UserProfile
///
/// Public view of a [`User`]: everything except the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[ts(type = "string")]
    pub registration_date: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            registration_date: user.registration_date,
        }
    }
}

/// RegisteredUser
///
/// Response body of POST /regist.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisteredUser {
    pub message: String,
    pub user: UserProfile,
}

/// BlogEnvelope
///
/// Response body of POST /postBlogs and PUT /postBlogs/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct BlogEnvelope {
    pub message: String,
    pub blog: Blog,
}

/// MessageResponse
///
/// Plain acknowledgement body, also used for every error response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
