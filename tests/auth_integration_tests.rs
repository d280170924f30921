use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, Request, header, request::Parts},
};
use base64::{Engine, engine::general_purpose};
use inkwell::{
    ApiError, AppConfig, AppState, InMemoryRepository,
    auth::{AuthUser, Authenticator, parse_basic_authorization},
    models::RegisterUserRequest,
    repository::RepositoryState,
};
use std::sync::Arc;

// --- Helpers ---

fn basic(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        general_purpose::STANDARD.encode(format!("{username}:{password}"))
    )
}

fn parts_with_authorization(value: Option<&str>) -> Parts {
    let mut builder = Request::builder().uri("/postBlogs");
    if let Some(value) = value {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(()).unwrap().into_parts().0
}

/// State over a fresh in-memory store with a111/123456 registered.
async fn state_with_a111() -> AppState {
    let repo = Arc::new(InMemoryRepository::new()) as RepositoryState;
    let state = AppState::new(repo, AppConfig::default());
    state
        .credentials
        .create(RegisterUserRequest {
            username: "a111".to_string(),
            password: "123456".to_string(),
            email: "a111@x.com".to_string(),
        })
        .await
        .expect("seed user");
    state
}

// --- Header parsing ---

#[test]
fn test_parse_basic_authorization_valid() {
    let creds = parse_basic_authorization(&basic("a111", "123456")).unwrap();
    assert_eq!(creds.username, "a111");
    assert_eq!(creds.password, "123456");
}

#[test]
fn test_parse_basic_authorization_password_with_colon() {
    let creds = parse_basic_authorization(&basic("a111", "12:34:56")).unwrap();
    assert_eq!(creds.username, "a111");
    assert_eq!(creds.password, "12:34:56");
}

#[test]
fn test_parse_basic_authorization_scheme_is_case_insensitive() {
    let value = basic("a111", "123456").replacen("Basic", "bAsIc", 1);
    assert!(parse_basic_authorization(&value).is_some());
}

#[test]
fn test_parse_basic_authorization_rejects_bad_shapes() {
    // Wrong scheme
    assert!(parse_basic_authorization("Bearer abc").is_none());
    // No payload
    assert!(parse_basic_authorization("Basic").is_none());
    // Not base64
    assert!(parse_basic_authorization("Basic ***").is_none());
    // No colon separator
    let no_colon = format!("Basic {}", general_purpose::STANDARD.encode("a111"));
    assert!(parse_basic_authorization(&no_colon).is_none());
    // Empty username
    assert!(parse_basic_authorization(&basic("", "123456")).is_none());
}

#[test]
fn test_basic_credentials_debug_redacts_password() {
    let creds = parse_basic_authorization(&basic("a111", "s3cret")).unwrap();
    let printed = format!("{creds:?}");
    assert!(printed.contains("a111"));
    assert!(!printed.contains("s3cret"));
}

// --- Authenticator ---

#[tokio::test]
async fn test_verify_login_outcomes() {
    let state = state_with_a111().await;
    let authenticator: Authenticator = state.authenticator.clone();

    let user = authenticator.verify_login("a111", "123456").await.unwrap();
    assert_eq!(user.username, "a111");

    let wrong = authenticator.verify_login("a111", "654321").await;
    assert_eq!(wrong.unwrap_err(), ApiError::unauthorized("wrong password"));

    let unknown = authenticator.verify_login("zzz", "123456").await;
    assert!(matches!(unknown, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_resolve_identity_hides_unknown_users() {
    let state = state_with_a111().await;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&basic("ghost", "123456")).unwrap(),
    );

    let err = state.authenticator.resolve_identity(&headers).await.unwrap_err();
    assert_eq!(err, ApiError::unauthorized("invalid credentials"));
}

#[tokio::test]
async fn test_resolve_identity_missing_header() {
    let state = state_with_a111().await;
    let err = state
        .authenticator
        .resolve_identity(&HeaderMap::new())
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::unauthorized("missing authorization"));
}

// --- AuthUser extractor ---

#[tokio::test]
async fn test_auth_user_extractor_success() {
    let state = state_with_a111().await;
    let mut parts = parts_with_authorization(Some(&basic("a111", "123456")));

    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(user.username, "a111");
    // The resolved identity is cached on the request.
    assert_eq!(parts.extensions.get::<AuthUser>(), Some(&user));
}

#[tokio::test]
async fn test_auth_user_extractor_prefers_gate_identity() {
    let state = state_with_a111().await;
    let mut parts = parts_with_authorization(None);
    let attached = AuthUser {
        id: uuid::Uuid::new_v4(),
        username: "from-gate".to_string(),
    };
    parts.extensions.insert(attached.clone());

    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(user, attached);
}

#[tokio::test]
async fn test_auth_user_extractor_rejections() {
    let state = state_with_a111().await;

    let mut missing = parts_with_authorization(None);
    let err = AuthUser::from_request_parts(&mut missing, &state)
        .await
        .unwrap_err();
    assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);

    let mut wrong = parts_with_authorization(Some(&basic("a111", "bad-password")));
    let err = AuthUser::from_request_parts(&mut wrong, &state)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::unauthorized("invalid credentials"));
}

#[tokio::test]
async fn test_unknown_user_still_runs_a_password_comparison() {
    let state = state_with_a111().await;

    // The miss path hashes a throwaway password on first use and reuses it afterwards;
    // both calls must still report the user as unknown.
    for password in ["123456", "anything-else"] {
        let result = state.authenticator.verify_login("nobody", password).await;
        assert_eq!(result.unwrap_err(), ApiError::not_found("user does not exist"));
    }
}
