use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::{auth::Authenticator, error::ApiError};

/// Routes reachable without credentials: registration, login and the utility routes.
pub const PUBLIC_PATHS: &[&str] = &["/", "/health", "/regist", "/login"];

/// Path prefixes reachable without credentials (static assets and API docs).
pub const PUBLIC_PREFIXES: &[&str] = &["/public", "/swagger-ui", "/api-docs"];

/// AllowList
///
/// Exact paths plus segment-aligned prefixes: `/public` admits `/public/app.css` but not
/// `/publicity`.
#[derive(Debug, Clone)]
pub struct AllowList {
    paths: Vec<String>,
    prefixes: Vec<String>,
}

impl AllowList {
    pub fn new<P, Q>(paths: P, prefixes: Q) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        Q: IntoIterator,
        Q::Item: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn permits(&self, path: &str) -> bool {
        if self.paths.iter().any(|p| p == path) {
            return true;
        }
        self.prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(PUBLIC_PATHS.iter().copied(), PUBLIC_PREFIXES.iter().copied())
    }
}

/// RequestGate
///
/// The guard the router runs before dispatch. Allow-listed paths pass straight through;
/// every other request must resolve to an identity, which is attached to the request
/// extensions for the `AuthUser` extractor.
#[derive(Clone)]
pub struct RequestGate {
    authenticator: Authenticator,
    allow_list: Arc<AllowList>,
}

impl RequestGate {
    pub fn new(authenticator: Authenticator, allow_list: AllowList) -> Self {
        Self {
            authenticator,
            allow_list: Arc::new(allow_list),
        }
    }
}

/// request_gate
///
/// Middleware function installed with `middleware::from_fn_with_state`. Rejections are
/// rendered as 401 before any repository call happens.
pub async fn request_gate(
    State(gate): State<RequestGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path();
    if gate.allow_list.permits(path) {
        return Ok(next.run(request).await);
    }

    match gate.authenticator.resolve_identity(request.headers()).await {
        Ok(user) => {
            tracing::debug!(user_id = %user.id, username = %user.username, "request authenticated");
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::info!(path = %request.uri().path(), reason = %e, "request rejected by gate");
            Err(e)
        }
    }
}
