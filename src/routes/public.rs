use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without credentials. Every path here must also appear in the
/// gate's allow-list (`gate::PUBLIC_PATHS`), otherwise the gate rejects it first.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Plain-text greeting.
        .route("/", get(handlers::index))
        // GET /health
        // Liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /regist
        // Creates a user; the password is hashed before it is stored.
        .route("/regist", post(handlers::register_user))
        // POST /login
        // Verifies a username/password pair. No session is created.
        .route("/login", post(handlers::login))
}
