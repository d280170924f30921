use axum::{Router, extract::FromRef, http::HeaderName, middleware};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core services, leaves first.
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod repository;
pub mod memory;
pub mod credentials;
pub mod auth;
pub mod resources;
pub mod gate;
pub mod handlers;

// Routing split by access level (public, authenticated).
pub mod routes;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use auth::{AuthUser, Authenticator};
pub use config::AppConfig;
pub use credentials::CredentialStore;
pub use error::{ApiError, ApiResult};
pub use gate::{AllowList, RequestGate};
pub use memory::InMemoryRepository;
pub use repository::{PostgresRepository, Repository, RepositoryState};
pub use resources::ResourceRepository;

/// ApiDoc
///
/// Aggregates the `#[utoipa::path]` handlers and `ToSchema` models into the OpenAPI
/// document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_user, handlers::login,
        handlers::create_blog, handlers::list_blogs, handlers::get_blog,
        handlers::update_blog, handlers::delete_blog,
        handlers::add_comment, handlers::get_comments, handlers::delete_comment
    ),
    components(
        schemas(
            models::Blog, models::Comment, models::RegisterUserRequest, models::LoginRequest,
            models::CreateBlogRequest, models::UpdateBlogRequest, models::CreateCommentRequest,
            models::UserProfile, models::RegisteredUser, models::BlogEnvelope,
            models::MessageResponse,
        )
    ),
    tags(
        (name = "inkwell", description = "Blog posts and comments behind Basic auth")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for every service. All members are cheap clones over
/// the same `Arc<dyn Repository>`.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub credentials: CredentialStore,
    pub authenticator: Authenticator,
    pub resources: ResourceRepository,
    pub config: AppConfig,
}

impl AppState {
    /// Assembles every service over one repository handle.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        let credentials = CredentialStore::new(repo.clone(), config.bcrypt_cost);
        let authenticator = Authenticator::new(credentials.clone());
        let resources = ResourceRepository::new(repo.clone(), credentials.clone());
        Self {
            repo,
            credentials,
            authenticator,
            resources,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for Authenticator {
    fn from_ref(app_state: &AppState) -> Authenticator {
        app_state.authenticator.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing table, installs the request gate in front of every route,
/// and wraps everything in the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let gate_state = RequestGate::new(state.authenticator.clone(), AllowList::default());

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        // Static assets, allow-listed by the gate under the same prefix.
        .nest_service("/public", ServeDir::new(&state.config.static_dir))
        .with_state(state)
        // The gate sees every request before routing; the allow-list decides which
        // paths skip authentication.
        .layer(middleware::from_fn_with_state(gate_state, gate::request_gate));

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span so every log line of one request carries the same
/// `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
