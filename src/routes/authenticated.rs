use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Authenticated Router Module
///
/// Blog and comment endpoints. Each request must carry
/// `Authorization: Basic base64(username:password)`; the request gate resolves it
/// before dispatch and handlers read the identity through the `AuthUser` extractor.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Blogs ---
        // POST /postBlogs creates, GET /postBlogs lists with an exact-match filter.
        .route(
            "/postBlogs",
            post(handlers::create_blog).get(handlers::list_blogs),
        )
        // GET/PUT/DELETE /postBlogs/{id}
        // Single-document read, partial update and delete (comments are kept).
        .route(
            "/postBlogs/{id}",
            get(handlers::get_blog)
                .put(handlers::update_blog)
                .delete(handlers::delete_blog),
        )
        // --- Comments ---
        // POST/GET /blogposts/{id}/comments
        // Comments on an existing blog, and the comments of a blog (even a deleted one).
        .route(
            "/blogposts/{id}/comments",
            post(handlers::add_comment).get(handlers::get_comments),
        )
        // DELETE /comments/{id}
        // Idempotent comment delete.
        .route("/comments/{id}", delete(handlers::delete_comment))
}
