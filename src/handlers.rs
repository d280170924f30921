use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiQuery},
    models::{
        Blog, BlogEnvelope, BlogFilter, Comment, CreateBlogRequest, CreateCommentRequest,
        LoginRequest, MessageResponse, RegisterUserRequest, RegisteredUser, UpdateBlogRequest,
        UserProfile,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

/// Ids arrive as raw path segments; anything that is not a UUID cannot name a document.
fn parse_id(raw: &str, what: &'static str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found(what))
}

// --- Public handlers ---

/// index
///
/// [Public Route] Plain-text greeting at the root.
pub async fn index() -> &'static str {
    "Hello World from inkwell!"
}

/// register_user
///
/// [Public Route] Creates a user. The password is hashed before it is stored and the
/// response never includes the hash.
#[utoipa::path(
    post,
    path = "/regist",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User created", body = RegisteredUser),
        (status = 400, description = "Invalid or duplicate input", body = MessageResponse),
        (status = 500, description = "Store failure", body = MessageResponse)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterUserRequest>,
) -> ApiResult<(StatusCode, Json<RegisteredUser>)> {
    let user = state.credentials.create(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisteredUser {
            message: "user created".to_string(),
            user: UserProfile::from(user),
        }),
    ))
}

/// login
///
/// [Public Route] Checks a username/password pair. Stateless: nothing is issued on
/// success, clients send Basic credentials with every protected request.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = MessageResponse),
        (status = 401, description = "Unknown user or wrong password", body = MessageResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Json<MessageResponse>> {
    match state
        .authenticator
        .verify_login(&payload.username, &payload.password)
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "login succeeded");
            Ok(Json(MessageResponse::new("login successful")))
        }
        Err(ApiError::NotFound(_)) => Err(ApiError::unauthorized("user does not exist")),
        Err(e) => Err(e),
    }
}

// --- Blog handlers ---

/// create_blog
///
/// [Authenticated Route] Posts a blog. `author` defaults to the caller.
#[utoipa::path(
    post,
    path = "/postBlogs",
    request_body = CreateBlogRequest,
    responses(
        (status = 201, description = "Blog posted", body = BlogEnvelope),
        (status = 400, description = "Unknown author", body = MessageResponse)
    )
)]
pub async fn create_blog(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateBlogRequest>,
) -> ApiResult<(StatusCode, Json<BlogEnvelope>)> {
    let blog = state.resources.create_post(&user, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(BlogEnvelope {
            message: "blog posted".to_string(),
            blog,
        }),
    ))
}

/// list_blogs
///
/// [Authenticated Route] Lists every blog matching the exact-match query filter.
#[utoipa::path(
    get,
    path = "/postBlogs",
    params(BlogFilter),
    responses((status = 200, description = "Matching blogs", body = [Blog]))
)]
pub async fn list_blogs(
    _user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<BlogFilter>,
) -> ApiResult<Json<Vec<Blog>>> {
    Ok(Json(state.resources.list_posts(&filter).await?))
}

/// get_blog
///
/// [Authenticated Route] Retrieves a single blog.
#[utoipa::path(
    get,
    path = "/postBlogs/{id}",
    params(("id" = Uuid, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Found", body = Blog),
        (status = 404, description = "Not found", body = MessageResponse)
    )
)]
pub async fn get_blog(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Blog>> {
    let id = parse_id(&id, "not found")?;
    Ok(Json(state.resources.get_post(id).await?))
}

/// update_blog
///
/// [Authenticated Route] Partial update; returns the post-update document.
#[utoipa::path(
    put,
    path = "/postBlogs/{id}",
    params(("id" = Uuid, Path, description = "Blog ID")),
    request_body = UpdateBlogRequest,
    responses(
        (status = 200, description = "Updated", body = BlogEnvelope),
        (status = 400, description = "Invalid patch", body = MessageResponse),
        (status = 404, description = "Not found", body = MessageResponse)
    )
)]
pub async fn update_blog(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateBlogRequest>,
) -> ApiResult<Json<BlogEnvelope>> {
    let id = parse_id(&id, "Blog not found")?;
    let blog = state.resources.update_post(id, payload).await?;
    Ok(Json(BlogEnvelope {
        message: "Blog updated".to_string(),
        blog,
    }))
}

/// delete_blog
///
/// [Authenticated Route] Deletes a blog. Its comments are kept.
#[utoipa::path(
    delete,
    path = "/postBlogs/{id}",
    params(("id" = Uuid, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = MessageResponse)
    )
)]
pub async fn delete_blog(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, "Blog not found")?;
    state.resources.delete_post(id).await?;
    Ok(Json(MessageResponse::new("Blog deleted")))
}

// --- Comment handlers ---

/// add_comment
///
/// [Authenticated Route] Comments on an existing blog. Nothing is written when the blog
/// does not exist.
#[utoipa::path(
    post,
    path = "/blogposts/{id}/comments",
    params(("id" = Uuid, Path, description = "Blog ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment added", body = Comment),
        (status = 404, description = "Blog not found", body = MessageResponse)
    )
)]
pub async fn add_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    let post_id = parse_id(&post_id, "Blog not found")?;
    let comment = state
        .resources
        .create_comment(&user, post_id, payload)
        .await?;
    Ok(Json(comment))
}

/// get_comments
///
/// [Authenticated Route] Lists the comments of a blog, even after the blog was deleted.
#[utoipa::path(
    get,
    path = "/blogposts/{id}/comments",
    params(("id" = Uuid, Path, description = "Blog ID")),
    responses((status = 200, description = "Comments", body = [Comment]))
)]
pub async fn get_comments(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<Vec<Comment>>> {
    // A malformed id cannot match any comment.
    let Ok(post_id) = Uuid::parse_str(post_id.trim()) else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(state.resources.list_comments_for_post(post_id).await?))
}

/// delete_comment
///
/// [Authenticated Route] Idempotent delete: succeeds whether or not the comment exists.
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    params(("id" = Uuid, Path, description = "Comment ID")),
    responses((status = 200, description = "Deleted or already absent", body = MessageResponse))
)]
pub async fn delete_comment(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    if let Ok(id) = Uuid::parse_str(id.trim()) {
        state.resources.delete_comment(id).await?;
    }
    Ok(Json(MessageResponse::new("Comment deleted")))
}
