//! Resource repository
//!
//! Blog-post and comment operations on top of the document store. This layer owns the
//! input validation and the reference checks (author and comment targets must exist
//! when written); the store itself only stores documents.

use chrono::Utc;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::credentials::CredentialStore;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Blog, BlogFilter, Comment, CreateBlogRequest, CreateCommentRequest, UpdateBlogRequest,
};
use crate::repository::RepositoryState;

/// ResourceRepository
#[derive(Clone)]
pub struct ResourceRepository {
    repo: RepositoryState,
    credentials: CredentialStore,
}

impl ResourceRepository {
    pub fn new(repo: RepositoryState, credentials: CredentialStore) -> Self {
        Self { repo, credentials }
    }

    /// create_post
    ///
    /// The author defaults to the caller. An explicit author must be an existing user.
    pub async fn create_post(&self, caller: &AuthUser, input: CreateBlogRequest) -> ApiResult<Blog> {
        let author = match input.author {
            Some(author) => {
                self.ensure_user_exists(author, "author").await?;
                author
            }
            None => caller.id,
        };

        let blog = Blog {
            id: Uuid::new_v4(),
            title: input.title,
            content: input.content,
            author,
            creation_date: Utc::now(),
            categories: input.categories,
        };

        let blog = self
            .repo
            .insert_blog(blog)
            .await
            .map_err(|e| e.into_api("Fail to post blog"))?;

        tracing::info!(blog_id = %blog.id, author = %blog.author, "blog posted");
        Ok(blog)
    }

    /// list_posts
    ///
    /// Every post matching the sparse filter; no pagination.
    pub async fn list_posts(&self, filter: &BlogFilter) -> ApiResult<Vec<Blog>> {
        self.repo
            .find_blogs(filter)
            .await
            .map_err(|e| e.into_api("Fail to get blog"))
    }

    pub async fn get_post(&self, id: Uuid) -> ApiResult<Blog> {
        self.repo
            .find_blog(id)
            .await
            .map_err(|e| e.into_api("Fail to get blog"))?
            .ok_or_else(|| ApiError::not_found("not found"))
    }

    /// update_post
    ///
    /// Partial update. A present title must not be blank and a present author must
    /// resolve. Returns the document as it is after the write.
    pub async fn update_post(&self, id: Uuid, patch: UpdateBlogRequest) -> ApiResult<Blog> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ApiError::validation("title must not be empty"));
        }
        if let Some(author) = patch.author {
            self.ensure_user_exists(author, "author").await?;
        }

        if patch.is_empty() {
            return self.get_post(id).await.map_err(blog_not_found);
        }

        self.repo
            .update_blog(id, &patch)
            .await
            .map_err(|e| e.into_api("Fail to update blog"))?
            .ok_or_else(|| ApiError::not_found("Blog not found"))
    }

    /// delete_post
    ///
    /// Removes the post only; its comments stay in the store.
    pub async fn delete_post(&self, id: Uuid) -> ApiResult<()> {
        let deleted = self
            .repo
            .delete_blog(id)
            .await
            .map_err(|e| e.into_api("Fail to delete blog"))?;

        if !deleted {
            return Err(ApiError::not_found("Blog not found"));
        }
        tracing::info!(blog_id = %id, "blog deleted");
        Ok(())
    }

    /// create_comment
    ///
    /// Fails with `NotFound` and writes nothing when `post_id` does not resolve. The
    /// existence check and the insert are separate store calls.
    pub async fn create_comment(
        &self,
        caller: &AuthUser,
        post_id: Uuid,
        input: CreateCommentRequest,
    ) -> ApiResult<Comment> {
        if input.text.trim().is_empty() {
            return Err(ApiError::validation("text must not be empty"));
        }

        let parent = self
            .repo
            .find_blog(post_id)
            .await
            .map_err(|e| e.into_api("Fail to post comment"))?;
        if parent.is_none() {
            return Err(ApiError::not_found("Blog not found"));
        }

        let reference_to_user = match input.reference_to_user {
            Some(user_id) => {
                self.ensure_user_exists(user_id, "reference_to_User").await?;
                user_id
            }
            None => caller.id,
        };

        let comment = Comment {
            id: Uuid::new_v4(),
            reference_to_user,
            text: input.text,
            reference_to_blog_post: post_id,
            creation_date: Utc::now(),
        };

        let comment = self
            .repo
            .insert_comment(comment)
            .await
            .map_err(|e| e.into_api("Fail to post comment"))?;

        tracing::info!(comment_id = %comment.id, blog_id = %post_id, "comment posted");
        Ok(comment)
    }

    /// list_comments_for_post
    ///
    /// Does not require the post to still exist.
    pub async fn list_comments_for_post(&self, post_id: Uuid) -> ApiResult<Vec<Comment>> {
        self.repo
            .find_comments_for_blog(post_id)
            .await
            .map_err(|e| e.into_api("Fail to get comments"))
    }

    /// delete_comment
    ///
    /// Idempotent: deleting an absent comment succeeds.
    pub async fn delete_comment(&self, id: Uuid) -> ApiResult<()> {
        let deleted = self
            .repo
            .delete_comment(id)
            .await
            .map_err(|e| e.into_api("Fail to delete comment"))?;

        if deleted {
            tracing::info!(comment_id = %id, "comment deleted");
        } else {
            tracing::debug!(comment_id = %id, "comment already absent");
        }
        Ok(())
    }

    // A dangling user reference is bad input, not a missing resource.
    async fn ensure_user_exists(&self, id: Uuid, field: &str) -> ApiResult<()> {
        match self.credentials.find_by_id(id).await {
            Ok(_) => Ok(()),
            Err(ApiError::NotFound(_)) => Err(ApiError::validation(format!(
                "{field} does not reference an existing user"
            ))),
            Err(other) => Err(other),
        }
    }
}

fn blog_not_found(err: ApiError) -> ApiError {
    match err {
        ApiError::NotFound(_) => ApiError::not_found("Blog not found"),
        other => other,
    }
}
