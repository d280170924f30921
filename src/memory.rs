use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::RepoError;
use crate::models::{Blog, BlogFilter, Comment, UpdateBlogRequest, User};
use crate::repository::Repository;

/// InMemoryRepository
///
/// `Repository` kept entirely in process memory. Used when no `DATABASE_URL` is
/// configured in local mode and by the test-suite.
/// Each collection keeps insertion order so listings are stable.
#[derive(Default)]
pub struct InMemoryRepository {
    collections: RwLock<Collections>,
}

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    blogs: Vec<Blog>,
    comments: Vec<Comment>,
    // username -> index into `users`, mirrors the unique index of the SQL store.
    usernames: HashMap<String, usize>,
    emails: HashMap<String, usize>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert_user(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.collections.write().await;
        if store.usernames.contains_key(&user.username) {
            return Err(RepoError::Duplicate("username"));
        }
        if store.emails.contains_key(&user.email) {
            return Err(RepoError::Duplicate("email"));
        }
        let index = store.users.len();
        store.usernames.insert(user.username.clone(), index);
        store.emails.insert(user.email.clone(), index);
        store.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let store = self.collections.read().await;
        Ok(store
            .usernames
            .get(username)
            .and_then(|&i| store.users.get(i))
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let store = self.collections.read().await;
        Ok(store.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_blog(&self, blog: Blog) -> Result<Blog, RepoError> {
        self.collections.write().await.blogs.push(blog.clone());
        Ok(blog)
    }

    async fn find_blogs(&self, filter: &BlogFilter) -> Result<Vec<Blog>, RepoError> {
        let store = self.collections.read().await;
        Ok(store
            .blogs
            .iter()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect())
    }

    async fn find_blog(&self, id: Uuid) -> Result<Option<Blog>, RepoError> {
        let store = self.collections.read().await;
        Ok(store.blogs.iter().find(|b| b.id == id).cloned())
    }

    async fn update_blog(
        &self,
        id: Uuid,
        patch: &UpdateBlogRequest,
    ) -> Result<Option<Blog>, RepoError> {
        let mut store = self.collections.write().await;
        let Some(blog) = store.blogs.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        if let Some(title) = &patch.title {
            blog.title = title.clone();
        }
        if let Some(content) = &patch.content {
            blog.content = content.clone();
        }
        if let Some(author) = patch.author {
            blog.author = author;
        }
        if let Some(categories) = &patch.categories {
            blog.categories = categories.clone();
        }
        Ok(Some(blog.clone()))
    }

    async fn delete_blog(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut store = self.collections.write().await;
        let before = store.blogs.len();
        store.blogs.retain(|b| b.id != id);
        Ok(store.blogs.len() < before)
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment, RepoError> {
        self.collections.write().await.comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_comments_for_blog(&self, blog_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let store = self.collections.read().await;
        Ok(store
            .comments
            .iter()
            .filter(|c| c.reference_to_blog_post == blog_id)
            .cloned()
            .collect())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut store = self.collections.write().await;
        let before = store.comments.len();
        store.comments.retain(|c| c.id != id);
        Ok(store.comments.len() < before)
    }

    async fn clear(&self) -> Result<(), RepoError> {
        *self.collections.write().await = Collections::default();
        Ok(())
    }
}
