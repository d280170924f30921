use crate::error::RepoError;
use crate::models::{Blog, BlogFilter, Comment, UpdateBlogRequest, User};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// The document store contract: three collections (`users`, `blogs`, `comments`),
/// each keyed by a generated id. Every write is a single-document operation; the
/// store offers no cross-document transactions, so reference checks done by callers
/// are advisory at the moment of the write.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across Axum's
/// task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- users ---
    async fn insert_user(&self, user: User) -> Result<User, RepoError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    // --- blogs ---
    async fn insert_blog(&self, blog: Blog) -> Result<Blog, RepoError>;
    // Exact match on every `Some` field of the filter.
    async fn find_blogs(&self, filter: &BlogFilter) -> Result<Vec<Blog>, RepoError>;
    async fn find_blog(&self, id: Uuid) -> Result<Option<Blog>, RepoError>;
    // Writes only the `Some` fields. Returns the post-update document, `None` if absent.
    async fn update_blog(
        &self,
        id: Uuid,
        patch: &UpdateBlogRequest,
    ) -> Result<Option<Blog>, RepoError>;
    // Returns true if a document was removed. Comments are left untouched.
    async fn delete_blog(&self, id: Uuid) -> Result<bool, RepoError>;

    // --- comments ---
    async fn insert_comment(&self, comment: Comment) -> Result<Comment, RepoError>;
    async fn find_comments_for_blog(&self, blog_id: Uuid) -> Result<Vec<Comment>, RepoError>;
    async fn delete_comment(&self, id: Uuid) -> Result<bool, RepoError>;

    /// Empties all three collections. Used by the seed command.
    async fn clear(&self) -> Result<(), RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Collection layout. Executed on startup so a fresh database behaves like a
/// schema-less store that creates its collections on first use.
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL CONSTRAINT users_username_key UNIQUE,
        password_hash TEXT NOT NULL,
        email TEXT NOT NULL CONSTRAINT users_email_key UNIQUE,
        registration_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS blogs (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        author UUID NOT NULL,
        creation_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        categories TEXT NOT NULL
    )"#,
    // No foreign keys: references are resolved by lookup, and deleting a blog must
    // leave its comments in place.
    r#"CREATE TABLE IF NOT EXISTS comments (
        id UUID PRIMARY KEY,
        reference_to_user UUID NOT NULL,
        text TEXT NOT NULL,
        reference_to_blog_post UUID NOT NULL,
        creation_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    "CREATE INDEX IF NOT EXISTS comments_blog_idx ON comments (reference_to_blog_post)",
];

const BLOG_COLUMNS: &str = "id, title, content, author, creation_date, categories";
const COMMENT_COLUMNS: &str =
    "id, reference_to_user, text, reference_to_blog_post, creation_date";
const USER_COLUMNS: &str = "id, username, password_hash, email, registration_date";

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL through a sqlx connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// ensure_schema
    ///
    /// Creates the three collections and their unique indexes if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), RepoError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

/// Translates a unique-constraint violation on `users` into `RepoError::Duplicate`.
fn map_user_write_error(err: sqlx::Error) -> RepoError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_email_key") => RepoError::Duplicate("email"),
                _ => RepoError::Duplicate("username"),
            };
        }
    }
    RepoError::Database(err)
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn insert_user(&self, user: User) -> Result<User, RepoError> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.email)
            .bind(user.registration_date)
            .fetch_one(&self.pool)
            .await
            .map_err(map_user_write_error)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_blog(&self, blog: Blog) -> Result<Blog, RepoError> {
        let sql = format!(
            "INSERT INTO blogs ({BLOG_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {BLOG_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Blog>(&sql)
            .bind(blog.id)
            .bind(&blog.title)
            .bind(&blog.content)
            .bind(blog.author)
            .bind(blog.creation_date)
            .bind(&blog.categories)
            .fetch_one(&self.pool)
            .await?)
    }

    /// find_blogs
    ///
    /// Builds the sparse filter with QueryBuilder so every value is bound, never
    /// interpolated.
    async fn find_blogs(&self, filter: &BlogFilter) -> Result<Vec<Blog>, RepoError> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE TRUE"));

        if let Some(title) = &filter.title {
            builder.push(" AND title = ");
            builder.push_bind(title.clone());
        }
        if let Some(content) = &filter.content {
            builder.push(" AND content = ");
            builder.push_bind(content.clone());
        }
        if let Some(author) = filter.author {
            builder.push(" AND author = ");
            builder.push_bind(author);
        }
        if let Some(creation_date) = filter.creation_date {
            builder.push(" AND creation_date = ");
            builder.push_bind(creation_date);
        }
        if let Some(categories) = &filter.categories {
            builder.push(" AND categories = ");
            builder.push_bind(categories.clone());
        }

        builder.push(" ORDER BY creation_date ASC");

        Ok(builder
            .build_query_as::<Blog>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_blog(&self, id: Uuid) -> Result<Option<Blog>, RepoError> {
        let sql = format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE id = $1");
        Ok(sqlx::query_as::<_, Blog>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// update_blog
    ///
    /// Uses `COALESCE` so only the fields present in the patch are overwritten; the
    /// whole update is one atomic statement.
    async fn update_blog(
        &self,
        id: Uuid,
        patch: &UpdateBlogRequest,
    ) -> Result<Option<Blog>, RepoError> {
        let sql = format!(
            r#"UPDATE blogs
               SET title = COALESCE($2, title),
                   content = COALESCE($3, content),
                   author = COALESCE($4, author),
                   categories = COALESCE($5, categories)
               WHERE id = $1
               RETURNING {BLOG_COLUMNS}"#
        );
        Ok(sqlx::query_as::<_, Blog>(&sql)
            .bind(id)
            .bind(patch.title.as_deref())
            .bind(patch.content.as_deref())
            .bind(patch.author)
            .bind(patch.categories.as_deref())
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_blog(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment, RepoError> {
        let sql = format!(
            "INSERT INTO comments ({COMMENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5) RETURNING {COMMENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(comment.id)
            .bind(comment.reference_to_user)
            .bind(&comment.text)
            .bind(comment.reference_to_blog_post)
            .bind(comment.creation_date)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_comments_for_blog(&self, blog_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE reference_to_blog_post = $1 ORDER BY creation_date ASC"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(blog_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn clear(&self) -> Result<(), RepoError> {
        sqlx::query("TRUNCATE comments, blogs, users")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
