//! Resets the Postgres document store to a small fixture set: two users sharing the
//! password `123456`, two blogs and two comments on the first blog.

use chrono::Utc;
use inkwell::{
    config::AppConfig,
    credentials::hash_password,
    models::{Blog, Comment, User},
    repository::{PostgresRepository, Repository},
};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

const SEED_PASSWORD: &str = "123456";
const SEED_COST: u32 = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkwell=info,seed=info".into()),
        )
        .init();

    let config = AppConfig::load();
    let Some(db_url) = config.db_url else {
        return Err("DATABASE_URL must point at the database to seed".into());
    };

    let pool = PgPoolOptions::new().max_connections(2).connect(&db_url).await?;
    let repo = PostgresRepository::new(pool);
    repo.ensure_schema().await?;
    repo.clear().await?;

    let password_hash = hash_password(SEED_PASSWORD.to_string(), SEED_COST).await?;

    let a111 = repo.insert_user(seed_user("a111", &password_hash)).await?;
    let b111 = repo.insert_user(seed_user("b111", &password_hash)).await?;

    let hello = repo
        .insert_blog(seed_blog("Hello", "world", "tech", a111.id))
        .await?;
    repo.insert_blog(seed_blog("News", "today", "life", b111.id))
        .await?;

    repo.insert_comment(seed_comment("Nice post", b111.id, hello.id))
        .await?;
    repo.insert_comment(seed_comment("Thanks!", a111.id, hello.id))
        .await?;

    tracing::info!("Seed done");
    Ok(())
}

fn seed_user(username: &str, password_hash: &str) -> User {
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash: password_hash.to_string(),
        email: format!("{username}@x.com"),
        registration_date: Utc::now(),
    }
}

fn seed_blog(title: &str, content: &str, categories: &str, author: Uuid) -> Blog {
    Blog {
        id: Uuid::new_v4(),
        title: title.to_string(),
        content: content.to_string(),
        author,
        creation_date: Utc::now(),
        categories: categories.to_string(),
    }
}

fn seed_comment(text: &str, user: Uuid, blog: Uuid) -> Comment {
    Comment {
        id: Uuid::new_v4(),
        reference_to_user: user,
        text: text.to_string(),
        reference_to_blog_post: blog,
        creation_date: Utc::now(),
    }
}
