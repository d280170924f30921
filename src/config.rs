use std::env;

/// Default listen address.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Default directory served under `/public`.
const DEFAULT_STATIC_DIR: &str = "public";

pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

/// AppConfig
///
/// Holds the application's entire configuration state. It is loaded once at startup,
/// never mutated afterwards, and pulled into handlers and the request gate via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` in local mode selects the in-memory document store.
    pub db_url: Option<String>,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // bcrypt work factor used when hashing new passwords.
    pub bcrypt_cost: u32,
    // Directory of static assets exposed under `/public`.
    pub static_dir: String,
    // Runtime environment marker. Controls log format and which settings are mandatory.
    pub env: Env,
}

/// Env
///
/// Defines the runtime context: a developer machine or a production deployment.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Provides a non-panicking configuration for test setup. Uses the cheapest
    /// bcrypt cost so credential tests stay fast.
    fn default() -> Self {
        Self {
            db_url: None,
            bind_addr: "127.0.0.1:0".to_string(),
            bcrypt_cost: MIN_BCRYPT_COST,
            static_dir: DEFAULT_STATIC_DIR.to_string(),
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from environment variables and fails fast on settings that
    /// the current environment requires.
    ///
    /// # Panics
    /// Panics in `Env::Production` when `DATABASE_URL` is not set, so the service never
    /// starts on a throwaway in-memory store in production.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").unwrap_or_else(|_| "local".to_string()).as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let db_url = match env {
            Env::Production => Some(
                env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in production"),
            ),
            Env::Local => env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
        };

        let bcrypt_cost = env::var("BCRYPT_COST")
            .ok()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .map(clamp_cost)
            .unwrap_or(bcrypt::DEFAULT_COST);

        Self {
            db_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            bcrypt_cost,
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| DEFAULT_STATIC_DIR.to_string()),
            env,
        }
    }
}

// bcrypt rejects costs outside 4..=31.
fn clamp_cost(cost: u32) -> u32 {
    cost.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST)
}
