use std::env;

/// Fallback signing secret used outside production.
const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

/// Default listener address when `BIND_ADDR` is not set.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// AppConfig
///
/// Holds the application's configuration. Loaded once at startup and shared
/// read-only with every request through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` selects the in-memory store (local only).
    pub db_url: Option<String>,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Runtime environment marker. Controls the developer auth bypass and log format.
    pub env: Env,
    // Secret used to validate incoming bearer JWTs (HS256).
    pub jwt_secret: String,
}

/// Env
///
/// Runtime context. `Local` enables development conveniences (in-memory store,
/// `x-user-id` bypass, schema bootstrap); `Production` disables all of them.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking configuration for test scaffolding.
    fn default() -> Self {
        Self {
            db_url: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `DATABASE_URL` or `JWT_SECRET` is missing, so the
    /// service never starts against an in-memory store or a guessable secret.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        match env {
            Env::Local => Self {
                env: Env::Local,
                // Local runs fall back to the in-memory store when no database is configured.
                db_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
                bind_addr,
                jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
            },
            Env::Production => Self {
                env: Env::Production,
                db_url: Some(
                    env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                ),
                bind_addr,
                jwt_secret: env::var("JWT_SECRET")
                    .expect("FATAL: JWT_SECRET must be set in production."),
            },
        }
    }
}
