//! Server configuration
//!
//! Loaded from environment variables (a `.env` file is read first by `main`).

use super::error::{ServerError, ServerResult};
use crate::auth::{JwtConfig, oauth::GoogleOAuthConfig};

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite URL, e.g. `sqlite:data/tabs.db` or `sqlite::memory:`
    pub database_url: String,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    pub jwt: JwtConfig,
    pub google: GoogleOAuthConfig,
    /// Frontend base URL (login redirects land here)
    pub frontend_url: String,
    /// CORS allow-list; defaults to the frontend URL
    pub allowed_origins: Vec<String>,
    /// Upserted as an active admin at startup
    pub admin_email: Option<String>,
    pub log_level: String,
    /// Daily rolling log files are written here when set
    pub log_dir: Option<String>,
}

impl Config {
    /// Require a secret env var: must be set and non-empty outside development.
    fn require_secret(name: &str, environment: &str) -> ServerResult<String> {
        match std::env::var(name) {
            Ok(v) if !v.is_empty() => Ok(v),
            _ if environment != "development" => Err(ServerError::Config(format!(
                "{name} must be set in {environment} environment"
            ))),
            _ => Ok(String::new()),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> ServerResult<Self> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".into());
        let http_port = std::env::var("HTTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|s| parse_origins(&s))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| vec![frontend_url.clone()]);

        let google = GoogleOAuthConfig {
            client_id: Self::require_secret("GOOGLE_CLIENT_ID", &environment)?,
            client_secret: Self::require_secret("GOOGLE_CLIENT_SECRET", &environment)?,
            callback_url: std::env::var("GOOGLE_CALLBACK_URL").unwrap_or_else(|_| {
                format!("http://localhost:{http_port}/auth/google/callback")
            }),
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:data/tabs.db".into()),
            http_port,
            jwt: JwtConfig::from_env(&environment)?,
            google,
            frontend_url,
            allowed_origins,
            admin_email: std::env::var("ADMIN_EMAIL").ok().filter(|s| !s.trim().is_empty()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    /// Development defaults with an in-memory database and a random JWT secret
    fn default() -> Self {
        let frontend_url = "http://localhost:5173".to_string();
        Self {
            database_url: "sqlite::memory:".into(),
            http_port: 3000,
            environment: "development".into(),
            jwt: JwtConfig::development(),
            google: GoogleOAuthConfig {
                client_id: String::new(),
                client_secret: String::new(),
                callback_url: "http://localhost:3000/auth/google/callback".into(),
            },
            allowed_origins: vec![frontend_url.clone()],
            frontend_url,
            admin_email: None,
            log_level: "info".into(),
            log_dir: None,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
