use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub postgres: PostgresConfig,
    pub twitter: TwitterConfig,
    pub workers: WorkerConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            postgres: PostgresConfig::from_env(),
            twitter: TwitterConfig::from_env(),
            workers: WorkerConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  server:   {}:{}", self.server.host, self.server.port);
        tracing::info!("  postgres: host={}, db={}", self.postgres.host, self.postgres.database);
        tracing::info!(
            "  twitter:  account=@{} (user_id={}), app_token={}",
            self.twitter.account_handle,
            self.twitter.user_id,
            if self.twitter.app_token.is_some() { "set" } else { "(none)" },
        );
        tracing::info!(
            "  workers:  search every {}s, process every {}s",
            self.workers.search_interval_secs,
            self.workers.process_interval_secs,
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_u16("PORT", 3003),
        }
    }
}

// ── PostgreSQL ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: String,
    pub max_connections: u32,
}

impl PostgresConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("PG_HOST", "localhost"),
            port: env_u16("PG_PORT", 5432),
            database: env_or("PG_DATABASE", "mentionloop"),
            username: env_opt("PG_USERNAME"),
            password: env_opt("PG_PASSWORD"),
            ssl_mode: env_or("PG_SSL_MODE", "prefer"),
            max_connections: env_u32("PG_MAX_CONNECTIONS", 10),
        }
    }

    pub fn connection_string(&self) -> String {
        let user = self.username.as_deref().unwrap_or("postgres");
        let pass = self.password.as_deref().unwrap_or("");
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            user, pass, self.host, self.port, self.database, self.ssl_mode
        )
    }
}

// ── Twitter / X API ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    /// App-only bearer token, used for reading the mention timeline.
    pub app_token: Option<String>,
    /// User-context token, used for posting replies.
    pub user_token: Option<String>,
    /// Numeric id of the account whose mentions are watched.
    pub user_id: String,
    /// Handle of that account, without the leading `@`.
    pub account_handle: String,
    /// API base URL; override points the client at a stub in tests.
    pub base_url: String,
    /// Text posted as the reply to each mention.
    pub reply_text: String,
}

impl TwitterConfig {
    fn from_env() -> Self {
        Self {
            app_token: env_opt("TWITTER_APP_AUTH_TOKEN"),
            user_token: env_opt("TWITTER_USER_AUTH_TOKEN"),
            user_id: env_or("TWITTER_USER_ID", ""),
            account_handle: env_or("TWITTER_ACCOUNT_HANDLE", "")
                .trim_start_matches('@')
                .to_string(),
            base_url: env_or("TWITTER_API_BASE_URL", "https://api.twitter.com"),
            reply_text: env_or("REPLY_TEXT", "hello"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.app_token.is_some() && !self.user_id.is_empty() && !self.account_handle.is_empty()
    }
}

// ── Workers ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Seconds between mention-search ticks.
    pub search_interval_secs: u64,
    /// Seconds between mention-processing ticks.
    pub process_interval_secs: u64,
}

impl WorkerConfig {
    fn from_env() -> Self {
        Self {
            search_interval_secs: env_u64("SEARCH_INTERVAL_SECS", 60),
            process_interval_secs: env_u64("PROCESS_INTERVAL_SECS", 30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_string_defaults() {
        let pg = PostgresConfig {
            host: "localhost".to_string(),
            port: 5432,
            database: "mentionloop".to_string(),
            username: None,
            password: None,
            ssl_mode: "prefer".to_string(),
            max_connections: 10,
        };
        assert_eq!(
            pg.connection_string(),
            "postgres://postgres:@localhost:5432/mentionloop?sslmode=prefer"
        );
    }

    #[test]
    fn test_twitter_config_requires_identity() {
        let mut tw = TwitterConfig {
            app_token: Some("token".to_string()),
            user_token: None,
            user_id: String::new(),
            account_handle: "launchaction".to_string(),
            base_url: "https://api.twitter.com".to_string(),
            reply_text: "hello".to_string(),
        };
        assert!(!tw.is_configured());
        tw.user_id = "12345".to_string();
        assert!(tw.is_configured());
    }
}
