use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub public: PublicConfig,
    pub logging: LoggingConfig,
    pub blocked_domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicConfig {
    /// Prefix for `short_url` in shorten responses, without trailing slash
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `snip=debug,sqlx=warn`
    pub level: String,
    pub format: LogFormat,
    /// Daily-rotated log file; stdout when unset
    pub file: Option<String>,
    pub max_files: usize,
}

impl DatabaseConfig {
    pub const fn default_max_connections() -> u32 {
        20
    }

    pub const fn default_acquire_timeout_ms() -> u64 {
        3000
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::Sqlite,
            url: "sqlite://./snip.db?mode=rwc".to_string(),
            max_connections: Self::default_max_connections(),
            acquire_timeout_ms: Self::default_acquire_timeout_ms(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let backend = match var("DATABASE_BACKEND", "sqlite").to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "sqlite" => DatabaseBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown DATABASE_BACKEND '{other}', falling back to 'sqlite'. Supported values: sqlite, postgres"
                );
                DatabaseBackend::Sqlite
            }
        };

        let defaults = DatabaseConfig::default();
        let database_url = var("DATABASE_URL", &defaults.url);

        let max_connections = var(
            "DATABASE_MAX_CONNECTIONS",
            &defaults.max_connections.to_string(),
        )
        .parse::<u32>()
        .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;
        anyhow::ensure!(max_connections > 0, "DATABASE_MAX_CONNECTIONS must be at least 1");

        let acquire_timeout_ms = var(
            "DATABASE_ACQUIRE_TIMEOUT_MS",
            &defaults.acquire_timeout_ms.to_string(),
        )
        .parse::<u64>()
        .context("DATABASE_ACQUIRE_TIMEOUT_MS must be an integer number of milliseconds")?;

        let host = var("HOST", "0.0.0.0");
        let port = var("PORT", "5000")
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let base_url = match lookup("PUBLIC_BASE_URL") {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let domain = var("DOMAIN", "localhost");
                let scheme = if var("APP_ENV", "production").eq_ignore_ascii_case("production") {
                    "https"
                } else {
                    "http"
                };
                format!("{scheme}://{domain}")
            }
        };

        let blocked_domains = var("BLOCKED_DOMAINS", "malware.com,phishing.com")
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect();

        let level = lookup("RUST_LOG")
            .or_else(|| lookup("LOG_LEVEL"))
            .unwrap_or_else(|| "info".to_string());
        let format = match var("LOG_FORMAT", "text").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
        let file = lookup("LOG_FILE").filter(|f| !f.trim().is_empty());
        let max_files = var("LOG_MAX_FILES", "10")
            .parse::<usize>()
            .context("LOG_MAX_FILES must be a positive integer")?;
        anyhow::ensure!(max_files > 0, "LOG_MAX_FILES must be at least 1");

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
                acquire_timeout_ms,
            },
            server: ServerConfig { host, port },
            public: PublicConfig { base_url },
            logging: LoggingConfig {
                level,
                format,
                file,
                max_files,
            },
            blocked_domains,
        })
    }
}
