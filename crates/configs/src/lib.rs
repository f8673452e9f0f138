//! Application configuration.
//!
//! Values come from `config.toml` (path overridable through `CONFIG_PATH`);
//! anything left empty there is filled from the environment, which `.env`
//! may populate. The database URL falls back to `DATABASE_URL` and then to
//! the discrete `POSTGRES_*` variables.

use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Registering with this address grants the `admin` role.
    #[serde(default)]
    pub admin_email: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: String::new(), token_ttl_hours: default_token_ttl_hours(), admin_email: None }
    }
}

fn default_token_ttl_hours() -> i64 { 12 }

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// `compact` or `json`
    #[serde(default)]
    pub format: String,
}

pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

/// Assemble a Postgres URL from `POSTGRES_HOST`, `POSTGRESS_PORT`,
/// `POSTGRES_USER`, `POSTGRESS_PASSWORD` and `POSTGRES_DB`.
///
/// The doubled `S` in the port and password variable names is what deployed
/// `.env` files use. Returns `None` unless host, user and database are set.
pub fn postgres_url_from_vars(lookup: &dyn Fn(&str) -> Option<String>) -> Option<String> {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let host = non_empty("POSTGRES_HOST")?;
    let user = non_empty("POSTGRES_USER")?;
    let db = non_empty("POSTGRES_DB")?;
    let port = non_empty("POSTGRESS_PORT").unwrap_or_else(|| "5432".to_string());
    let auth = match non_empty("POSTGRESS_PASSWORD") {
        Some(pw) => format!("{user}:{pw}"),
        None => user,
    };
    Some(format!("postgres://{auth}@{host}:{port}/{db}"))
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl AppConfig {
    /// Load `config.toml` when present, otherwise start from defaults, then
    /// fill gaps from the process environment and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.normalize_with(&process_env)?;
        self.database.validate()?;
        Ok(())
    }

    pub fn normalize_with(&mut self, env: &dyn Fn(&str) -> Option<String>) -> Result<()> {
        self.server.normalize_with(env)?;
        self.database.normalize_with(env);
        self.auth.normalize_with(env);
        if self.logging.format.trim().is_empty() {
            self.logging.format = env("LOG_FORMAT").unwrap_or_else(|| "compact".to_string());
        }
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize_with(&mut self, env: &dyn Fn(&str) -> Option<String>) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = env("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        }
        if self.port == 0 {
            self.port = match env("SERVER_PORT") {
                Some(p) => p.parse::<u16>().map_err(|_| anyhow!("SERVER_PORT must be a port number, got {p}"))?,
                None => 8080,
            };
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if self.worker_threads == Some(0) {
            self.worker_threads = None;
        }
        if self.worker_threads.is_none() {
            self.worker_threads = env("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()).filter(|w| *w > 0);
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// Fill the URL from `DATABASE_URL`, then from the `POSTGRES_*` variables.
    pub fn normalize_from_env(&mut self) {
        self.normalize_with(&process_env);
    }

    pub fn normalize_with(&mut self, env: &dyn Fn(&str) -> Option<String>) {
        if self.url.trim().is_empty() {
            if let Some(url) = env("DATABASE_URL").filter(|u| !u.trim().is_empty()) {
                self.url = url;
            } else if let Some(url) = postgres_url_from_vars(env) {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml, DATABASE_URL or the POSTGRES_* variables"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    fn normalize_with(&mut self, env: &dyn Fn(&str) -> Option<String>) {
        if self.jwt_secret.trim().is_empty() {
            self.jwt_secret = env("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());
        }
        if self.admin_email.is_none() {
            self.admin_email = env("ADMIN_EMAIL").filter(|v| !v.trim().is_empty());
        }
        if self.token_ttl_hours <= 0 {
            self.token_ttl_hours = default_token_ttl_hours();
        }
    }
}
