//! Application configuration structs
//!
//! Loads configuration from environment variables (after reading `.env`).

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub jwt: JwtConfig,
    pub gateway: GatewayConfig,
    pub notify: NotifyConfig,
    pub cors: CorsConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Credential configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_token_expiry")]
    pub token_expiry: i64,
    /// Accept unsigned legacy tokens alongside signed ones
    #[serde(default = "default_true")]
    pub accept_legacy: bool,
}

/// WebSocket gateway tuning
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Time allowed for the `authenticate` frame when no token came with the upgrade
    pub handshake_timeout_secs: u64,
    /// Close connections that send nothing for this long
    pub idle_timeout_secs: u64,
    /// Outbound frames buffered per connection
    pub outbound_buffer: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_secs: 10,
            idle_timeout_secs: 120,
            outbound_buffer: 100,
        }
    }
}

impl GatewayConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Notification processor settings
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub batch_size: i64,
    pub max_retries: i32,
    /// Base delay before the first retry; doubles on each further attempt
    pub retry_backoff_secs: u64,
    /// Stop picking new batches once a run has lasted this long
    pub run_budget_secs: u64,
    pub lock_ttl_secs: u64,
    pub queue_retention_days: i64,
    pub read_retention_days: i64,
    /// Loop with this period instead of running once
    pub interval_secs: Option<u64>,
    pub push_webhook_url: Option<String>,
    pub email_webhook_url: Option<String>,
    pub sms_webhook_url: Option<String>,
    pub webhook_timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_retries: 3,
            retry_backoff_secs: 60,
            run_budget_secs: 50,
            lock_ttl_secs: 300,
            queue_retention_days: 7,
            read_retention_days: 30,
            interval_secs: None,
            push_webhook_url: None,
            email_webhook_url: None,
            sms_webhook_url: None,
            webhook_timeout_secs: 10,
        }
    }
}

impl NotifyConfig {
    pub fn run_budget(&self) -> Duration {
        Duration::from_secs(self.run_budget_secs)
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_secs)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }

    /// Reject settings under which the run lock can lapse mid-run, or
    /// cleanup would delete rows that are still current.
    ///
    /// Entries in flight when the budget runs out still finish, so the lock
    /// must outlive the budget plus one webhook timeout.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let longest_run = self
            .run_budget_secs
            .saturating_add(self.webhook_timeout_secs);
        if self.queue_retention_days < 1 || self.read_retention_days < 1 {
            return Err(ConfigError::Inconsistent(
                "retention periods must be at least one day".to_string(),
            ));
        }
        if self.lock_ttl_secs <= longest_run {
            return Err(ConfigError::Inconsistent(format!(
                "NOTIFY_LOCK_TTL_SECS ({}) must exceed NOTIFY_RUN_BUDGET_SECS plus \
                 NOTIFY_WEBHOOK_TIMEOUT_SECS ({longest_run})",
                self.lock_ttl_secs
            )));
        }
        Ok(self)
    }
}

/// CORS configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_app_name() -> String {
    "relay".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_token_expiry() -> i64 {
    86400 // 1 day
}

fn default_true() -> bool {
    true
}

/// Typed access to a key/value source
struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::MissingVar(key))
    }

    fn parse<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(key, raw.clone()))
            })
            .transpose()
    }

    fn parse_or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        Ok(self.parse(key)?.unwrap_or(default))
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an in-memory map (tests, embedding)
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };
        let gateway_defaults = GatewayConfig::default();
        let notify_defaults = NotifyConfig::default();

        Ok(Self {
            app: AppSettings {
                name: vars.get("APP_NAME").unwrap_or_else(default_app_name),
                env: match vars.get("APP_ENV").map(|s| s.to_lowercase()).as_deref() {
                    None | Some("development") => Environment::Development,
                    Some("staging") => Environment::Staging,
                    Some("production") => Environment::Production,
                    Some(other) => {
                        return Err(ConfigError::InvalidValue("APP_ENV", other.to_string()))
                    }
                },
            },
            api: ServerConfig {
                host: vars.get("API_HOST").unwrap_or_else(default_host),
                port: vars
                    .parse("API_PORT")?
                    .ok_or(ConfigError::MissingVar("API_PORT"))?,
            },
            database: DatabaseConfig {
                url: vars.required("DATABASE_URL")?,
                max_connections: vars
                    .parse_or("DATABASE_MAX_CONNECTIONS", default_max_connections())?,
                min_connections: vars
                    .parse_or("DATABASE_MIN_CONNECTIONS", default_min_connections())?,
            },
            redis: match vars.get("REDIS_URL") {
                Some(url) => Some(RedisConfig {
                    url,
                    max_connections: vars
                        .parse_or("REDIS_MAX_CONNECTIONS", default_redis_max_connections())?,
                }),
                None => None,
            },
            jwt: JwtConfig {
                secret: vars.required("JWT_SECRET")?,
                token_expiry: vars.parse_or("JWT_TOKEN_EXPIRY", default_token_expiry())?,
                accept_legacy: vars.parse_or("AUTH_ACCEPT_LEGACY_TOKENS", true)?,
            },
            gateway: GatewayConfig {
                handshake_timeout_secs: vars.parse_or(
                    "GATEWAY_HANDSHAKE_TIMEOUT_SECS",
                    gateway_defaults.handshake_timeout_secs,
                )?,
                idle_timeout_secs: vars
                    .parse_or("GATEWAY_IDLE_TIMEOUT_SECS", gateway_defaults.idle_timeout_secs)?,
                outbound_buffer: vars
                    .parse_or("GATEWAY_OUTBOUND_BUFFER", gateway_defaults.outbound_buffer)?,
            },
            notify: NotifyConfig {
                batch_size: vars.parse_or("NOTIFY_BATCH_SIZE", notify_defaults.batch_size)?,
                max_retries: vars.parse_or("NOTIFY_MAX_RETRIES", notify_defaults.max_retries)?,
                retry_backoff_secs: vars
                    .parse_or("NOTIFY_RETRY_BACKOFF_SECS", notify_defaults.retry_backoff_secs)?,
                run_budget_secs: vars
                    .parse_or("NOTIFY_RUN_BUDGET_SECS", notify_defaults.run_budget_secs)?,
                lock_ttl_secs: vars.parse_or("NOTIFY_LOCK_TTL_SECS", notify_defaults.lock_ttl_secs)?,
                queue_retention_days: vars.parse_or(
                    "NOTIFY_QUEUE_RETENTION_DAYS",
                    notify_defaults.queue_retention_days,
                )?,
                read_retention_days: vars.parse_or(
                    "NOTIFY_READ_RETENTION_DAYS",
                    notify_defaults.read_retention_days,
                )?,
                interval_secs: vars.parse("NOTIFY_INTERVAL_SECS")?,
                push_webhook_url: vars.get("NOTIFY_PUSH_WEBHOOK_URL"),
                email_webhook_url: vars.get("NOTIFY_EMAIL_WEBHOOK_URL"),
                sms_webhook_url: vars.get("NOTIFY_SMS_WEBHOOK_URL"),
                webhook_timeout_secs: vars.parse_or(
                    "NOTIFY_WEBHOOK_TIMEOUT_SECS",
                    notify_defaults.webhook_timeout_secs,
                )?,
            }
            .validated()?,
            cors: CorsConfig {
                allowed_origins: vars
                    .get("CORS_ALLOWED_ORIGINS")
                    .map(|s| s.split(',').map(str::trim).map(String::from).collect())
                    .unwrap_or_default(),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),

    #[error("Inconsistent settings: {0}")]
    Inconsistent(String),
}
