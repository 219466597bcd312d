//! Database configuration
//!
//! Read from the environment once at process start. Credentials are never
//! defaulted; only the host, port and statement-cache knobs have fallbacks.

use std::fmt;

use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_HOST: &str = "DB_HOST";
pub const ENV_PORT: &str = "DB_PORT";
pub const ENV_NAME: &str = "DB_NAME";
pub const ENV_USER: &str = "DB_USER";
pub const ENV_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_STATEMENT_CACHE: &str = "DB_STATEMENT_CACHE";
pub const ENV_STATEMENT_CACHE_SIZE: &str = "DB_STATEMENT_CACHE_SIZE";
pub const ENV_STATEMENT_CACHE_SQL_LIMIT: &str = "DB_STATEMENT_CACHE_SQL_LIMIT";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5432;

/// Configuration error, raised at startup only
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {var}")]
    Missing { var: &'static str },

    #[error("invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid DATABASE_URL: {0}")]
    InvalidUrl(#[source] sqlx::Error),
}

/// Prepared statement cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementCacheConfig {
    pub enabled: bool,
    /// Statements kept per connection
    pub capacity: usize,
    /// Longest SQL text, in characters, that is cached
    pub sql_limit: usize,
}

impl Default for StatementCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 250,
            sql_limit: 2048,
        }
    }
}

impl StatementCacheConfig {
    /// Per-connection cache capacity handed to the driver. Zero disables it.
    pub fn connection_capacity(&self) -> usize {
        if self.enabled {
            self.capacity
        } else {
            0
        }
    }

    /// Whether `sql` should be prepared as a persistent (cached) statement.
    pub fn should_cache(&self, sql: &str) -> bool {
        self.connection_capacity() > 0 && sql.chars().count() <= self.sql_limit
    }
}

/// Where to connect.
#[derive(Clone, PartialEq, Eq)]
pub enum ConnectTarget {
    /// A complete `postgres://` URL
    Url(String),
    Parts {
        host: String,
        port: u16,
        database: String,
        username: String,
        password: Option<String>,
    },
}

impl fmt::Debug for ConnectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(_) => f.write_str("Url(<redacted>)"),
            Self::Parts {
                host,
                port,
                database,
                username,
                password,
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("database", database)
                .field("username", username)
                .field("password", &password.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub target: ConnectTarget,
    pub statement_cache: StatementCacheConfig,
}

impl DbConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    ///
    /// `DATABASE_URL`, when set, takes precedence over the individual
    /// `DB_HOST`/`DB_PORT`/`DB_NAME`/`DB_USER`/`DB_PASSWORD` variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let target = match get(ENV_DATABASE_URL) {
            Some(url) => ConnectTarget::Url(url),
            None => ConnectTarget::Parts {
                host: get(ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: match get(ENV_PORT) {
                    Some(raw) => parse_number(ENV_PORT, &raw)?,
                    None => DEFAULT_PORT,
                },
                database: get(ENV_NAME).ok_or(ConfigError::Missing { var: ENV_NAME })?,
                username: get(ENV_USER).ok_or(ConfigError::Missing { var: ENV_USER })?,
                password: lookup(ENV_PASSWORD),
            },
        };

        let defaults = StatementCacheConfig::default();
        let statement_cache = StatementCacheConfig {
            enabled: match get(ENV_STATEMENT_CACHE) {
                Some(raw) => parse_flag(ENV_STATEMENT_CACHE, &raw)?,
                None => defaults.enabled,
            },
            capacity: match get(ENV_STATEMENT_CACHE_SIZE) {
                Some(raw) => parse_number(ENV_STATEMENT_CACHE_SIZE, &raw)?,
                None => defaults.capacity,
            },
            sql_limit: match get(ENV_STATEMENT_CACHE_SQL_LIMIT) {
                Some(raw) => parse_number(ENV_STATEMENT_CACHE_SQL_LIMIT, &raw)?,
                None => defaults.sql_limit,
            },
        };

        Ok(Self {
            target,
            statement_cache,
        })
    }

    /// Driver connection options, statement cache capacity applied.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        let options = match &self.target {
            ConnectTarget::Url(url) => url
                .parse::<PgConnectOptions>()
                .map_err(ConfigError::InvalidUrl)?,
            ConnectTarget::Parts {
                host,
                port,
                database,
                username,
                password,
            } => {
                let options = PgConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .database(database)
                    .username(username);
                match password {
                    Some(password) => options.password(password),
                    None => options,
                }
            }
        };

        Ok(options.statement_cache_capacity(self.statement_cache.connection_capacity()))
    }
}

fn parse_number<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
