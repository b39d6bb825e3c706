//! API configuration module.
//!
//! Configuration is loaded from environment variables (after an optional
//! `.env` file) with fallback to development defaults.

use std::env;
use std::fmt;
use std::time::Duration;

use mbg_db::DEFAULT_DATABASE_URL;

/// Secrets used when none are configured. Production refuses to start
/// with either of them.
const DEV_JWT_SECRET: &str = "mbg-dev-access-secret-change-in-production";
const DEV_JWT_REFRESH_SECRET: &str = "mbg-dev-refresh-secret-change-in-production";

/// Longest accepted JWT lifetime (ten years).
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Deployment environment, read from `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "test" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue("NODE_ENV".to_string())),
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Production => f.write_str("production"),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub port: u16,

    /// sqlx SQLite URL
    pub database_url: String,

    /// Pool size
    pub db_max_connections: u32,

    /// Secret for signing access tokens
    pub jwt_secret: String,

    /// Secret for signing refresh tokens
    pub jwt_refresh_secret: String,

    /// Access token lifetime
    pub jwt_access_expiry: Duration,

    /// Refresh token lifetime
    pub jwt_refresh_expiry: Duration,

    /// Allowed CORS origin, `*` for any
    pub cors_origin: String,

    pub environment: Environment,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = ApiConfig {
            port: var("PORT", "5000")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            database_url: var("DATABASE_URL", DEFAULT_DATABASE_URL),

            db_max_connections: var("DB_MAX_CONNECTIONS", "5")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            jwt_secret: var("JWT_SECRET", DEV_JWT_SECRET),

            jwt_refresh_secret: var("JWT_REFRESH_SECRET", DEV_JWT_REFRESH_SECRET),

            jwt_access_expiry: token_lifetime(&var("JWT_ACCESS_EXPIRY", "15m"))?,

            jwt_refresh_expiry: token_lifetime(&var("JWT_REFRESH_EXPIRY", "7d"))?,

            cors_origin: var("CORS_ORIGIN", "*"),

            environment: Environment::parse(&var("NODE_ENV", "development"))?,
        };

        if config.environment == Environment::Production {
            if config.jwt_secret == DEV_JWT_SECRET {
                return Err(ConfigError::InsecureSecret("JWT_SECRET".to_string()));
            }
            if config.jwt_refresh_secret == DEV_JWT_REFRESH_SECRET {
                return Err(ConfigError::InsecureSecret("JWT_REFRESH_SECRET".to_string()));
            }
        }
        if config.jwt_secret == config.jwt_refresh_secret {
            return Err(ConfigError::SharedSecret);
        }

        Ok(config)
    }
}

/// Parses `30s`, `15m`, `12h`, `7d` or a bare number of seconds.
pub fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    let value = value.trim();
    let invalid = || ConfigError::InvalidDuration(value.to_string());

    let (digits, unit) = match value.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&value[..idx], c.to_ascii_lowercase()),
        Some(_) => (value, 's'),
        None => return Err(invalid()),
    };

    let amount: u64 = digits.trim().parse().map_err(|_| invalid())?;
    let multiplier: u64 = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 60 * 60 * 24,
        _ => return Err(invalid()),
    };
    let seconds = amount.checked_mul(multiplier).ok_or_else(invalid)?;

    Ok(Duration::from_secs(seconds))
}

/// A token lifetime: a duration of at least one second and at most
/// [`MAX_TOKEN_LIFETIME`].
fn token_lifetime(value: &str) -> Result<Duration, ConfigError> {
    let lifetime = parse_duration(value)?;
    if lifetime.is_zero() || lifetime > MAX_TOKEN_LIFETIME {
        return Err(ConfigError::InvalidDuration(value.trim().to_string()));
    }
    Ok(lifetime)
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Invalid duration '{0}', expected a number with an s/m/h/d suffix")]
    InvalidDuration(String),

    #[error("{0} must be set in production")]
    InsecureSecret(String),

    #[error("JWT_SECRET and JWT_REFRESH_SECRET must differ")]
    SharedSecret,
}
