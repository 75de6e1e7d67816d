use std::str::FromStr;

use jsonwebtoken::Algorithm;

use crate::error::TesseraError;

/// Placeholder secret used when `JWT_SECRET` is unset. Refused in production.
pub const DEV_SECRET: &str = "tessera-dev-secret-change-me";

/// Upper bound for `ACCESS_TTL_MINUTES` (one day).
pub const MAX_ACCESS_TTL_MINUTES: u64 = 24 * 60;

/// Upper bound for `REFRESH_TTL_DAYS` (ten years).
pub const MAX_REFRESH_TTL_DAYS: u64 = 10 * 365;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,

    /// Signing configuration handed to the token engine.
    pub token: TokenConfig,

    /// Deadline for a single refresh-token store call, in seconds (default: 3)
    pub store_timeout_secs: u64,

    /// Environment: development, production, test
    pub environment: String,

    /// Log output: text, pretty or json (default: text)
    pub log_format: String,
}

/// Database pool settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database connection URL (e.g. sqlite://tessera.db, postgres://...)
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime_secs: u64,
}

/// Static token signing configuration.
///
/// Built once at startup and never mutated; the engine owns its own copy.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Symmetric signing key material
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Written to the `kid` header of every access token
    pub key_id: String,
    /// HMAC algorithm used for signing; the only one accepted on validation
    pub algorithm: Algorithm,
    /// Access token lifetime in minutes (default: 15)
    pub access_ttl_minutes: u64,
    /// Refresh token lifetime in days (default: 30)
    pub refresh_ttl_days: u64,
}

impl TokenConfig {
    pub fn access_ttl(&self) -> Result<chrono::Duration, TesseraError> {
        i64::try_from(self.access_ttl_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .ok_or_else(|| {
                TesseraError::Config(format!(
                    "ACCESS_TTL_MINUTES out of range: {}",
                    self.access_ttl_minutes
                ))
            })
    }

    pub fn refresh_ttl(&self) -> Result<chrono::Duration, TesseraError> {
        i64::try_from(self.refresh_ttl_days)
            .ok()
            .and_then(chrono::Duration::try_days)
            .ok_or_else(|| {
                TesseraError::Config(format!(
                    "REFRESH_TTL_DAYS out of range: {}",
                    self.refresh_ttl_days
                ))
            })
    }

    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> Result<(), TesseraError> {
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(TesseraError::Config(format!(
                "JWT_ALG must be an HMAC algorithm, got {:?}",
                self.algorithm
            )));
        }
        if self.secret.is_empty() {
            return Err(TesseraError::Config("JWT_SECRET must not be empty".into()));
        }
        if self.issuer.is_empty() || self.audience.is_empty() {
            return Err(TesseraError::Config(
                "JWT_ISSUER and JWT_AUDIENCE must not be empty".into(),
            ));
        }
        if self.access_ttl_minutes == 0 || self.refresh_ttl_days == 0 {
            return Err(TesseraError::Config("token TTLs must be positive".into()));
        }
        if self.access_ttl_minutes > MAX_ACCESS_TTL_MINUTES {
            return Err(TesseraError::Config(format!(
                "ACCESS_TTL_MINUTES must be at most {}",
                MAX_ACCESS_TTL_MINUTES
            )));
        }
        if self.refresh_ttl_days > MAX_REFRESH_TTL_DAYS {
            return Err(TesseraError::Config(format!(
                "REFRESH_TTL_DAYS must be at most {}",
                MAX_REFRESH_TTL_DAYS
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from environment variables (with .env support).
    pub fn from_env() -> Result<Self, TesseraError> {
        // Load .env file if present (ignore errors if missing)
        let _ = dotenvy::dotenv();

        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self, TesseraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let number_or = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };
        let pool_size_or = |key: &str, default: u32| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(default)
        };

        let algorithm_name = string_or("JWT_ALG", "HS256");
        let algorithm = Algorithm::from_str(algorithm_name.trim()).map_err(|_| {
            TesseraError::Config(format!("unknown JWT_ALG: {}", algorithm_name))
        })?;

        let config = Config {
            database: DatabaseConfig {
                url: string_or("DATABASE_URL", "sqlite://tessera.db?mode=rwc"),
                max_connections: pool_size_or("DB_MAX_CONNECTIONS", 20),
                min_connections: pool_size_or("DB_MIN_CONNECTIONS", 2),
                max_lifetime_secs: number_or("DB_CONN_MAX_LIFETIME_SECS", 1800),
            },
            token: TokenConfig {
                secret: string_or("JWT_SECRET", DEV_SECRET),
                issuer: string_or("JWT_ISSUER", "tessera"),
                audience: string_or("JWT_AUDIENCE", "tessera-clients"),
                key_id: string_or("JWT_KID", "default"),
                algorithm,
                access_ttl_minutes: number_or("ACCESS_TTL_MINUTES", 15),
                refresh_ttl_days: number_or("REFRESH_TTL_DAYS", 30),
            },
            store_timeout_secs: number_or("STORE_TIMEOUT_SECS", 3),
            environment: string_or("ENVIRONMENT", "development"),
            log_format: string_or("LOG_FORMAT", "text").to_lowercase(),
        };

        config.token.validate()?;
        if config.is_production() && config.token.secret == DEV_SECRET {
            return Err(TesseraError::Config(
                "JWT_SECRET must be set in production".into(),
            ));
        }

        Ok(config)
    }

    /// Check if running in development mode.
    pub fn is_dev(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.store_timeout_secs)
    }
}
