//! Configuration loaded once at startup from the environment.
//!
//! The struct is immutable after load and passed explicitly to the components
//! that need it. Invalid configuration is fatal: `main` refuses to start.

use std::env;
use std::time::Duration;

const DEFAULT_JWT_SECRET: &str = "change-this-development-secret-key-now";
const MIN_JWT_SECRET_BYTES: usize = 32;
const MIN_JWT_EXPIRY: Duration = Duration::from_secs(60);
const MAX_JWT_EXPIRY: Duration = Duration::from_secs(30 * 24 * 3600);

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expiry: Duration,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub environment: String,
    pub jwt: JwtConfig,
    pub rls_enabled: bool,
    pub metrics_enabled: bool,
    pub docs_enabled: bool,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub import_max_bytes: usize,
    pub import_default_mapping: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = Config {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            server_port: env_parse("PORT", 8080)?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
                issuer: env::var("JWT_ISS").unwrap_or_else(|_| "atlas-inventory".to_string()),
                audience: env::var("JWT_AUD").unwrap_or_else(|_| "atlas-inventory".to_string()),
                expiry: match env::var("JWT_EXPIRY") {
                    Ok(s) => parse_duration(&s)
                        .ok_or_else(|| anyhow::anyhow!("JWT_EXPIRY is not a valid duration: {s}"))?,
                    Err(_) => Duration::from_secs(24 * 3600),
                },
            },
            rls_enabled: env_bool("RLS_ENABLED"),
            metrics_enabled: env_bool("ENABLE_METRICS"),
            docs_enabled: env_bool("ENABLE_DOCS"),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 20)?,
            db_acquire_timeout_secs: env_parse("DB_ACQUIRE_TIMEOUT_SECS", 30)?,
            import_max_bytes: env_parse("IMPORT_MAX_BYTES", 20 << 20)?,
            import_default_mapping: env::var("IMPORT_DEFAULT_MAPPING")
                .unwrap_or_else(|_| "configs/mapping/equipment.yaml".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt.secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        if self.jwt.secret.len() < MIN_JWT_SECRET_BYTES {
            anyhow::bail!(
                "JWT_SECRET must be at least {} bytes (current: {})",
                MIN_JWT_SECRET_BYTES,
                self.jwt.secret.len()
            );
        }
        if self.is_production() && self.jwt.secret == DEFAULT_JWT_SECRET {
            anyhow::bail!("JWT_SECRET must be changed from the default value in production");
        }
        if self.jwt.issuer.is_empty() {
            anyhow::bail!("JWT_ISS must not be empty");
        }
        if self.jwt.audience.is_empty() {
            anyhow::bail!("JWT_AUD must not be empty");
        }
        if self.jwt.expiry < MIN_JWT_EXPIRY {
            anyhow::bail!("JWT_EXPIRY too short: {:?} (minimum 1m)", self.jwt.expiry);
        }
        if self.jwt.expiry > MAX_JWT_EXPIRY {
            anyhow::bail!("JWT_EXPIRY too long: {:?} (maximum 30d)", self.jwt.expiry);
        }
        if self.import_max_bytes == 0 {
            anyhow::bail!("IMPORT_MAX_BYTES must be positive");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }
}

fn env_bool(key: &str) -> bool {
    env::var(key).map(|v| v == "true" || v == "1").unwrap_or(false)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, anyhow::Error> {
    match env::var(key) {
        Ok(s) => s
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} is not a valid value: {s}")),
        Err(_) => Ok(default),
    }
}

/// Parse durations in the `"90s"` / `"30m"` / `"24h"` / `"7d"` form.
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let (value, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => s.split_at(idx),
        None => (s, "s"),
    };
    let value: u64 = value.parse().ok()?;
    let secs = match unit {
        "s" => value,
        "m" => value * 60,
        "h" => value * 3600,
        "d" => value * 24 * 3600,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}
