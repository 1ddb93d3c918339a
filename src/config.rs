use std::{env, net::SocketAddr};

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Clone, Debug)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub paystack_secret_key: Option<String>,
    pub paystack_base_url: String,
    pub cors_allow_origin: String,
    pub admin_seed: Option<AdminSeed>,
}

impl AppConfig {
    /// Reads configuration from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                message: "must not be empty".to_string(),
            });
        }

        let admin_seed = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminSeed {
                name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url: var_or("DATABASE_URL", "sqlite://lms.db?mode=rwc"),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", "5")?,
            bind_addr: parse_var("BIND_ADDR", "127.0.0.1:5000")?,
            jwt_secret,
            token_ttl_days: parse_var("TOKEN_TTL_DAYS", "14")?,
            paystack_secret_key: env::var("PAYSTACK_SECRET_KEY").ok().filter(|k| !k.is_empty()),
            paystack_base_url: var_or("PAYSTACK_BASE_URL", "https://api.paystack.co"),
            cors_allow_origin: var_or("CORS_ALLOW_ORIGIN", "*"),
            admin_seed,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn parse_var<T>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    var_or(key, default)
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        })
}
