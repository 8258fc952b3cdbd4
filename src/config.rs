/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, API prefix, auth header names, hasher)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::HeaderName;

use crate::services::auth::{AuthSettings, HasherKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub database_url: String,
    pub database_max_connections: u32,

    pub auth: AuthSettings,
    pub api_token_hasher: HasherKind,

    pub request_timeout_seconds: u64,
    pub request_body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests do not have to
    /// touch the process environment.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match get("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(&get("APP_ENV").unwrap_or_else(|| "development".to_string()));

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections = get("DATABASE_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);

        let defaults = AuthSettings::default();

        let path_prefix = get("API_PATH_PREFIX").unwrap_or(defaults.path_prefix);
        if !path_prefix.starts_with('/') {
            return Err(ConfigError::Invalid("API_PATH_PREFIX"));
        }

        let session_header =
            header_name(get("AUTH_SESSION_HEADER"), "AUTH_SESSION_HEADER")?
                .unwrap_or(defaults.session_header);
        let user_header = header_name(get("AUTH_USER_HEADER"), "AUTH_USER_HEADER")?
            .unwrap_or(defaults.user_header);
        let token_header = header_name(get("AUTH_TOKEN_HEADER"), "AUTH_TOKEN_HEADER")?
            .unwrap_or(defaults.token_header);

        let api_token_hasher = match get("API_TOKEN_HASHER") {
            Some(v) => v
                .parse::<HasherKind>()
                .map_err(|_| ConfigError::Invalid("API_TOKEN_HASHER"))?,
            None => HasherKind::Argon2,
        };

        let request_timeout_seconds = get("REQUEST_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let request_body_limit_bytes = get("REQUEST_BODY_LIMIT_BYTES")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        Ok(Self {
            addr,
            app_env,
            database_url,
            database_max_connections,
            auth: AuthSettings {
                path_prefix,
                session_header,
                user_header,
                token_header,
            },
            api_token_hasher,
            request_timeout_seconds,
            request_body_limit_bytes,
        })
    }
}

fn header_name(
    value: Option<String>,
    key: &'static str,
) -> Result<Option<HeaderName>, ConfigError> {
    value
        .map(|v| HeaderName::from_bytes(v.trim().as_bytes()).map_err(|_| ConfigError::Invalid(key)))
        .transpose()
}
