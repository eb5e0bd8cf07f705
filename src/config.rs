// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup into an immutable [`Config`]; the JWT
//! signing secret is owned here and handed to the token authority at
//! construction time.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// How the OAuth2 `state` parameter is correlated across the redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateMode {
    /// Self-contained signed token, no server-side storage.
    Signed,
    /// Random id held server-side and bound to a session cookie.
    Session,
}

impl FromStr for StateMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signed" | "token" => Ok(StateMode::Signed),
            "session" => Ok(StateMode::Session),
            _ => Err(ConfigError::Invalid("OAUTH2_STATE_MODE")),
        }
    }
}

/// Token lifetimes and the signing secret.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HS256 signing key (raw bytes)
    pub secret: Vec<u8>,
    pub access_token_hours: i64,
    pub refresh_token_hours: i64,
}

/// Google OAuth2 client registration.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URI registered with Google (points at our callback route)
    pub callback_url: String,
}

/// Postgres connection settings. Absent when running with the in-memory store.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub schema: String,
    /// `DB_MAX_IDLE_CONNS`: connections the pool keeps open even when idle
    /// (the pool's minimum size, clamped to `max_open_conns`)
    pub max_idle_conns: u32,
    /// `DB_MAX_OPEN_CONNS`: pool size ceiling
    pub max_open_conns: u32,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub application_name: String,
    pub hostname: String,
    /// Server port
    pub port: u16,
    pub jwt: JwtConfig,
    pub google: GoogleConfig,
    /// When set, the OAuth2 callback redirects here with the tokens in the
    /// query string instead of answering with JSON.
    pub client_callback_url: Option<String>,
    pub oauth_state_mode: StateMode,
    pub bcrypt_cost: u32,
    pub request_timeout: Duration,
    pub database: Option<DbConfig>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            application_name: "tokengate".to_string(),
            hostname: "localhost".to_string(),
            port: 8080,
            jwt: JwtConfig {
                secret: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
                access_token_hours: 24,
                refresh_token_hours: 168,
            },
            google: GoogleConfig {
                client_id: "test_client_id".to_string(),
                client_secret: "test_secret".to_string(),
                callback_url: "http://localhost:8080/oauth2/google/callback".to_string(),
            },
            client_callback_url: None,
            oauth_state_mode: StateMode::Signed,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            request_timeout: Duration::from_secs(30),
            database: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let database = match env::var("DB_HOST") {
            Ok(host) => Some(DbConfig {
                host,
                port: parse_or("DB_PORT", 5432)?,
                user: required("DB_USER")?,
                password: env::var("DB_PASSWORD").unwrap_or_default(),
                name: required("DB_NAME")?,
                schema: parse_schema(env::var("DB_SCHEMA").unwrap_or_else(|_| "public".into()))?,
                max_idle_conns: parse_or("DB_MAX_IDLE_CONNS", 2)?,
                max_open_conns: parse_or("DB_MAX_OPEN_CONNS", 4)?,
            }),
            Err(_) => None,
        };

        let secret = required("JWT_SECRET_KEY")?;
        if secret.is_empty() {
            return Err(ConfigError::Invalid("JWT_SECRET_KEY"));
        }

        Ok(Self {
            application_name: env::var("APPLICATION_NAME")
                .unwrap_or_else(|_| "tokengate".to_string()),
            hostname: env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string()),
            port: parse_or("SERVER_PORT", 8080)?,
            jwt: JwtConfig {
                secret: secret.into_bytes(),
                access_token_hours: token_hours("JWT_ACCESS_TOKEN_HOURS", 24)?,
                refresh_token_hours: token_hours("JWT_REFRESH_TOKEN_HOURS", 168)?,
            },
            google: GoogleConfig {
                client_id: required("GOOGLE_CLIENT_ID")?,
                client_secret: required("GOOGLE_CLIENT_SECRET").map(|v| v.trim().to_string())?,
                callback_url: required("GOOGLE_CALLBACK_URL")?,
            },
            client_callback_url: env::var("CLIENT_OAUTH2_CALLBACK_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            oauth_state_mode: match env::var("OAUTH2_STATE_MODE") {
                Ok(v) => v.parse()?,
                Err(_) => StateMode::Signed,
            },
            bcrypt_cost: parse_or("BCRYPT_COST", 8)?,
            request_timeout: Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECS", 30)?),
            database,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Longest accepted token lifetime (ten years).
const MAX_TOKEN_HOURS: i64 = 10 * 365 * 24;

fn token_hours(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    check_token_hours(name, parse_or(name, default)?)
}

// Zero or negative lifetimes mint expired tokens; huge ones overflow the
// expiry timestamp.
fn check_token_hours(name: &'static str, hours: i64) -> Result<i64, ConfigError> {
    if (1..=MAX_TOKEN_HOURS).contains(&hours) {
        Ok(hours)
    } else {
        Err(ConfigError::Invalid(name))
    }
}

// The schema name is interpolated into DDL, so only plain identifiers pass.
fn parse_schema(schema: String) -> Result<String, ConfigError> {
    let valid = !schema.is_empty()
        && schema
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !schema.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(schema)
    } else {
        Err(ConfigError::Invalid("DB_SCHEMA"))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
