//! Process configuration.
//!
//! Loaded once at startup and never mutated afterwards. Any problem is a
//! CONFIG failure and the binary refuses to serve.

use std::net::SocketAddr;

use chrono::Duration;

use edgeguard_auth::{SigningSecret, TokenConfig};
use edgeguard_core::{AppError, AppResult};
use edgeguard_observability::LogFormat;

pub const APP_ENV: &str = "APP_ENV";
pub const BIND_ADDR: &str = "BIND_ADDR";
pub const JWT_ACCESS_SECRET: &str = "JWT_ACCESS_SECRET";
pub const JWT_REFRESH_SECRET: &str = "JWT_REFRESH_SECRET";
pub const JWT_ACCESS_TTL: &str = "JWT_ACCESS_TTL";
pub const JWT_REFRESH_TTL: &str = "JWT_REFRESH_TTL";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ACCESS_TTL: &str = "15m";
const DEFAULT_REFRESH_TTL: &str = "7d";

/// Deployment environment; controls diagnostic verbosity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    Test,
    #[default]
    Production,
}

impl Environment {
    /// Anything unrecognized is treated as production.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" => Environment::Test,
            _ => Environment::Production,
        }
    }

    /// Only development responses carry the internal trace.
    pub fn exposes_traces(self) -> bool {
        self == Environment::Development
    }

    pub fn log_format(self) -> LogFormat {
        match self {
            Environment::Development => LogFormat::Pretty,
            Environment::Test | Environment::Production => LogFormat::Json,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub bind_addr: SocketAddr,
    pub access: TokenConfig,
    pub refresh: TokenConfig,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (tests pass a closure over a map).
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup(APP_ENV)
            .map(|raw| Environment::parse(&raw))
            .unwrap_or_default();

        let bind_addr = lookup(BIND_ADDR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("{BIND_ADDR} is not a socket address: {bind_addr}")))?;

        let access_secret = required_secret(&lookup, JWT_ACCESS_SECRET)?;
        let refresh_secret = required_secret(&lookup, JWT_REFRESH_SECRET)?;
        if access_secret == refresh_secret {
            return Err(AppError::config(format!(
                "{JWT_ACCESS_SECRET} and {JWT_REFRESH_SECRET} must differ"
            )));
        }

        let access_ttl = ttl_or_default(&lookup, JWT_ACCESS_TTL, DEFAULT_ACCESS_TTL)?;
        let refresh_ttl = ttl_or_default(&lookup, JWT_REFRESH_TTL, DEFAULT_REFRESH_TTL)?;

        Ok(Self {
            environment,
            bind_addr,
            access: TokenConfig::new(access_secret, access_ttl)
                .map_err(|e| AppError::config(format!("{JWT_ACCESS_TTL}: {}", e.message())))?,
            refresh: TokenConfig::new(refresh_secret, refresh_ttl)
                .map_err(|e| AppError::config(format!("{JWT_REFRESH_TTL}: {}", e.message())))?,
        })
    }
}

fn required_secret<F>(lookup: &F, key: &str) -> AppResult<SigningSecret>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_default();
    SigningSecret::new(raw).map_err(|_| AppError::config(format!("{key} must be set and non-empty")))
}

fn ttl_or_default<F>(lookup: &F, key: &str, default: &str) -> AppResult<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    parse_ttl(&raw).map_err(|_| AppError::config(format!("{key} is not a valid duration: {raw}")))
}

/// Parse a ttl such as `900`, `900s`, `15m`, `12h` or `7d`.
pub fn parse_ttl(raw: &str) -> AppResult<Duration> {
    let raw = raw.trim();
    let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);

    let amount: i64 = digits
        .parse()
        .map_err(|_| AppError::config(format!("invalid duration: {raw:?}")))?;

    let ttl = match unit {
        "" | "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        _ => None,
    };
    ttl.ok_or_else(|| AppError::config(format!("invalid duration: {raw:?}")))
}
