//! Configuration types.

use std::str::FromStr;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 5000;

/// Origins allowed to call the API from a browser.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "https://www.inochiinternational.in",
    "https://inochimain.vercel.app",
];

/// Variable lookup used by the `from_lookup` constructors.
pub type Env<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ServerConfig {
    /// Build config from `PORT` and `CORS_ALLOWED_ORIGINS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(env: &Env<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let allowed_origins = match env("CORS_ALLOWED_ORIGINS") {
            Some(list) => {
                let origins: Vec<String> = list
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if origins.is_empty() {
                    defaults.allowed_origins
                } else {
                    origins
                }
            }
            None => defaults.allowed_origins,
        };

        Ok(Self {
            port: env_parse(env, "PORT", DEFAULT_PORT)?,
            allowed_origins,
        })
    }
}

// ── Lookup helpers ──────────────────────────────────────────────────

/// Value of `key`, or `default` when unset or blank.
pub fn env_or(env: &Env<'_>, key: &str, default: &str) -> String {
    env(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Value of `key`, failing when unset or blank.
pub fn env_required(env: &Env<'_>, key: &str) -> Result<String, ConfigError> {
    env(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parsed value of `key`, or `default` when unset or blank.
pub fn env_parse<T>(env: &Env<'_>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}': {e}"),
        }),
        None => Ok(default),
    }
}

/// Boolean flag accepting `true/false`, `1/0`, `yes/no`, `on/off`.
pub fn env_flag(env: &Env<'_>, key: &str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = env(key).filter(|v| !v.trim().is_empty()) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}' is not a boolean"),
        }),
    }
}
