//! Environment driven configuration for social graph services
//!
//! Service binaries build their own `Config` on top of [`CommonConfig`] and
//! the `parse_*` helpers here, so every variable is parsed and reported the
//! same way.

mod database;
mod error;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ConfigResult};

use std::env;
use std::fmt;
use std::str::FromStr;

/// Settings every service reads
#[derive(Debug, Clone)]
pub struct CommonConfig {
    pub database: DatabaseConfig,
    pub environment: Environment,
    /// Default level for the service's own spans (`LOG_LEVEL`, default `debug`)
    pub log_level: String,
}

impl CommonConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            database: DatabaseConfig::from_env()?,
            environment: env_var("ENVIRONMENT")
                .map(|value| value.parse().unwrap_or_default())
                .unwrap_or_default(),
            log_level: env_var("LOG_LEVEL").unwrap_or_else(|| "debug".to_string()),
        })
    }

    /// Filter directive used when `RUST_LOG` is unset
    pub fn log_filter(&self, crate_name: &str) -> String {
        format!("{crate_name}={level},tower_http={level}", level = self.log_level)
    }
}

/// Deployment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    /// Unknown names fall back to development
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" | "stage" => Self::Staging,
            _ => Self::Development,
        })
    }
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// A set, non-empty environment variable
pub fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

/// Parse `name`, or return `default` when it is unset
pub fn parse_env<T>(name: &'static str, default: T) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env_var(name) {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

/// [`parse_env`] for counts that must be at least `min`
pub fn parse_env_at_least<T>(name: &'static str, default: T, min: T) -> ConfigResult<T>
where
    T: FromStr + PartialOrd + fmt::Display,
    T::Err: fmt::Display,
{
    let value = parse_env(name, default)?;
    if value < min {
        return Err(ConfigError::BelowMinimum {
            name,
            min: min.to_string(),
            actual: value.to_string(),
        });
    }
    Ok(value)
}

/// Parse a boolean switch such as `true`, `0`, `yes` or `off`
pub fn parse_flag(name: &'static str, default: bool) -> ConfigResult<bool> {
    let Some(value) = env_var(name) else {
        return Ok(default);
    };
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            reason: "expected a boolean".to_string(),
        }),
    }
}

/// Split a comma separated list, dropping blank entries
pub fn parse_list(name: &str) -> Option<Vec<String>> {
    env_var(name).map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect()
    })
}
