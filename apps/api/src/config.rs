//! API server configuration

use std::str::FromStr;

use anyhow::{Context, Result};
use socialgraph_shared_config::{
    env_var, parse_env, parse_env_at_least, parse_flag, parse_list, CommonConfig, DatabaseConfig,
    Environment,
};

/// Depth ceiling applied when `MAX_QUERY_DEPTH` is unset
pub const DEFAULT_MAX_QUERY_DEPTH: usize = 5;

/// Persistence backend selected by `STORE_BACKEND`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Process-local tables; contents are lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with other services
    pub common: CommonConfig,

    /// Server port (default: 8000)
    pub port: u16,

    /// Maximum operation depth accepted by the depth guard (default: 5)
    pub max_query_depth: usize,

    pub store_backend: StoreBackend,

    /// Serve the GraphQL playground (default: on outside production)
    pub graphql_playground: bool,

    /// CORS allowed origins (optional)
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// In production mode `DATABASE_URL` must be set explicitly when the
    /// postgres backend is selected.
    pub fn from_env() -> Result<Self> {
        let common = CommonConfig::from_env().context("Failed to load common config")?;

        let store_backend: StoreBackend = env_var("STORE_BACKEND")
            .as_deref()
            .unwrap_or("postgres")
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid STORE_BACKEND value: {}", e))?;

        if common.environment.is_production() && store_backend == StoreBackend::Postgres {
            common
                .database
                .require_url()
                .context("DATABASE_URL is required in production with the postgres backend")?;
        }

        Ok(Self {
            port: parse_env("PORT", 8000)?,
            max_query_depth: parse_env_at_least("MAX_QUERY_DEPTH", DEFAULT_MAX_QUERY_DEPTH, 1)?,
            store_backend,
            graphql_playground: parse_flag(
                "GRAPHQL_PLAYGROUND",
                !common.environment.is_production(),
            )?,
            cors_allowed_origins: parse_list("CORS_ORIGINS"),
            common,
        })
    }

    pub fn database(&self) -> &DatabaseConfig {
        &self.common.database
    }

    pub fn environment(&self) -> Environment {
        self.common.environment
    }
}
