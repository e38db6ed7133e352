//! Connection settings from the environment.
//!
//! | variable               | default    |
//! |------------------------|------------|
//! | `DATABASE_URL`         | (required) |
//! | `SQLREFLECT_SCHEMA`    | `public`   |
//! | `SQLREFLECT_CATALOG`   | any        |
//! | `SQLREFLECT_POOL_SIZE` | `4`        |
//!
//! A `.env` file in the working directory (or a parent) is loaded first.

use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

use crate::{ReflectOptions, Reflector};

const DEFAULT_POOL_SIZE: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingVar(&'static str),

    #[error("SQLREFLECT_POOL_SIZE must be a positive integer, got {value:?}")]
    InvalidPoolSize { value: String },

    #[error("invalid DATABASE_URL: {0}")]
    InvalidUrl(#[source] tokio_postgres::Error),

    #[error("failed to build connection pool: {0}")]
    Pool(#[from] deadpool_postgres::BuildError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub catalog: Option<String>,
    pub schema: String,
    pub pool_size: usize,
}

impl Config {
    /// Read the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        // a missing .env is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingVar("DATABASE_URL"))?;

        let pool_size = match lookup("SQLREFLECT_POOL_SIZE") {
            None => DEFAULT_POOL_SIZE,
            Some(value) => match value.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidPoolSize { value }),
            },
        };

        let defaults = ReflectOptions::default();
        Ok(Config {
            database_url,
            catalog: lookup("SQLREFLECT_CATALOG").filter(|c| !c.is_empty()),
            schema: lookup("SQLREFLECT_SCHEMA")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.schema),
            pool_size,
        })
    }

    pub fn options(&self) -> ReflectOptions {
        ReflectOptions {
            catalog: self.catalog.clone(),
            schema: self.schema.clone(),
        }
    }

    /// Build a pool. Connections are opened on first use, not here.
    pub fn pool(&self) -> Result<Pool, ConfigError> {
        let pg_config: tokio_postgres::Config =
            self.database_url.parse().map_err(ConfigError::InvalidUrl)?;
        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager).max_size(self.pool_size).build()?;
        tracing::debug!(pool_size = self.pool_size, schema = %self.schema, "built pool");
        Ok(pool)
    }

    /// A [`Reflector`] over a fresh pool.
    pub fn connect(&self) -> Result<Reflector, ConfigError> {
        Ok(Reflector::new(self.pool()?, self.options()))
    }
}
