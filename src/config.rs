//! Job configuration loaded from environment variables.
//!
//! The binary calls `dotenvy::dotenv()` before [`JobConfig::from_env`], so a
//! local `.env` file can supply any of these variables.

use std::fmt;
use std::path::PathBuf;

use sqlx::postgres::PgConnectOptions;

use crate::error::{ProgressError, Result};

/// Connection parameters for the workout database.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl DatabaseConfig {
    /// Load database configuration from the environment.
    ///
    /// | Env Var       | Required |
    /// |---------------|----------|
    /// | `DB_USERNAME` | yes      |
    /// | `DB_PASSWORD` | yes      |
    /// | `DB_HOST`     | yes      |
    /// | `DB_PORT`     | yes      |
    /// | `DB_NAME`     | yes      |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| {
                ProgressError::ConfigError(format!("environment variable {key} is not set"))
            })
        };

        let port_raw = required("DB_PORT")?;
        let port: u16 = port_raw.trim().parse().map_err(|_| {
            ProgressError::ConfigError(format!("DB_PORT must be a valid u16, got {port_raw:?}"))
        })?;

        Ok(Self {
            username: required("DB_USERNAME")?,
            password: required("DB_PASSWORD")?,
            host: required("DB_HOST")?,
            port,
            database: required("DB_NAME")?,
        })
    }

    /// Postgres connect options built field by field.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}

/// Everything the training job needs, read once at startup.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub database: DatabaseConfig,
    /// Directory receiving the `.pkl` artifacts (`MODEL_OUTPUT_DIR`, default `.`).
    pub output_dir: PathBuf,
}

impl JobConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = DatabaseConfig::from_lookup(&lookup)?;
        let output_dir = lookup("MODEL_OUTPUT_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self { database, output_dir })
    }
}
