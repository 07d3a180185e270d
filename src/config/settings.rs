//! TOML-based configuration.
//!
//! Supports a config file (relmeta.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [connections.production]
//! driver = "postgres"
//! host = "${PROD_DB_HOST}"
//! port = 5432
//! database = "app"
//!
//! [connections.dev]
//! driver = "sqlite"
//! host = "./data/dev.db"
//!
//! [cache]
//! enabled = true
//! path = "~/.relmeta/cache.db"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::connection::{ConnectionConfig, Driver};
use crate::cache::{CacheError, CacheStore, MemoryCache, MetadataCache};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),

    #[error("Failed to open cache: {0}")]
    Cache(#[from] CacheError),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Named database connections.
    pub connections: HashMap<String, ConnectionSettings>,

    /// Cache store configuration.
    pub cache: CacheSettings,
}

/// Connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Database driver (sqlite, postgres, mysql, mssql).
    pub driver: String,

    /// Server hostname or SQLite file path (supports ${ENV_VAR} expansion).
    pub host: String,

    /// Port; the driver default applies when absent.
    #[serde(default)]
    pub port: Option<u16>,

    /// Database name (supports ${ENV_VAR} expansion).
    #[serde(default)]
    pub database: Option<String>,
}

impl ConnectionSettings {
    /// Get the driver type.
    pub fn driver_type(&self) -> Result<Driver, SettingsError> {
        Driver::from_str(&self.driver)
            .map_err(|_| SettingsError::UnsupportedDriver(self.driver.clone()))
    }

    /// Resolve into a [`ConnectionConfig`], expanding environment variables.
    pub fn to_connection_config(&self) -> Result<ConnectionConfig, SettingsError> {
        let driver = self.driver_type()?;
        let host = expand_env_vars(&self.host)?;
        let database = match &self.database {
            Some(db) => expand_env_vars(db)?,
            None if driver == Driver::Sqlite => "main".to_string(),
            None => String::new(),
        };

        Ok(ConnectionConfig {
            driver,
            host,
            database,
            port: self.port,
        })
    }
}

/// Cache store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Persist derived metadata in a SQLite file. When disabled, results
    /// only live for the process lifetime.
    pub enabled: bool,

    /// Cache database path (supports ${ENV_VAR} expansion and a leading `~`).
    pub path: Option<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl CacheSettings {
    /// Open the configured cache store.
    pub fn open_store(&self) -> Result<Arc<dyn CacheStore>, SettingsError> {
        if !self.enabled {
            return Ok(Arc::new(MemoryCache::new()));
        }

        let cache = match &self.path {
            Some(path) => MetadataCache::open_at(expand_home(&expand_env_vars(path)?))?,
            None => MetadataCache::open()?,
        };
        Ok(Arc::new(cache))
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `RELMETA_CONFIG`
    /// 2. `./relmeta.toml`
    /// 3. `~/.config/relmeta/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("RELMETA_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("relmeta.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("relmeta").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Get a connection by name.
    pub fn get_connection(&self, name: &str) -> Result<&ConnectionSettings, SettingsError> {
        self.connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                // Lone $
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
