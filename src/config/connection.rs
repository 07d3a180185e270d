//! Database connection configuration.
//!
//! Supports configuration via environment variables:
//! - `RELMETA_DB_DRIVER`: Database driver (sqlite, postgres, mysql, mssql)
//! - `RELMETA_DB_HOST`: Database server hostname (file path for SQLite)
//! - `RELMETA_DB_NAME`: Database name
//! - `RELMETA_DB_PORT`: Port (optional, uses driver default)

use std::env;

use crate::catalog::ConnectionIdentity;

/// Error type for connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported driver: {0}. Supported: sqlite, postgres, mysql, mssql")]
    UnsupportedDriver(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Connection not established: {0}")]
    NotConnected(String),
}

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Sqlite,
    Postgres,
    MySql,
    /// Microsoft SQL Server
    MsSql,
}

impl Driver {
    /// Parse driver from string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConnectionError> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            "postgres" | "postgresql" | "pgsql" => Ok(Driver::Postgres),
            "mysql" | "mariadb" => Ok(Driver::MySql),
            "mssql" | "sqlserver" | "sql_server" => Ok(Driver::MsSql),
            other => Err(ConnectionError::UnsupportedDriver(other.to_string())),
        }
    }

    /// Get the canonical driver name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Sqlite => "sqlite",
            Driver::Postgres => "postgres",
            Driver::MySql => "mysql",
            Driver::MsSql => "mssql",
        }
    }

    /// Get the default port for this driver.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Driver::Sqlite => None,
            Driver::Postgres => Some(5432),
            Driver::MySql => Some(3306),
            Driver::MsSql => Some(1433),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Database driver.
    pub driver: Driver,
    /// Server hostname, or the database file path for SQLite.
    pub host: String,
    /// Database name.
    pub database: String,
    /// Port (optional).
    pub port: Option<u16>,
}

impl ConnectionConfig {
    pub fn new(driver: Driver, host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            driver,
            host: host.into(),
            database: database.into(),
            port: None,
        }
    }

    /// Create a connection config for a SQLite database file.
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self::new(Driver::Sqlite, path, "main")
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `RELMETA_DB_DRIVER`
    /// - `RELMETA_DB_HOST`
    /// - `RELMETA_DB_NAME` (not required for SQLite)
    ///
    /// Optional:
    /// - `RELMETA_DB_PORT`
    pub fn from_env() -> Result<Self, ConnectionError> {
        let driver_str = env::var("RELMETA_DB_DRIVER")
            .map_err(|_| ConnectionError::MissingEnvVar("RELMETA_DB_DRIVER".to_string()))?;

        let driver = Driver::from_str(&driver_str)?;

        let host = env::var("RELMETA_DB_HOST")
            .map_err(|_| ConnectionError::MissingEnvVar("RELMETA_DB_HOST".to_string()))?;

        let database = match driver {
            Driver::Sqlite => env::var("RELMETA_DB_NAME").unwrap_or_else(|_| "main".to_string()),
            _ => env::var("RELMETA_DB_NAME")
                .map_err(|_| ConnectionError::MissingEnvVar("RELMETA_DB_NAME".to_string()))?,
        };

        let port = match env::var("RELMETA_DB_PORT") {
            Ok(p) => Some(p.parse().map_err(|_| {
                ConnectionError::InvalidConfig(format!("RELMETA_DB_PORT is not a port: {}", p))
            })?),
            Err(_) => None,
        };

        Ok(Self {
            driver,
            host,
            database,
            port,
        })
    }

    /// The configured port, falling back to the driver default.
    pub fn effective_port(&self) -> Option<u16> {
        self.port.or_else(|| self.driver.default_port())
    }
}

impl ConnectionIdentity for ConnectionConfig {
    fn host(&self) -> Result<String, ConnectionError> {
        if self.host.is_empty() {
            return Err(ConnectionError::InvalidConfig("host is empty".to_string()));
        }
        Ok(self.host.clone())
    }

    fn port(&self) -> Result<String, ConnectionError> {
        Ok(self
            .effective_port()
            .map(|p| p.to_string())
            .unwrap_or_default())
    }

    fn database_name(&self) -> Result<String, ConnectionError> {
        Ok(self.database.clone())
    }

    fn driver_name(&self) -> Result<String, ConnectionError> {
        Ok(self.driver.as_str().to_string())
    }
}
