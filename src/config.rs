use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};

use crate::errors::{Error, Result};
use crate::storage::ArtistStorage;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Where the artist table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// A `DuckDB` file, created on first use
    File(PathBuf),
    /// Private database that vanishes with the process
    InMemory,
}

impl DatabaseLocation {
    /// Opens storage at this location
    pub async fn open(&self) -> Result<ArtistStorage> {
        match self {
            DatabaseLocation::File(path) => ArtistStorage::open(path).await,
            DatabaseLocation::InMemory => ArtistStorage::open_in_memory().await,
        }
    }
}

/// Listener settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Upper bound on the time spent serving a single request
    pub request_timeout: Duration,
}

impl ServerConfig {
    /// `host:port`
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration for the whole service
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Where artists are stored
    pub database: DatabaseLocation,
}

/// Collects explicit overrides; anything left unset is read from the
/// environment (`HOST`, `PORT`, `REQUEST_TIMEOUT_SECS`, `SPOTLE_DB_PATH`).
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    request_timeout: Option<Duration>,
    database: Option<DatabaseLocation>,
}

impl ConfigBuilder {
    /// Builder with no overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind address; `None` keeps the current value
    #[must_use]
    pub fn host(mut self, host: Option<String>) -> Self {
        if host.is_some() {
            self.host = host;
        }
        self
    }

    /// Bind port; `None` keeps the current value
    #[must_use]
    pub fn port(mut self, port: Option<u16>) -> Self {
        if port.is_some() {
            self.port = port;
        }
        self
    }

    /// Per-request timeout
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Storage location; `None` keeps the current value
    #[must_use]
    pub fn database(mut self, database: Option<DatabaseLocation>) -> Self {
        if database.is_some() {
            self.database = database;
        }
        self
    }

    /// Resolves every setting, reading the environment for missing ones
    pub fn build(self) -> Result<Config> {
        let host = match self.host {
            Some(h) => h,
            None => std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
        };
        let port = match self.port {
            Some(p) => p,
            None => parse_port(std::env::var("PORT").ok().as_deref()),
        };
        let request_timeout = match self.request_timeout {
            Some(t) => t,
            None => parse_timeout(std::env::var("REQUEST_TIMEOUT_SECS").ok().as_deref()),
        };
        let database = match self.database {
            Some(d) => d,
            None => DatabaseLocation::File(default_db_path()?),
        };

        debug!("Resolved database location: {database:?}");
        Ok(Config {
            server: ServerConfig {
                host,
                port,
                request_timeout,
            },
            database,
        })
    }
}

fn parse_port(raw: Option<&str>) -> u16 {
    match raw.and_then(|v| v.parse::<u16>().ok()) {
        Some(port) => port,
        None => {
            info!("Defaulting port to {DEFAULT_PORT}");
            DEFAULT_PORT
        }
    }
}

fn parse_timeout(raw: Option<&str>) -> Duration {
    let secs = raw
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

fn default_db_path() -> Result<PathBuf> {
    match std::env::var("SPOTLE_DB_PATH") {
        Ok(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        Ok(_) | Err(std::env::VarError::NotPresent) => Ok(dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp")) // Fallback to /tmp if cache directory can't be determined
            .join(".spotle_db.duckdb")),
        Err(e) => Err(Error::from(e)),
    }
}
