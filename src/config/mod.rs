use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Value of the environment flag that switches configuration to the JSON file
pub const PRODUCTION_FLAG: &str = "PRODUCTION";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Connection string for the document store, as written in `config.json`
    #[serde(default)]
    pub dbconf: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory of static assets served at the site root
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    /// Largest accepted multipart upload, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_dbconf")]
    pub dbconf: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dbconf: default_dbconf(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_dbconf() -> String {
    "sqlite:cookbooks.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of a login session
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

fn default_session_ttl_hours() -> i64 {
    24 * 7
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where the configuration comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Hardcoded local defaults
    Development,
    /// JSON config file carrying a `dbconf` connection string
    Production,
}

impl RunMode {
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some(PRODUCTION_FLAG) => RunMode::Production,
            _ => RunMode::Development,
        }
    }
}

impl Config {
    /// Read and parse a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config =
            serde_json::from_str(content).with_context(|| "Failed to parse configuration file")?;
        if let Some(dbconf) = config.dbconf.clone() {
            config.database.dbconf = dbconf;
        }
        Ok(config)
    }

    /// Build the effective configuration for `mode`.
    ///
    /// Production reads `path` and requires its `dbconf`; development uses the
    /// local defaults. `port` (from `PORT`) wins over either source.
    pub fn resolve(mode: RunMode, path: &Path, port: Option<u16>) -> Result<Self> {
        let mut config = match mode {
            RunMode::Production => {
                let config = Self::load(path)?;
                if config.dbconf.is_none() {
                    bail!(
                        "{} is missing the dbconf connection string",
                        path.display()
                    );
                }
                config
            }
            RunMode::Development => Config::default(),
        };

        if let Some(port) = port {
            config.server.port = port;
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dbconf: None,
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
