//! Configuration file handling
//!
//! A run is configured from a YAML or TOML file. Every section and field is
//! optional; missing values fall back to the defaults below.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::{Error, Result};
use crate::verify::HeaderMode;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Case suite settings
    #[serde(default)]
    pub cases: CasesConfig,

    /// Fixture database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Server under test
    #[serde(default)]
    pub server: ServerConfig,

    /// Response verification settings
    #[serde(default)]
    pub verify: VerifyConfig,

    /// Run loop settings
    #[serde(default)]
    pub run: RunConfig,
}

/// Case suite settings
#[derive(Debug, Deserialize)]
pub struct CasesConfig {
    /// Path to the JSON case suite
    #[serde(default = "default_cases_path")]
    pub file_path: PathBuf,

    /// Number of decoded cases buffered ahead of execution
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for CasesConfig {
    fn default() -> Self {
        Self {
            file_path: default_cases_path(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_cases_path() -> PathBuf {
    PathBuf::from("cases.json")
}
fn default_queue_capacity() -> usize {
    10
}

/// Database engine fixtures run against
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    /// Local SQLite file
    #[default]
    Sqlite,
    /// MySQL server over TCP
    Mysql,
}

/// Fixture database settings
#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    /// Which engine to use
    #[serde(default)]
    pub kind: DatabaseKind,

    /// SQLite database file, or `:memory:`
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// MySQL server as `host:port`
    #[serde(default = "default_database_address")]
    pub address: String,

    /// MySQL user
    #[serde(default = "default_database_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// MySQL schema selected on connect
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: DatabaseKind::default(),
            path: default_database_path(),
            address: default_database_address(),
            user: default_database_user(),
            password: String::new(),
            name: None,
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("fixtures.db")
}
fn default_database_address() -> String {
    "localhost:3306".to_string()
}
fn default_database_user() -> String {
    "root".to_string()
}

/// Server under test
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Base address requests are sent to
    #[serde(default = "default_server_address")]
    pub address: String,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_server_address(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_server_address() -> String {
    "http://localhost:8080".to_string()
}
fn default_timeout() -> u64 {
    5
}

/// Response verification settings
#[derive(Debug, Deserialize)]
pub struct VerifyConfig {
    /// Header names left out of the comparison on both sides
    #[serde(default = "default_excluded_headers")]
    pub excluded_headers: Vec<String>,

    /// How expected headers are matched against the response
    #[serde(default)]
    pub header_mode: HeaderMode,

    /// Treat a mismatch as a case error
    #[serde(default)]
    pub strict: bool,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            excluded_headers: default_excluded_headers(),
            header_mode: HeaderMode::default(),
            strict: false,
        }
    }
}

fn default_excluded_headers() -> Vec<String> {
    vec!["Date".to_string(), "Content-Length".to_string()]
}

/// Run loop settings
#[derive(Debug, Deserialize)]
pub struct RunConfig {
    /// Stop the suite at the first case error
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            fail_fast: default_fail_fast(),
        }
    }
}

fn default_fail_fast() -> bool {
    true
}

impl Config {
    /// Load configuration
    ///
    /// With an explicit path the file must exist. Without one, the platform
    /// config file is used when present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file, choosing the format from its extension
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;

        let mut config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content)?,
            _ => Self::from_toml_str(&content)?,
        };

        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Resolve relative file paths against the config file's directory
    fn resolve_relative_to(&mut self, base: &Path) {
        if self.cases.file_path.is_relative() {
            self.cases.file_path = base.join(&self.cases.file_path);
        }
        if self.database.kind == DatabaseKind::Sqlite
            && self.database.path.is_relative()
            && self.database.path != Path::new(":memory:")
        {
            self.database.path = base.join(&self.database.path);
        }
    }

    /// Reject values the run cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.cases.queue_capacity == 0 {
            return Err(Error::Config(
                "cases.queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.database.kind == DatabaseKind::Mysql && self.database.address.trim().is_empty() {
            return Err(Error::Config("database.address must not be empty".to_string()));
        }
        if self.server.address.trim().is_empty() {
            return Err(Error::Config("server.address must not be empty".to_string()));
        }
        if self.server.timeout_secs == 0 {
            return Err(Error::Config(
                "server.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
