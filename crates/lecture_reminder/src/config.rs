/// Server configuration, loaded from an optional JSON file plus environment overrides
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "LECTURE_REMINDER_CONFIG";
pub const ADDRESS_ENV: &str = "LECTURE_REMINDER_ADDRESS";
pub const PORT_ENV: &str = "LECTURE_REMINDER_PORT";
pub const DATA_ENV: &str = "LECTURE_REMINDER_DATA";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to
    pub address: String,
    pub port: u16,
    /// Location of the JSON database
    pub data_path: PathBuf,
    /// Largest accepted timetable upload, in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 3000,
            data_path: PathBuf::from("data/db.json"),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Loads the config file at `path`, falling back to defaults when it
    /// does not exist.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Applies overrides from a variable lookup (normally `std::env::var`).
    pub fn apply_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(address) = lookup(ADDRESS_ENV) {
            self.address = address;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: PORT_ENV,
                value: port,
            })?;
        }
        if let Some(data) = lookup(DATA_ENV) {
            self.data_path = PathBuf::from(data);
        }
        Ok(self)
    }

    /// Reads the config the binary runs with.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.json".to_string());
        Self::load_from_file(Path::new(&path))?.apply_overrides(|k| std::env::var(k).ok())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}
