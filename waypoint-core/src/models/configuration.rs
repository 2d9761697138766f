//! Configuration data structures

use crate::workflow::{FileWorkflowStore, InMemoryWorkflowStore, PersistError, WorkflowStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Logging level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum LogLevel {
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "info")]
    #[default]
    Info,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "trace")]
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceKind {
    /// JSON documents in the data directory
    #[default]
    File,
    /// Process-local maps, nothing survives a restart
    Memory,
}

impl FromStr for PersistenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(PersistenceKind::File),
            "memory" => Ok(PersistenceKind::Memory),
            other => Err(format!(
                "unknown persistence type '{}' (expected 'file' or 'memory')",
                other
            )),
        }
    }
}

/// Environment variable overriding the persistence backend
pub const ENV_PERSISTENCE: &str = "WAYPOINT_PERSISTENCE";
/// Environment variable overriding the data directory
pub const ENV_DATA_DIR: &str = "WAYPOINT_DATA_DIR";
/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "WAYPOINT_LOG_LEVEL";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Configuration {
    /// Logging verbosity level
    pub log_level: LogLevel,
    /// Server bind address
    pub server_host: String,
    /// Server port number
    pub server_port: u16,
    /// Storage backend
    pub persistence: PersistenceKind,
    /// Directory holding definitions.json and instances.json
    pub data_directory: PathBuf,
    /// Maximum accepted request body in bytes
    pub max_request_bytes: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            persistence: PersistenceKind::File,
            data_directory: PathBuf::from("data"),
            max_request_bytes: 64 * 1024,
        }
    }
}

impl Configuration {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Configuration = toml::from_str(&content)?;
            Ok(config)
        } else {
            // Return default configuration if file doesn't exist
            Ok(Configuration::default())
        }
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn default_config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_dir = dirs::config_dir().ok_or("Could not determine config directory")?;
        Ok(config_dir.join("waypoint").join("config.toml"))
    }

    /// Apply `WAYPOINT_*` environment overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), String> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(kind) = lookup(ENV_PERSISTENCE) {
            self.persistence = kind.parse()?;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.trim().is_empty()) {
            self.data_directory = PathBuf::from(dir);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level.parse()?;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server_host.trim().is_empty() {
            errors.push("server_host cannot be empty".to_string());
        }

        if self.server_port == 0 {
            errors.push("server_port must be greater than 0".to_string());
        }

        if self.max_request_bytes < 1024 {
            errors.push("max_request_bytes must be at least 1024".to_string());
        }
        if self.max_request_bytes > 16 * 1024 * 1024 {
            errors.push("max_request_bytes cannot exceed 16777216 (16MB)".to_string());
        }

        if self.persistence == PersistenceKind::File
            && self.data_directory.as_os_str().is_empty()
        {
            errors.push("data_directory is required for file persistence".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Construct the configured storage backend
    pub fn build_store(&self) -> Result<Arc<dyn WorkflowStore>, PersistError> {
        match self.persistence {
            PersistenceKind::Memory => Ok(Arc::new(InMemoryWorkflowStore::new())),
            PersistenceKind::File => Ok(Arc::new(FileWorkflowStore::new(&self.data_directory)?)),
        }
    }
}
