//! Configuration for the document backend

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upload storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load a TOML configuration file. Missing sections fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply `DEVLEARN_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("DEVLEARN_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("DEVLEARN_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("DEVLEARN_PORT is not a port: {}", port)))?;
        }
        if let Some(size) = lookup("DEVLEARN_MAX_UPLOAD_SIZE") {
            self.server.max_upload_size = size.parse().map_err(|_| {
                Error::Config(format!("DEVLEARN_MAX_UPLOAD_SIZE is not a byte count: {}", size))
            })?;
        }
        if let Some(dir) = lookup("DEVLEARN_UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("DEVLEARN_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        Ok(())
    }

    /// Reject values the server cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.storage.upload_dir.as_os_str().is_empty() {
            return Err(Error::Config("storage.upload_dir must not be empty".to_string()));
        }
        if self.database.path.as_os_str().is_empty() {
            return Err(Error::Config("database.path must not be empty".to_string()));
        }
        if self.server.max_upload_size == 0 {
            return Err(Error::Config("server.max_upload_size must be positive".to_string()));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Allow cross-origin requests from any origin
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Flat directory receiving `<uuid>.<ext>` files
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("devlearn")
            .join("documents.db");

        Self { path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [storage]
            upload_dir = "/srv/devlearn/uploads"

            [server]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.upload_dir, PathBuf::from("/srv/devlearn/uploads"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.max_upload_size, 100 * 1024 * 1024);
        assert!(config.database.path.ends_with("documents.db"));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            AppConfig::from_toml("[server]\nport = \"eighty\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("DEVLEARN_UPLOAD_DIR", "/data/uploads"),
            ("DEVLEARN_PORT", "3000"),
            ("DEVLEARN_DATABASE_PATH", "/data/db.sqlite"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.storage.upload_dir, PathBuf::from("/data/uploads"));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.path, PathBuf::from("/data/db.sqlite"));
    }

    #[test]
    fn test_bad_port_override() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|k| (k == "DEVLEARN_PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate() {
        assert!(AppConfig::default().validate().is_ok());

        let mut config = AppConfig::default();
        config.storage.upload_dir = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devlearn.toml");
        std::fs::write(&path, "[database]\npath = \"docs.db\"\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.database.path, PathBuf::from("docs.db"));
        assert!(AppConfig::from_file(dir.path().join("missing.toml")).is_err());
    }
}
