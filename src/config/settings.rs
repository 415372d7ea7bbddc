//! User settings for bsm
//!
//! Settings live in a YAML file (`config.yaml` by default). Every field has a
//! default so a partial or missing file still yields a usable configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BsmError, BsmResult};

/// Template written by `bsm config init`
pub const DEFAULT_CONFIG_YAML: &str = r#"# Bedrock Server Manager
# Configuration file

# Server directory. This is the directory where the server is installed.
server_directory: ./bedrock_server

# Name of the server binary inside the server directory.
server_executable: bedrock_server

# Directory holding world folders. Defaults to <server_directory>/worlds.
# worlds_directory: ./bedrock_server/worlds

# BACKUP SETTINGS
# Directory where backups will be stored
backup_directory: ./bedrock_server_backups

# Backup interval in minutes (default: 1440 = 24 hours)
backup_interval: 1440

# Number of backups to keep per world (set to 0 to keep all backups)
backups_to_keep: 7
"#;

/// Settings for one managed server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory the server is installed in
    #[serde(default = "default_server_directory")]
    pub server_directory: PathBuf,

    /// Server binary name, relative to the server directory
    #[serde(default = "default_server_executable")]
    pub server_executable: String,

    /// Directory holding world folders (defaults to `<server_directory>/worlds`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worlds_directory: Option<PathBuf>,

    /// Directory where backups are stored
    #[serde(default = "default_backup_directory")]
    pub backup_directory: PathBuf,

    /// Backup interval in minutes, for external schedulers
    #[serde(default = "default_backup_interval")]
    pub backup_interval: u32,

    /// Backups kept per world (0 = unlimited)
    #[serde(default = "default_backups_to_keep")]
    pub backups_to_keep: usize,
}

fn default_server_directory() -> PathBuf {
    PathBuf::from("./bedrock_server")
}

fn default_server_executable() -> String {
    "bedrock_server".to_string()
}

fn default_backup_directory() -> PathBuf {
    PathBuf::from("./bedrock_server_backups")
}

fn default_backup_interval() -> u32 {
    1440 // 24 hours
}

fn default_backups_to_keep() -> usize {
    7
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_directory: default_server_directory(),
            server_executable: default_server_executable(),
            worlds_directory: None,
            backup_directory: default_backup_directory(),
            backup_interval: default_backup_interval(),
            backups_to_keep: default_backups_to_keep(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or fall back to defaults if the file doesn't exist
    pub fn load_or_default(path: &Path) -> BsmResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file missing, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            BsmError::Io(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let settings: Settings = serde_yaml::from_str(&contents).map_err(|e| {
            BsmError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Write the commented default template, refusing to overwrite an existing file
    pub fn write_template(path: &Path) -> BsmResult<bool> {
        if path.exists() {
            return Ok(false);
        }
        std::fs::write(path, DEFAULT_CONFIG_YAML).map_err(|e| {
            BsmError::Io(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(true)
    }

    /// Check that all required values are present
    pub fn validate(&self) -> BsmResult<()> {
        if self.server_directory.as_os_str().is_empty() {
            return Err(BsmError::Config("server_directory cannot be empty".into()));
        }
        if self.backup_directory.as_os_str().is_empty() {
            return Err(BsmError::Config("backup_directory cannot be empty".into()));
        }
        if matches!(&self.worlds_directory, Some(dir) if dir.as_os_str().is_empty()) {
            return Err(BsmError::Config("worlds_directory cannot be empty".into()));
        }
        if self.server_executable.trim().is_empty() {
            return Err(BsmError::Config("server_executable cannot be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server_directory, PathBuf::from("./bedrock_server"));
        assert_eq!(settings.backups_to_keep, 7);
        assert_eq!(settings.backup_interval, 1440);
        assert!(settings.worlds_directory.is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_or_default(&temp_dir.path().join("config.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let settings: Settings = serde_yaml::from_str(DEFAULT_CONFIG_YAML).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "backups_to_keep: 0\nserver_directory: /srv/bedrock\n").unwrap();

        let settings = Settings::load_or_default(&path).unwrap();
        assert_eq!(settings.backups_to_keep, 0);
        assert_eq!(settings.server_directory, PathBuf::from("/srv/bedrock"));
        assert_eq!(settings.server_executable, "bedrock_server");
    }

    #[test]
    fn test_load_worlds_directory_override() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "worlds_directory: /srv/worlds
backups_to_keep: 3
").unwrap();

        let loaded = Settings::load_or_default(&path).unwrap();
        assert_eq!(
            loaded,
            Settings {
                worlds_directory: Some(PathBuf::from("/srv/worlds")),
                backups_to_keep: 3,
                ..Settings::default()
            }
        );
    }

    #[test]
    fn test_invalid_yaml_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "backups_to_keep: [not a number\n").unwrap();

        let err = Settings::load_or_default(&path).unwrap_err();
        assert!(matches!(err, BsmError::Config(_)));
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn test_validate_rejects_empty_directories() {
        let settings = Settings {
            backup_directory: PathBuf::new(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_write_template_does_not_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");

        assert!(Settings::write_template(&path).unwrap());
        std::fs::write(&path, "backups_to_keep: 1\n").unwrap();
        assert!(!Settings::write_template(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "backups_to_keep: 1\n");
    }
}
