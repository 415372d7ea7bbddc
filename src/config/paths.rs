//! Path management for bsm
//!
//! Resolves every on-disk location the tool touches from the loaded
//! [`Settings`]. Relative directories are resolved against the current
//! working directory, the same way the operator typed them.
//!
//! ## Layout
//!
//! ```text
//! <server_directory>/
//!     bedrock_server          server executable
//!     server.pid              process handle
//!     server.properties       active world properties
//!     worlds/<world>/         world data (unless worlds_directory is set)
//! <backup_directory>/
//!     <world>/<world>_<YYYY-MM-DD_HH-MM-SS>.zip
//! ```

use std::path::{Path, PathBuf};

use super::settings::Settings;
use crate::error::{BsmError, BsmResult};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Name of the process handle file inside the server directory
pub const PID_FILE_NAME: &str = "server.pid";

/// Manages all paths used by bsm
#[derive(Debug, Clone)]
pub struct ServerPaths {
    server_dir: PathBuf,
    worlds_dir: PathBuf,
    backup_dir: PathBuf,
    executable_name: String,
}

impl ServerPaths {
    /// Create paths for a server directory and backup root
    ///
    /// Worlds default to `<server_dir>/worlds` and the executable to
    /// `bedrock_server`.
    pub fn new(server_dir: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        let server_dir = server_dir.into();
        Self {
            worlds_dir: server_dir.join("worlds"),
            server_dir,
            backup_dir: backup_dir.into(),
            executable_name: "bedrock_server".to_string(),
        }
    }

    /// Build paths from loaded settings
    pub fn from_settings(settings: &Settings) -> Self {
        let mut paths = Self::new(&settings.server_directory, &settings.backup_directory)
            .with_executable(settings.server_executable.clone());
        if let Some(worlds) = &settings.worlds_directory {
            paths = paths.with_worlds_dir(worlds);
        }
        paths
    }

    /// Override the worlds root
    pub fn with_worlds_dir(mut self, worlds_dir: impl Into<PathBuf>) -> Self {
        self.worlds_dir = worlds_dir.into();
        self
    }

    /// Override the server executable name
    pub fn with_executable(mut self, name: impl Into<String>) -> Self {
        self.executable_name = name.into();
        self
    }

    pub fn server_dir(&self) -> &Path {
        &self.server_dir
    }

    pub fn worlds_dir(&self) -> &Path {
        &self.worlds_dir
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Path to the server binary
    pub fn executable(&self) -> PathBuf {
        self.server_dir.join(&self.executable_name)
    }

    /// Path to the process handle file
    pub fn pid_file(&self) -> PathBuf {
        self.server_dir.join(PID_FILE_NAME)
    }

    /// Path to the server's active `server.properties`
    pub fn server_properties(&self) -> PathBuf {
        self.server_dir.join("server.properties")
    }

    /// Path to a world's live directory
    pub fn world_dir(&self, world: &str) -> PathBuf {
        self.worlds_dir.join(world)
    }

    /// Path to a world's backup directory
    pub fn world_backup_dir(&self, world: &str) -> PathBuf {
        self.backup_dir.join(world)
    }
}

/// Reject world names that would escape the worlds or backup root
pub fn validate_world_name(world: &str) -> BsmResult<()> {
    let trimmed = world.trim();
    if trimmed.is_empty() {
        return Err(BsmError::Validation("World name cannot be empty".into()));
    }
    if trimmed != world {
        return Err(BsmError::Validation(format!(
            "World name '{}' has leading or trailing whitespace",
            world
        )));
    }
    if world == "." || world == ".." || world.contains(['/', '\\', '\0']) {
        return Err(BsmError::Validation(format!(
            "World name '{}' must be a single directory name",
            world
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_layout() {
        let temp_dir = TempDir::new().unwrap();
        let server = temp_dir.path().join("server");
        let paths = ServerPaths::new(&server, temp_dir.path().join("backups"));

        assert_eq!(paths.worlds_dir(), server.join("worlds"));
        assert_eq!(paths.pid_file(), server.join("server.pid"));
        assert_eq!(paths.executable(), server.join("bedrock_server"));
        assert_eq!(
            paths.world_backup_dir("survival"),
            temp_dir.path().join("backups").join("survival")
        );
    }

    #[test]
    fn test_from_settings_honours_overrides() {
        let settings = Settings {
            server_directory: PathBuf::from("/srv/bedrock"),
            worlds_directory: Some(PathBuf::from("/data/worlds")),
            server_executable: "bedrock_server_v2".into(),
            ..Settings::default()
        };
        let paths = ServerPaths::from_settings(&settings);

        assert_eq!(paths.world_dir("w"), PathBuf::from("/data/worlds/w"));
        assert_eq!(
            paths.executable(),
            PathBuf::from("/srv/bedrock/bedrock_server_v2")
        );
    }

    #[test]
    fn test_validate_world_name() {
        assert!(validate_world_name("survival").is_ok());
        assert!(validate_world_name("Bedrock level").is_ok());
        assert!(validate_world_name("").is_err());
        assert!(validate_world_name("..").is_err());
        assert!(validate_world_name("../etc").is_err());
        assert!(validate_world_name("a/b").is_err());
        assert!(validate_world_name(" padded").is_err());
    }
}
