//! World discovery and switching
//!
//! A world is a directory under the worlds root that carries its own
//! `server.properties`. The server plays whichever world its top-level
//! `server.properties` names in `level-name`; switching copies the world's
//! properties (and allowlist) over the server's.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{validate_world_name, ServerPaths};
use crate::error::{BsmError, BsmResult};

/// Properties file every world carries
pub const PROPERTIES_FILE: &str = "server.properties";

/// Optional allowlist copied along with the properties
pub const ALLOWLIST_FILE: &str = "allowlist.json";

/// Key naming the active world
const LEVEL_NAME_KEY: &str = "level-name";

/// A world found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldInfo {
    /// Directory name
    pub name: String,
    /// World directory
    pub path: PathBuf,
    /// Whether the server currently points at this world
    pub active: bool,
}

/// Result of a world switch
#[derive(Debug, Clone)]
pub struct SwitchReport {
    pub world: String,
    /// Files copied into the server directory
    pub copied: Vec<PathBuf>,
}

/// Lists and switches worlds
pub struct WorldManager {
    paths: ServerPaths,
}

impl WorldManager {
    pub fn new(paths: ServerPaths) -> Self {
        Self { paths }
    }

    /// Worlds under the worlds root, sorted by name
    pub fn list_worlds(&self) -> BsmResult<Vec<WorldInfo>> {
        let root = self.paths.worlds_dir();
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(BsmError::Io(format!(
                    "Failed to read worlds directory {}: {}",
                    root.display(),
                    e
                )))
            }
        };

        let active = self.active_world()?;
        let mut worlds = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                BsmError::Io(format!("Failed to read directory entry: {}", e))
            })?;
            let name = entry.file_name().to_string_lossy().to_string();
            // Restore staging and displaced worlds are hidden
            if name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            if !path.join(PROPERTIES_FILE).is_file() {
                continue;
            }

            worlds.push(WorldInfo {
                active: active.as_deref() == Some(name.as_str()),
                name,
                path,
            });
        }

        worlds.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(worlds)
    }

    /// The world the server's `server.properties` names, if any
    pub fn active_world(&self) -> BsmResult<Option<String>> {
        read_property(&self.paths.server_properties(), LEVEL_NAME_KEY)
    }

    /// Make `world` the server's active world
    pub fn switch_world(&self, world: &str) -> BsmResult<SwitchReport> {
        validate_world_name(world)?;

        let world_dir = self.paths.world_dir(world);
        let properties = world_dir.join(PROPERTIES_FILE);
        if !properties.is_file() {
            return Err(BsmError::world_not_found(world));
        }

        let server_dir = self.paths.server_dir();
        fs::create_dir_all(server_dir).map_err(|e| BsmError::io("create", server_dir, e))?;

        let mut copied = Vec::new();
        for name in [PROPERTIES_FILE, ALLOWLIST_FILE] {
            let source = world_dir.join(name);
            if !source.is_file() {
                continue;
            }
            let target = self.paths.server_dir().join(name);
            fs::copy(&source, &target).map_err(|e| {
                BsmError::Io(format!(
                    "Failed to copy {} to {}: {}",
                    source.display(),
                    target.display(),
                    e
                ))
            })?;
            copied.push(target);
        }

        tracing::info!(world, files = copied.len(), "switched active world");
        Ok(SwitchReport {
            world: world.to_string(),
            copied,
        })
    }
}

/// Look up `key` in a `key=value` properties file
///
/// A missing file reads as no value. Comment lines start with `#`.
pub fn read_property(path: &Path, key: &str) -> BsmResult<Option<String>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(BsmError::Io(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .find(|(k, _)| k.trim() == key)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (WorldManager, ServerPaths, TempDir) {
        let temp = TempDir::new().unwrap();
        let paths = ServerPaths::new(temp.path().join("server"), temp.path().join("backups"));
        (WorldManager::new(paths.clone()), paths, temp)
    }

    fn add_world(paths: &ServerPaths, name: &str, with_allowlist: bool) {
        let dir = paths.world_dir(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(PROPERTIES_FILE),
            format!("server-name=Test\nlevel-name={}\n", name),
        )
        .unwrap();
        if with_allowlist {
            fs::write(dir.join(ALLOWLIST_FILE), "[]").unwrap();
        }
    }

    #[test]
    fn test_read_property() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join(PROPERTIES_FILE);
        fs::write(
            &file,
            "# level-name=commented\nserver-port = 19132\nlevel-name=Survival World\nempty=\n",
        )
        .unwrap();

        assert_eq!(
            read_property(&file, "level-name").unwrap().as_deref(),
            Some("Survival World")
        );
        assert_eq!(read_property(&file, "server-port").unwrap().as_deref(), Some("19132"));
        assert_eq!(read_property(&file, "empty").unwrap(), None);
        assert_eq!(read_property(&file, "missing").unwrap(), None);
        assert_eq!(
            read_property(&temp.path().join("nope"), "level-name").unwrap(),
            None
        );
    }

    #[test]
    fn test_list_worlds_empty_root() {
        let (manager, _, _temp) = setup();
        assert!(manager.list_worlds().unwrap().is_empty());
    }

    #[test]
    fn test_list_worlds_requires_properties() {
        let (manager, paths, _temp) = setup();
        add_world(&paths, "beta", false);
        add_world(&paths, "alpha", false);
        fs::create_dir_all(paths.world_dir("half-made")).unwrap();

        let names: Vec<_> = manager
            .list_worlds()
            .unwrap()
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_list_worlds_skips_hidden_directories() {
        let (manager, paths, _temp) = setup();
        add_world(&paths, "alpha", false);
        let leftover = paths.worlds_dir().join(".alpha.previous-20250101000000");
        fs::create_dir_all(&leftover).unwrap();
        fs::write(leftover.join(PROPERTIES_FILE), "level-name=alpha\n").unwrap();

        let names: Vec<_> = manager
            .list_worlds()
            .unwrap()
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["alpha"]);
    }

    #[test]
    fn test_switch_world() {
        let (manager, paths, _temp) = setup();
        add_world(&paths, "alpha", true);
        add_world(&paths, "beta", false);

        let report = manager.switch_world("alpha").unwrap();
        assert_eq!(report.copied.len(), 2);
        assert_eq!(manager.active_world().unwrap().as_deref(), Some("alpha"));
        assert!(paths.server_dir().join(ALLOWLIST_FILE).exists());

        manager.switch_world("beta").unwrap();
        let worlds = manager.list_worlds().unwrap();
        let active: Vec<_> = worlds.iter().filter(|w| w.active).map(|w| w.name.as_str()).collect();
        assert_eq!(active, vec!["beta"]);
    }

    #[test]
    fn test_switch_unknown_world() {
        let (manager, _, _temp) = setup();
        let err = manager.switch_world("ghost").unwrap_err();
        assert!(err.is_not_found());
    }
}
