//! Backup records
//!
//! A backup is nothing but an archive file on disk. Everything we know about
//! it (size, creation time) comes from filesystem metadata, and every listing
//! is a fresh scan of the backup directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::{BsmError, BsmResult};

/// File extension of backup archives
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Metadata about one backup archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupRecord {
    /// Archive filename
    pub name: String,
    /// Full path to the archive
    pub path: PathBuf,
    /// Size in bytes
    pub size_bytes: u64,
    /// Archive modification time
    pub created_at: DateTime<Local>,
}

impl BackupRecord {
    /// Build a record from an archive on disk
    ///
    /// Returns `Ok(None)` for anything that is not a backup archive.
    pub fn from_path(path: &Path) -> BsmResult<Option<Self>> {
        if path.extension().map_or(true, |ext| ext != ARCHIVE_EXTENSION) {
            return Ok(None);
        }

        let metadata = fs::metadata(path).map_err(|e| {
            BsmError::Io(format!(
                "Failed to read backup metadata {}: {}",
                path.display(),
                e
            ))
        })?;
        if !metadata.is_file() {
            return Ok(None);
        }

        let modified = metadata.modified().map_err(|e| {
            BsmError::Io(format!(
                "Failed to read modification time of {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Some(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
            created_at: DateTime::<Local>::from(modified),
        }))
    }
}

/// All backups of one world, newest first
#[derive(Debug, Clone, Default)]
pub struct BackupSet {
    world: String,
    records: Vec<BackupRecord>,
}

impl BackupSet {
    /// Build a set from records in any order
    pub fn from_records(world: impl Into<String>, mut records: Vec<BackupRecord>) -> Self {
        // Ties on mtime fall back to the name, whose suffix is monotonic
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| name_order(&b.name).cmp(&name_order(&a.name)))
        });
        Self {
            world: world.into(),
            records,
        }
    }

    /// Scan a world's backup directory; a missing directory is an empty set
    pub fn scan(world: impl Into<String>, dir: &Path) -> BsmResult<Self> {
        let world = world.into();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::from_records(world, Vec::new()))
            }
            Err(e) => {
                return Err(BsmError::Io(format!(
                    "Failed to read backup directory {}: {}",
                    dir.display(),
                    e
                )))
            }
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                BsmError::Io(format!("Failed to read directory entry: {}", e))
            })?;
            match BackupRecord::from_path(&entry.path()) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                // Vanished or unreadable archives are skipped, not fatal
                Err(e) => tracing::debug!(error = %e, "skipping backup entry"),
            }
        }

        Ok(Self::from_records(world, records))
    }

    pub fn world(&self) -> &str {
        &self.world
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Combined size of all archives
    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size_bytes).sum()
    }

    /// Records for display, newest first
    pub fn newest_first(&self) -> &[BackupRecord] {
        &self.records
    }

    /// Records for pruning, oldest first
    pub fn oldest_first(&self) -> impl Iterator<Item = &BackupRecord> {
        self.records.iter().rev()
    }

    pub fn newest(&self) -> Option<&BackupRecord> {
        self.records.first()
    }
}

/// Split `w_<stamp>_<n>.zip` into its stem and numeric suffix
///
/// A name without a suffix sorts as attempt 0, before `_1`, `_2` and `_10`.
fn name_order(name: &str) -> (&str, u32) {
    let stem = name
        .strip_suffix(ARCHIVE_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(name);
    match stem.rsplit_once('_') {
        Some((base, suffix)) => match suffix.parse() {
            Ok(n) => (base, n),
            Err(_) => (stem, 0),
        },
        None => (stem, 0),
    }
}

/// Listing summary for one world
#[derive(Debug, Clone, Serialize)]
pub struct WorldBackups {
    /// World name (the backup subdirectory)
    pub world: String,
    /// Most recent backups, newest first, capped for display
    pub recent: Vec<BackupRecord>,
    /// Number of backups, regardless of the cap
    pub backup_count: usize,
    /// Combined size of all backups, regardless of the cap
    pub total_bytes: u64,
}

impl WorldBackups {
    pub fn from_set(set: &BackupSet, preview: usize) -> Self {
        Self {
            world: set.world().to_string(),
            recent: set.newest_first().iter().take(preview).cloned().collect(),
            backup_count: set.len(),
            total_bytes: set.total_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn record(name: &str, minute: u32, size_bytes: u64) -> BackupRecord {
        BackupRecord {
            name: name.to_string(),
            path: PathBuf::from("/backups/w").join(name),
            size_bytes,
            created_at: Local.with_ymd_and_hms(2025, 1, 1, 12, minute, 0).unwrap(),
        }
    }

    fn touch(path: &Path, bytes: usize, age_secs: u64) {
        fs::write(path, vec![0u8; bytes]).unwrap();
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
    }

    #[test]
    fn test_scan_missing_directory() {
        let temp = TempDir::new().unwrap();
        let set = BackupSet::scan("w", &temp.path().join("nope")).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.world(), "w");
    }

    #[test]
    fn test_scan_orders_newest_first_and_ignores_other_files() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("w_old.zip"), 10, 300);
        touch(&temp.path().join("w_new.zip"), 30, 10);
        touch(&temp.path().join("w_mid.zip"), 20, 100);
        touch(&temp.path().join("notes.txt"), 5, 0);
        touch(&temp.path().join("w_partial.zip.tmp"), 5, 0);
        fs::create_dir(temp.path().join("dir.zip")).unwrap();

        let set = BackupSet::scan("w", temp.path()).unwrap();
        let names: Vec<_> = set.newest_first().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["w_new.zip", "w_mid.zip", "w_old.zip"]);
        assert_eq!(set.total_bytes(), 60);

        let oldest: Vec<_> = set.oldest_first().map(|r| r.name.as_str()).collect();
        assert_eq!(oldest, vec!["w_old.zip", "w_mid.zip", "w_new.zip"]);
    }

    #[test]
    fn test_ties_are_ordered_by_name() {
        let set = BackupSet::from_records(
            "w",
            vec![record("w_a_1.zip", 5, 1), record("w_a.zip", 5, 1)],
        );
        assert_eq!(set.newest().unwrap().name, "w_a_1.zip");
    }

    #[test]
    fn test_ties_compare_suffixes_numerically() {
        let set = BackupSet::from_records(
            "w",
            vec![
                record("w_2025-01-01_00-00-00_9.zip", 5, 1),
                record("w_2025-01-01_00-00-00_10.zip", 5, 1),
                record("w_2025-01-01_00-00-00.zip", 5, 1),
            ],
        );
        let names: Vec<_> = set.newest_first().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "w_2025-01-01_00-00-00_10.zip",
                "w_2025-01-01_00-00-00_9.zip",
                "w_2025-01-01_00-00-00.zip",
            ]
        );
    }

    #[test]
    fn test_world_backups_caps_preview_not_totals() {
        let records = (0..8).map(|i| record(&format!("w_{}.zip", i), i, 100)).collect();
        let set = BackupSet::from_records("w", records);

        let summary = WorldBackups::from_set(&set, 5);
        assert_eq!(summary.recent.len(), 5);
        assert_eq!(summary.backup_count, 8);
        assert_eq!(summary.total_bytes, 800);
        assert_eq!(summary.recent[0].name, "w_7.zip");
    }
}
