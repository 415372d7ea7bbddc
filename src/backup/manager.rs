//! Backup manager for bsm
//!
//! Creates timestamped zip archives of world directories and keeps each
//! world's backup count within the configured retention.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::archive::{self, ArchiveStats};
use super::record::{BackupRecord, BackupSet, WorldBackups, ARCHIVE_EXTENSION};
use super::retention::RetentionPolicy;
use crate::config::{validate_world_name, ServerPaths};
use crate::error::{BsmError, BsmResult};

/// Number of backups shown per world in a listing
pub const LIST_PREVIEW: usize = 5;

/// Timestamp layout embedded in archive names
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Result of a backup run
#[derive(Debug, Clone)]
pub struct BackupReport {
    /// The new archive
    pub record: BackupRecord,
    /// What went into it
    pub stats: ArchiveStats,
    /// Backups removed by retention, oldest first
    pub pruned: Vec<BackupRecord>,
    /// Backups retention wanted gone but could not delete
    pub prune_failures: Vec<(PathBuf, String)>,
}

/// Result of a retention pass
#[derive(Debug, Clone, Default)]
pub struct PruneReport {
    pub deleted: Vec<BackupRecord>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Manages backup creation and retention
pub struct BackupManager {
    paths: ServerPaths,
    retention: RetentionPolicy,
}

impl BackupManager {
    /// Create a new BackupManager
    pub fn new(paths: ServerPaths, retention: RetentionPolicy) -> Self {
        Self { paths, retention }
    }

    /// Get backup root directory
    pub fn backup_dir(&self) -> &Path {
        self.paths.backup_dir()
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Archive a world and apply retention
    ///
    /// Returns the new archive together with whatever retention removed.
    /// Pruning failures are reported, never fatal: the new backup exists.
    pub fn create_backup(&self, world: &str) -> BsmResult<BackupReport> {
        validate_world_name(world)?;

        let world_dir = self.paths.world_dir(world);
        if !world_dir.is_dir() {
            return Err(BsmError::WorldNotFound {
                world: world.to_string(),
                path: world_dir,
            });
        }

        let backup_dir = self.paths.world_backup_dir(world);
        fs::create_dir_all(&backup_dir).map_err(|e| {
            BsmError::Io(format!(
                "Failed to create backup directory {}: {}",
                backup_dir.display(),
                e
            ))
        })?;

        let (pending, stats) = archive::pack_directory(&world_dir, &backup_dir)?;
        let path = persist_unique(pending, &backup_dir, world, Local::now())?;

        let record = BackupRecord::from_path(&path)?.ok_or_else(|| {
            BsmError::Archive(format!("Backup {} vanished after writing", path.display()))
        })?;

        tracing::info!(
            world,
            archive = %path.display(),
            files = stats.files,
            size_bytes = record.size_bytes,
            "backup created"
        );

        // The archive is already in place, so a failed scan only skips pruning
        let prune = match self.world_backups(world) {
            Ok(set) => self.prune(world, self.retention.select_for_deletion(&set)),
            Err(e) => {
                tracing::warn!(world, error = %e, "skipping retention");
                PruneReport {
                    deleted: Vec::new(),
                    failed: vec![(backup_dir, e.to_string())],
                }
            }
        };
        Ok(BackupReport {
            record,
            stats,
            pruned: prune.deleted,
            prune_failures: prune.failed,
        })
    }

    /// Delete the oldest backups of a world beyond the retention limit
    pub fn enforce_retention(&self, world: &str) -> BsmResult<PruneReport> {
        let set = self.world_backups(world)?;
        Ok(self.prune(world, self.retention.select_for_deletion(&set)))
    }

    /// Delete `records`, collecting failures instead of stopping at them
    fn prune(&self, world: &str, records: Vec<BackupRecord>) -> PruneReport {
        let mut report = PruneReport::default();

        for record in records {
            match fs::remove_file(&record.path) {
                Ok(()) => {
                    tracing::info!(world, archive = %record.path.display(), "old backup removed");
                    report.deleted.push(record);
                }
                Err(e) => {
                    tracing::warn!(
                        world,
                        archive = %record.path.display(),
                        error = %e,
                        "failed to remove old backup"
                    );
                    report.failed.push((record.path, e.to_string()));
                }
            }
        }

        report
    }

    /// All backups of one world, newest first
    pub fn world_backups(&self, world: &str) -> BsmResult<BackupSet> {
        validate_world_name(world)?;
        BackupSet::scan(world, &self.paths.world_backup_dir(world))
    }

    /// Summaries of every world with a backup directory, sorted by world
    ///
    /// Each world shows at most [`LIST_PREVIEW`] recent backups; counts and
    /// sizes always cover all of them.
    pub fn list_backups(&self) -> BsmResult<Vec<WorldBackups>> {
        self.summaries(LIST_PREVIEW)
    }

    /// Like [`list_backups`](Self::list_backups) without the preview cap
    pub fn list_all_backups(&self) -> BsmResult<Vec<WorldBackups>> {
        self.summaries(usize::MAX)
    }

    fn summaries(&self, preview: usize) -> BsmResult<Vec<WorldBackups>> {
        let root = self.paths.backup_dir();
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(BsmError::Io(format!(
                    "Failed to read backup directory {}: {}",
                    root.display(),
                    e
                )))
            }
        };

        let mut worlds = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                BsmError::Io(format!("Failed to read directory entry: {}", e))
            })?;
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }

            let world = entry.file_name().to_string_lossy().to_string();
            let set = BackupSet::scan(world, &entry.path())?;
            worlds.push(WorldBackups::from_set(&set, preview));
        }

        worlds.sort_by(|a, b| a.world.cmp(&b.world));
        Ok(worlds)
    }

    /// Get the most recent backup of a world
    pub fn latest_backup(&self, world: &str) -> BsmResult<Option<BackupRecord>> {
        Ok(self.world_backups(world)?.newest().cloned())
    }
}

/// Archive filename for a world at a point in time
///
/// `attempt` 0 is the plain name; later attempts get a numeric suffix.
pub fn backup_file_name(world: &str, at: DateTime<Local>, attempt: u32) -> String {
    let stamp = at.format(TIMESTAMP_FORMAT);
    if attempt == 0 {
        format!("{}_{}.{}", world, stamp, ARCHIVE_EXTENSION)
    } else {
        format!("{}_{}_{}.{}", world, stamp, attempt, ARCHIVE_EXTENSION)
    }
}

/// Give a packed archive its final name without replacing an existing backup
fn persist_unique(
    mut pending: tempfile::NamedTempFile,
    dir: &Path,
    world: &str,
    at: DateTime<Local>,
) -> BsmResult<PathBuf> {
    const MAX_ATTEMPTS: u32 = 1000;

    for attempt in 0..MAX_ATTEMPTS {
        let target = dir.join(backup_file_name(world, at, attempt));
        match pending.persist_noclobber(&target) {
            Ok(_) => return Ok(target),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                pending = e.file;
            }
            Err(e) => {
                return Err(BsmError::Io(format!(
                    "Failed to write backup {}: {}",
                    target.display(),
                    e.error
                )))
            }
        }
    }

    Err(BsmError::Archive(format!(
        "No free backup name for world '{}' in {}",
        world,
        dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn create_test_manager(keep: usize) -> (BackupManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ServerPaths::new(temp_dir.path().join("server"), temp_dir.path().join("backups"));
        let manager = BackupManager::new(paths, RetentionPolicy::new(keep));
        (manager, temp_dir)
    }

    fn create_world(manager: &BackupManager, world: &str) -> PathBuf {
        let dir = manager.paths.world_dir(world);
        fs::create_dir_all(dir.join("db")).unwrap();
        fs::write(dir.join("level.dat"), b"level data").unwrap();
        fs::write(dir.join("db/CURRENT"), b"MANIFEST-000001").unwrap();
        dir
    }

    fn age(path: &Path, secs: u64) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn test_backup_file_name() {
        use chrono::TimeZone;
        let at = Local.with_ymd_and_hms(2025, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(backup_file_name("w", at, 0), "w_2025-03-09_07-05-01.zip");
        assert_eq!(backup_file_name("w", at, 2), "w_2025-03-09_07-05-01_2.zip");
    }

    #[test]
    fn test_create_backup() {
        let (manager, _temp) = create_test_manager(7);
        create_world(&manager, "survival");

        let report = manager.create_backup("survival").unwrap();
        assert!(report.record.path.exists());
        assert!(report.record.name.starts_with("survival_"));
        assert!(report.record.name.ends_with(".zip"));
        assert_eq!(report.stats.files, 2);
        assert!(report.pruned.is_empty());

        // Only the archive is left in the world's backup directory
        let entries = fs::read_dir(manager.backup_dir().join("survival")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_missing_world() {
        let (manager, _temp) = create_test_manager(7);

        let err = manager.create_backup("ghost").unwrap_err();
        assert!(matches!(err, BsmError::WorldNotFound { .. }));
        assert!(!manager.backup_dir().join("ghost").exists());
    }

    #[test]
    fn test_invalid_world_name() {
        let (manager, _temp) = create_test_manager(7);
        assert!(manager.create_backup("../etc").unwrap_err().is_validation());
    }

    #[test]
    fn test_same_second_backups_do_not_collide() {
        let (manager, _temp) = create_test_manager(0);
        create_world(&manager, "w");

        let first = manager.create_backup("w").unwrap();
        let second = manager.create_backup("w").unwrap();
        let third = manager.create_backup("w").unwrap();

        assert_ne!(first.record.path, second.record.path);
        assert_ne!(second.record.path, third.record.path);
        assert_eq!(manager.world_backups("w").unwrap().len(), 3);
    }

    #[test]
    fn test_persist_unique_adds_suffixes() {
        use chrono::TimeZone;
        let temp = TempDir::new().unwrap();
        let at = Local.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        let names: Vec<_> = (0..3)
            .map(|_| {
                let pending = tempfile::NamedTempFile::new_in(temp.path()).unwrap();
                persist_unique(pending, temp.path(), "w", at).unwrap()
            })
            .map(|path| path.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(
            names,
            vec![
                "w_2025-01-01_00-00-00.zip",
                "w_2025-01-01_00-00-00_1.zip",
                "w_2025-01-01_00-00-00_2.zip",
            ]
        );
    }

    #[test]
    fn test_prune_failure_is_reported_not_fatal() {
        let (manager, _temp) = create_test_manager(1);
        let backup_dir = manager.backup_dir().join("w");
        fs::create_dir_all(&backup_dir).unwrap();

        let removable = backup_dir.join("w_2024-01-01_00-00-00.zip");
        fs::write(&removable, b"old").unwrap();
        // A directory cannot be removed with remove_file
        let stuck = backup_dir.join("w_2024-01-02_00-00-00.zip");
        fs::create_dir(&stuck).unwrap();

        let record = |path: &Path| BackupRecord {
            name: path.file_name().unwrap().to_string_lossy().to_string(),
            path: path.to_path_buf(),
            size_bytes: 3,
            created_at: Local::now(),
        };
        let report = manager.prune("w", vec![record(&removable), record(&stuck)]);

        assert_eq!(report.deleted.len(), 1);
        assert!(!removable.exists());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, stuck);
        assert!(stuck.exists());
    }

    #[test]
    fn test_retention_keeps_newest() {
        let (manager, _temp) = create_test_manager(1);
        create_world(&manager, "w");
        let backup_dir = manager.backup_dir().join("w");
        fs::create_dir_all(&backup_dir).unwrap();

        let older = backup_dir.join("w_2024-01-01_00-00-00.zip");
        let old = backup_dir.join("w_2024-01-02_00-00-00.zip");
        fs::write(&older, b"older").unwrap();
        fs::write(&old, b"old").unwrap();
        age(&older, 7200);
        age(&old, 3600);

        let report = manager.create_backup("w").unwrap();
        let pruned: Vec<_> = report.pruned.iter().map(|r| r.path.clone()).collect();
        assert_eq!(pruned, vec![older.clone(), old.clone()]);

        let remaining = manager.world_backups("w").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining.newest().unwrap().path, report.record.path);
    }

    #[test]
    fn test_zero_retention_keeps_everything() {
        let (manager, _temp) = create_test_manager(0);
        create_world(&manager, "w");

        for _ in 0..4 {
            manager.create_backup("w").unwrap();
        }
        assert_eq!(manager.world_backups("w").unwrap().len(), 4);
    }

    #[test]
    fn test_empty_backup_dir() {
        let (manager, _temp) = create_test_manager(7);

        assert!(manager.list_backups().unwrap().is_empty());
        assert!(manager.latest_backup("w").unwrap().is_none());
    }

    #[test]
    fn test_list_backups_caps_preview() {
        let (manager, _temp) = create_test_manager(0);
        create_world(&manager, "beta");
        create_world(&manager, "alpha");

        for _ in 0..7 {
            manager.create_backup("alpha").unwrap();
        }
        manager.create_backup("beta").unwrap();
        fs::write(manager.backup_dir().join("stray.txt"), b"x").unwrap();

        let listing = manager.list_backups().unwrap();
        let worlds: Vec<_> = listing.iter().map(|w| w.world.as_str()).collect();
        assert_eq!(worlds, vec!["alpha", "beta"]);

        assert_eq!(listing[0].recent.len(), LIST_PREVIEW);
        assert_eq!(listing[0].backup_count, 7);
        let total: u64 = manager
            .world_backups("alpha")
            .unwrap()
            .newest_first()
            .iter()
            .map(|r| r.size_bytes)
            .sum();
        assert_eq!(listing[0].total_bytes, total);
        assert_eq!(listing[1].backup_count, 1);

        let full = manager.list_all_backups().unwrap();
        assert_eq!(full[0].recent.len(), 7);
    }
}
