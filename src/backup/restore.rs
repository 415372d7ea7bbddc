//! Backup restoration for bsm
//!
//! Restores a world directory from one of its archives. The archive is
//! unpacked into a staging directory next to the live world and swapped in
//! with renames, so a failed restore leaves the previous world in place.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::archive::{self, ArchiveStats};
use super::record::{BackupRecord, BackupSet};
use crate::config::{validate_world_name, ServerPaths};
use crate::display::{format_size, format_timestamp};
use crate::error::{BsmError, BsmResult};
use crate::prompt::Prompt;
use crate::server::ServerSupervisor;

/// Sentinel written to prove the worlds root accepts writes
const WRITE_PROBE: &str = ".bsm-write-probe";

/// Handles restoring from backups
pub struct RestoreManager {
    paths: ServerPaths,
}

impl RestoreManager {
    /// Create a new RestoreManager
    pub fn new(paths: ServerPaths) -> Self {
        Self { paths }
    }

    /// Interactively pick one of a world's backups and restore it
    ///
    /// Backups are offered newest first and numbered from 1; answering 0
    /// cancels. Nothing on disk changes until the operator confirms.
    pub fn restore_backup(&self, world: &str, prompt: &mut dyn Prompt) -> BsmResult<RestoreResult> {
        validate_world_name(world)?;

        let set = BackupSet::scan(world, &self.paths.world_backup_dir(world))?;
        if set.is_empty() {
            return Err(BsmError::NoBackups {
                world: world.to_string(),
            });
        }

        if ServerSupervisor::new(&self.paths).is_running() {
            tracing::warn!(world, "restoring while the server is running");
            prompt.notify(
                "Warning: the server is running. Stop it before restoring, or it may overwrite the restored world.",
            );
        }

        prompt.notify(&format!("Available backups for '{}':", world));
        for (index, record) in set.newest_first().iter().enumerate() {
            prompt.notify(&format!(
                "  [{}] {} ({})",
                index + 1,
                format_timestamp(&record.created_at),
                format_size(record.size_bytes)
            ));
        }

        let answer = prompt.ask_line("Enter backup number to restore (0 to cancel)", "0")?;
        let record = select(&set, &answer)?;

        prompt.notify(&format!(
            "This will replace the current '{}' world with the backup from {}.",
            world,
            format_timestamp(&record.created_at)
        ));
        if !prompt.ask_confirm("Are you sure you want to continue?")? {
            return Err(BsmError::Cancelled("Backup restoration".into()));
        }

        self.restore_from_record(world, record)
    }

    /// Replace a world with the contents of `record` without asking
    pub fn restore_from_record(&self, world: &str, record: &BackupRecord) -> BsmResult<RestoreResult> {
        validate_world_name(world)?;

        let worlds_root = self.paths.worlds_dir();
        fs::create_dir_all(worlds_root).map_err(|e| permission_or_io(worlds_root, e))?;
        self.check_writable()?;

        let staging = tempfile::Builder::new()
            .prefix(&format!(".{}.restore-", world))
            .tempdir_in(worlds_root)
            .map_err(|e| permission_or_io(worlds_root, e))?;

        let stats = archive::extract_archive(&record.path, staging.path(), Some(world))?;
        open_up_permissions(staging.path())?;

        let live = self.paths.world_dir(world);
        let aside = if live.exists() {
            let aside = worlds_root.join(format!(
                ".{}.previous-{}",
                world,
                Local::now().format("%Y%m%d%H%M%S%f")
            ));
            fs::rename(&live, &aside).map_err(|e| {
                BsmError::Io(format!("Failed to move {} aside: {}", live.display(), e))
            })?;
            Some(aside)
        } else {
            None
        };

        if let Err(e) = fs::rename(staging.path(), &live) {
            if let Some(aside) = &aside {
                if let Err(undo) = fs::rename(aside, &live) {
                    tracing::error!(
                        world,
                        previous = %aside.display(),
                        error = %undo,
                        "failed to put the previous world back"
                    );
                }
            }
            return Err(BsmError::Io(format!(
                "Failed to move restored world into {}: {}",
                live.display(),
                e
            )));
        }
        // Staging now lives at `live`; dropping it only finds nothing to clean
        drop(staging);

        if let Some(aside) = &aside {
            if let Err(e) = fs::remove_dir_all(aside) {
                tracing::warn!(previous = %aside.display(), error = %e, "failed to remove previous world");
            }
        }

        tracing::info!(
            world,
            archive = %record.path.display(),
            files = stats.files,
            "world restored"
        );

        Ok(RestoreResult {
            world: world.to_string(),
            archive: record.path.clone(),
            backup_date: record.created_at,
            stats,
            replaced_existing: aside.is_some(),
        })
    }

    /// Confirm the worlds root accepts writes
    pub fn check_writable(&self) -> BsmResult<()> {
        let root = self.paths.worlds_dir();
        let probe = root.join(WRITE_PROBE);

        fs::write(&probe, b"").map_err(|e| BsmError::PermissionDenied {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;
        let _ = fs::remove_file(&probe);
        Ok(())
    }
}

/// Resolve an operator answer to a backup
fn select<'a>(set: &'a BackupSet, answer: &str) -> BsmResult<&'a BackupRecord> {
    let invalid = || BsmError::InvalidSelection {
        input: answer.to_string(),
        max: set.len(),
    };

    let choice: usize = answer.trim().parse().map_err(|_| invalid())?;
    if choice == 0 {
        return Err(BsmError::Cancelled("Backup restoration".into()));
    }
    set.newest_first().get(choice - 1).ok_or_else(invalid)
}

fn permission_or_io(path: &Path, err: std::io::Error) -> BsmError {
    if err.kind() == std::io::ErrorKind::PermissionDenied {
        BsmError::PermissionDenied {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    } else {
        BsmError::Io(format!("Failed to prepare {}: {}", path.display(), err))
    }
}

/// Staging directories are created private; the restored world should not be
#[cfg(unix)]
fn open_up_permissions(dir: &Path) -> BsmResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o755))
        .map_err(|e| BsmError::io("set permissions on", dir, e))?;
    Ok(())
}

#[cfg(not(unix))]
fn open_up_permissions(_dir: &Path) -> BsmResult<()> {
    Ok(())
}

/// Result of a restore operation
#[derive(Debug, Clone)]
pub struct RestoreResult {
    /// World that was restored
    pub world: String,
    /// Archive it was restored from
    pub archive: PathBuf,
    /// When that archive was written
    pub backup_date: DateTime<Local>,
    /// What was unpacked
    pub stats: ArchiveStats,
    /// Whether an existing world was replaced
    pub replaced_existing: bool,
}

impl RestoreResult {
    /// Get a summary of what was restored
    pub fn summary(&self) -> String {
        format!(
            "Restored world '{}' from backup of {} ({} files)",
            self.world,
            format_timestamp(&self.backup_date),
            self.stats.files
        )
    }
}
