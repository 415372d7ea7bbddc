//! Backup system for bsm
//!
//! Provides per-world zip backups with count-based retention and an
//! interactive restore.
//!
//! # Architecture
//!
//! - `BackupManager`: creates archives, prunes old ones, lists what exists
//! - `RestoreManager`: picks an archive with the operator and swaps it in
//! - `RetentionPolicy`: decides which archives fall outside the limit
//!
//! # Backup Layout
//!
//! ```text
//! <backup_directory>/<world>/<world>_YYYY-MM-DD_HH-MM-SS.zip
//! <backup_directory>/<world>/<world>_YYYY-MM-DD_HH-MM-SS_1.zip
//! ```
//!
//! The numeric suffix only appears when two backups land in the same second.
//! Nothing is cached: every listing re-reads the directory.
//!
//! # Example
//!
//! ```rust,ignore
//! use bsm::backup::{BackupManager, RestoreManager, RetentionPolicy};
//! use bsm::config::{ServerPaths, Settings};
//! use bsm::prompt::TerminalPrompt;
//!
//! let settings = Settings::load_or_default("config.yaml".as_ref())?;
//! let paths = ServerPaths::from_settings(&settings);
//!
//! let manager = BackupManager::new(paths.clone(), RetentionPolicy::new(7));
//! let report = manager.create_backup("survival")?;
//!
//! let restore = RestoreManager::new(paths);
//! let result = restore.restore_backup("survival", &mut TerminalPrompt::new())?;
//! println!("{}", result.summary());
//! ```

pub mod archive;
mod manager;
mod record;
mod restore;
mod retention;

pub use archive::ArchiveStats;
pub use manager::{backup_file_name, BackupManager, BackupReport, PruneReport, LIST_PREVIEW};
pub use record::{BackupRecord, BackupSet, WorldBackups, ARCHIVE_EXTENSION};
pub use restore::{RestoreManager, RestoreResult};
pub use retention::RetentionPolicy;
