//! Backup CLI commands
//!
//! Implements CLI commands for backup management.

use clap::Subcommand;

use crate::backup::{BackupManager, RestoreManager, RetentionPolicy};
use crate::config::{ServerPaths, Settings};
use crate::display::{format_backup_listing, format_backup_report, format_backup_table, format_prune_report};
use crate::error::{BsmError, BsmResult};
use crate::prompt::TerminalPrompt;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create a backup of a world
    Create {
        /// World directory name
        world: String,
    },

    /// List backups of every world
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Show every backup instead of the most recent five per world
        #[arg(short, long)]
        all: bool,
    },

    /// Restore a world from one of its backups
    Restore {
        /// World directory name
        world: String,
    },

    /// Delete backups of a world beyond the retention limit
    Prune {
        /// World directory name
        world: String,
    },
}

/// Handle a backup command
pub fn handle_backup_command(
    paths: &ServerPaths,
    settings: &Settings,
    cmd: BackupCommands,
) -> BsmResult<()> {
    let retention = RetentionPolicy::new(settings.backups_to_keep);
    let manager = BackupManager::new(paths.clone(), retention);

    match cmd {
        BackupCommands::Create { world } => {
            println!("Creating backup of '{}'...", world);
            let report = manager.create_backup(&world)?;
            print!("{}", format_backup_report(&report));
        }

        BackupCommands::List { json, all } => {
            let worlds = if all {
                manager.list_all_backups()?
            } else {
                manager.list_backups()?
            };

            if json {
                let rendered = serde_json::to_string_pretty(&worlds)
                    .map_err(|e| BsmError::Json(format!("Failed to render backups: {}", e)))?;
                println!("{}", rendered);
            } else if all {
                print!("{}", format_backup_table(&worlds));
            } else {
                print!("{}", format_backup_listing(&worlds));
                if worlds.is_empty() {
                    println!("Create one with: bsm backup create <world>");
                }
            }
        }

        BackupCommands::Restore { world } => {
            let restore_manager = RestoreManager::new(paths.clone());
            let result = restore_manager.restore_backup(&world, &mut TerminalPrompt::new())?;
            println!("Restore complete!");
            println!("{}", result.summary());
        }

        BackupCommands::Prune { world } => {
            if retention.is_unlimited() {
                println!("backups_to_keep is 0: keeping every backup.");
                return Ok(());
            }
            let report = manager.enforce_retention(&world)?;
            print!("{}", format_prune_report(&world, &report));
        }
    }

    Ok(())
}
