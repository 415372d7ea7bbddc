//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the managers.

pub mod backup;
pub mod config;
pub mod server;
pub mod world;

pub use backup::{handle_backup_command, BackupCommands};
pub use config::{handle_config_command, ConfigCommands};
pub use server::{handle_server_command, ServerCommands};
pub use world::{handle_world_command, WorldCommands};
