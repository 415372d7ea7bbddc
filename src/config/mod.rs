//! Configuration module for bsm
//!
//! This module provides configuration management including:
//! - YAML settings persistence with defaults
//! - Server, world and backup path resolution

pub mod paths;
pub mod settings;

pub use paths::{validate_world_name, ServerPaths};
pub use settings::Settings;
