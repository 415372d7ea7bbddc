//! bsm - Bedrock dedicated server manager
//!
//! This library provides the core functionality behind the `bsm` command:
//! supervising a Minecraft Bedrock dedicated server process, backing up its
//! worlds as zip archives with count-based retention, and restoring them.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Settings file and path resolution
//! - `error`: Custom error types
//! - `server`: Process handle, signal delivery and the supervisor
//! - `backup`: Archive creation, retention and restore
//! - `worlds`: World listing and switching
//! - `prompt`: Operator input for interactive flows
//! - `cli`: Command handlers
//! - `display`: Terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use bsm::config::{ServerPaths, Settings};
//! use bsm::server::ServerSupervisor;
//!
//! let settings = Settings::load_or_default("config.yaml".as_ref())?;
//! let paths = ServerPaths::from_settings(&settings);
//!
//! let supervisor = ServerSupervisor::new(&paths);
//! let handle = supervisor.start()?;
//! println!("started {}", handle.process_id);
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod prompt;
pub mod server;
pub mod worlds;

pub use error::{BsmError, BsmResult};
