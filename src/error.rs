//! Custom error types for bsm
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. Every variant names the resource it is
//! about (process id, path or world) so a failure is actionable without
//! reading logs.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// The main error type for bsm operations
#[derive(Error, Debug)]
pub enum BsmError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for operator-supplied values
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// The world directory to back up does not exist yet
    #[error(
        "World '{world}' not found at {}. Run the server once to generate the world first",
        path.display()
    )]
    WorldNotFound { world: String, path: PathBuf },

    /// A live server process is already recorded
    #[error("Cannot start server: already running with PID {pid}")]
    AlreadyRunning { pid: u32 },

    /// No live server process is recorded
    #[error("Cannot stop server: not running (no live process in {})", handle.display())]
    NotRunning { handle: PathBuf },

    /// The operator cannot write to a directory we need to mutate
    #[error("Permission denied for {}: {reason}", path.display())]
    PermissionDenied { path: PathBuf, reason: String },

    /// A signal could not be delivered
    #[error("Failed to send {signal} to PID {pid}: {reason}")]
    SignalFailed {
        signal: &'static str,
        pid: u32,
        reason: String,
    },

    /// Graceful shutdown did not finish in time
    #[error("PID {pid} still alive after {waited_secs}s of graceful shutdown")]
    Timeout { pid: u32, waited_secs: u64 },

    /// Archive read or write failures
    #[error("Archive error: {0}")]
    Archive(String),

    /// No backups exist for a world
    #[error("No backups found for world '{world}'")]
    NoBackups { world: String },

    /// The operator picked a backup index that does not exist
    #[error("Invalid backup selection '{input}': expected a number between 0 and {max}")]
    InvalidSelection { input: String, max: usize },

    /// The operator declined to continue
    #[error("{0} cancelled")]
    Cancelled(String),
}

impl BsmError {
    /// Wrap an I/O failure with the action and the path it hit
    pub fn io(action: &str, path: &Path, err: std::io::Error) -> Self {
        Self::Io(format!("Failed to {} {}: {}", action, path.display(), err))
    }

    /// Create a "not found" error for worlds
    pub fn world_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "World",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for the server executable
    pub fn executable_not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            entity_type: "Server executable",
            identifier: path.into().display().to_string(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::WorldNotFound { .. })
    }

    /// Check if the operator cancelled the operation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for BsmError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_yaml::Error> for BsmError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BsmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<zip::result::ZipError> for BsmError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

impl From<walkdir::Error> for BsmError {
    fn from(err: walkdir::Error) -> Self {
        Self::Archive(err.to_string())
    }
}

/// Result type alias for bsm operations
pub type BsmResult<T> = Result<T, BsmError>;
