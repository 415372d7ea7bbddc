//! Durable process handle
//!
//! The handle file holds the decimal PID of the managed server. Its presence
//! is only provisional evidence that the server runs; readers always confirm
//! with a liveness probe.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{BsmError, BsmResult};

/// A recorded server process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    /// PID written by `start`
    pub process_id: u32,
    /// File the PID was read from
    pub handle_path: PathBuf,
}

/// What the handle file currently says
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleState {
    /// No handle file
    Absent,
    /// A well-formed PID
    Recorded(ProcessHandle),
    /// The file exists but does not hold a usable PID
    Corrupt(String),
}

/// The on-disk handle file
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the handle file
    pub fn read(&self) -> BsmResult<HandleState> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HandleState::Absent),
            Err(e) => {
                return Err(BsmError::Io(format!(
                    "Failed to read process handle {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        Ok(match parse_pid(&contents) {
            Some(process_id) => HandleState::Recorded(ProcessHandle {
                process_id,
                handle_path: self.path.clone(),
            }),
            None => HandleState::Corrupt(contents.trim().to_string()),
        })
    }

    /// Durably record a PID (temp file, fsync, rename)
    pub fn write(&self, pid: u32) -> BsmResult<ProcessHandle> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp = tempfile::Builder::new()
            .prefix(".server.pid")
            .tempfile_in(dir)
            .map_err(|e| {
                BsmError::Io(format!(
                    "Failed to create process handle in {}: {}",
                    dir.display(),
                    e
                ))
            })?;

        write!(temp, "{}", pid)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| BsmError::Io(format!("Failed to write process handle: {}", e)))?;

        temp.persist(&self.path).map_err(|e| {
            BsmError::Io(format!(
                "Failed to persist process handle {}: {}",
                self.path.display(),
                e.error
            ))
        })?;

        // Make the rename itself durable
        if let Ok(dir_handle) = File::open(dir) {
            let _ = dir_handle.sync_all();
        }

        Ok(ProcessHandle {
            process_id: pid,
            handle_path: self.path.clone(),
        })
    }

    /// Delete the handle file; a missing file is not an error
    pub fn remove(&self) -> BsmResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BsmError::Io(format!(
                "Failed to remove process handle {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Delete the handle file only if it still records `pid`
    ///
    /// Returns whether a file was removed.
    pub fn remove_if_owned_by(&self, pid: u32) -> BsmResult<bool> {
        match self.read()? {
            HandleState::Recorded(handle) if handle.process_id == pid => {
                self.remove()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Parse a PID, rejecting values no signal call can safely target
fn parse_pid(contents: &str) -> Option<u32> {
    let pid: i32 = contents.trim().parse().ok()?;
    if pid > 0 {
        u32::try_from(pid).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pid_file(temp: &TempDir) -> PidFile {
        PidFile::new(temp.path().join("server.pid"))
    }

    #[test]
    fn test_absent_handle() {
        let temp = TempDir::new().unwrap();
        assert_eq!(pid_file(&temp).read().unwrap(), HandleState::Absent);
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let file = pid_file(&temp);

        let handle = file.write(4242).unwrap();
        assert_eq!(handle.process_id, 4242);
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "4242");
        assert_eq!(file.read().unwrap(), HandleState::Recorded(handle));
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        pid_file(&temp).write(1).unwrap();

        let names: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("server.pid")]);
    }

    #[test]
    fn test_corrupt_handles() {
        let temp = TempDir::new().unwrap();
        let file = pid_file(&temp);

        for contents in ["", "abc", "0", "-12", "99999999999"] {
            fs::write(file.path(), contents).unwrap();
            assert!(
                matches!(file.read().unwrap(), HandleState::Corrupt(_)),
                "{:?} should be corrupt",
                contents
            );
        }
    }

    #[test]
    fn test_trailing_newline_is_accepted() {
        let temp = TempDir::new().unwrap();
        let file = pid_file(&temp);
        fs::write(file.path(), "123\n").unwrap();

        assert!(matches!(
            file.read().unwrap(),
            HandleState::Recorded(ProcessHandle { process_id: 123, .. })
        ));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let file = pid_file(&temp);

        file.write(7).unwrap();
        file.remove().unwrap();
        file.remove().unwrap();
        assert!(!file.path().exists());
    }

    #[test]
    fn test_remove_if_owned_by() {
        let temp = TempDir::new().unwrap();
        let file = pid_file(&temp);

        file.write(10).unwrap();
        assert!(!file.remove_if_owned_by(11).unwrap());
        assert!(file.path().exists());
        assert!(file.remove_if_owned_by(10).unwrap());
        assert!(!file.path().exists());
    }
}
