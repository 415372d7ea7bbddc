//! Server process supervision
//!
//! A [`ServerSupervisor`] owns one logical process slot for a server
//! directory:
//!
//! ```text
//! Stopped -> Starting -> Running -> Stopping -> Stopped
//!                           |
//!                         Stale (handle present, process gone) -> Stopped
//! ```
//!
//! The handle file is the only state. Nothing is cached in memory, so a fresh
//! supervisor (a new CLI invocation) sees exactly what the previous one left
//! on disk and re-validates it with a liveness probe.
//!
//! A recycled PID that now belongs to an unrelated process probes as alive.
//! This is a known limitation; no process start-time is recorded.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::handle::{HandleState, PidFile, ProcessHandle};
use super::signal::{ProcessSignaller, Signaller};
use crate::config::ServerPaths;
use crate::error::{BsmError, BsmResult};

/// What `status` reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Stopped,
    Running { pid: u32 },
}

impl ServerStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Running { pid } => write!(f, "running (PID: {})", pid),
        }
    }
}

/// How `stop` waits for a graceful exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTiming {
    /// Delay between liveness probes
    pub poll_interval: Duration,
    /// Time allowed after SIGTERM before SIGKILL
    pub ceiling: Duration,
}

impl Default for StopTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            ceiling: Duration::from_secs(30),
        }
    }
}

/// How a successful `stop` ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The server exited after SIGTERM
    Graceful,
    /// The ceiling was reached and SIGKILL was sent
    Forced,
}

/// Supervises the server process of one server directory
pub struct ServerSupervisor<S: Signaller = ProcessSignaller> {
    server_dir: PathBuf,
    executable: PathBuf,
    handle: PidFile,
    signaller: S,
    timing: StopTiming,
}

impl ServerSupervisor<ProcessSignaller> {
    /// Create a supervisor that signals real processes
    pub fn new(paths: &ServerPaths) -> Self {
        Self::with_signaller(paths, ProcessSignaller)
    }
}

impl<S: Signaller> ServerSupervisor<S> {
    /// Create a supervisor with a custom signal capability
    pub fn with_signaller(paths: &ServerPaths, signaller: S) -> Self {
        Self {
            server_dir: paths.server_dir().to_path_buf(),
            executable: paths.executable(),
            handle: PidFile::new(paths.pid_file()),
            signaller,
            timing: StopTiming::default(),
        }
    }

    /// Override the stop polling interval and ceiling
    pub fn with_stop_timing(mut self, timing: StopTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Path of the handle file
    pub fn handle_path(&self) -> &Path {
        self.handle.path()
    }

    pub fn signaller(&self) -> &S {
        &self.signaller
    }

    /// Start the server in the background
    ///
    /// The server inherits stdout/stderr and runs with the server directory
    /// as its working directory. A detached reaper thread removes the handle
    /// once the process exits.
    pub fn start(&self) -> BsmResult<ProcessHandle> {
        if let Some(handle) = self.live_handle()? {
            return Err(BsmError::AlreadyRunning {
                pid: handle.process_id,
            });
        }

        if !self.executable.is_file() {
            return Err(BsmError::executable_not_found(&self.executable));
        }
        let executable = self.executable.canonicalize().map_err(|e| {
            BsmError::Io(format!(
                "Failed to resolve server executable {}: {}",
                self.executable.display(),
                e
            ))
        })?;
        ensure_executable(&executable)?;

        let mut child = Command::new(&executable)
            .current_dir(&self.server_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                BsmError::Io(format!(
                    "Failed to start server {}: {}",
                    executable.display(),
                    e
                ))
            })?;
        let pid = child.id();

        let handle = match self.handle.write(pid) {
            Ok(handle) => handle,
            Err(e) => {
                // An untracked server could never be stopped through us
                warn!(pid, error = %e, "could not record server PID, killing it");
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };

        info!(pid, executable = %executable.display(), "server started");
        spawn_reaper(child, self.handle.clone());
        Ok(handle)
    }

    /// Stop the server: SIGTERM, wait, then SIGKILL at the ceiling
    pub fn stop(&self) -> BsmResult<StopOutcome> {
        let handle = self.live_handle()?.ok_or_else(|| BsmError::NotRunning {
            handle: self.handle.path().to_path_buf(),
        })?;
        let pid = handle.process_id;

        self.signaller.terminate(pid)?;
        info!(pid, "sent SIGTERM, waiting for shutdown");

        let started = Instant::now();
        loop {
            if !self.probe_quietly(pid) {
                self.handle.remove_if_owned_by(pid)?;
                let elapsed_ms = started.elapsed().as_millis() as u64;
                info!(pid, elapsed_ms, "server stopped");
                return Ok(StopOutcome::Graceful);
            }

            let elapsed = started.elapsed();
            if elapsed >= self.timing.ceiling {
                break;
            }
            thread::sleep(self.timing.poll_interval.min(self.timing.ceiling - elapsed));
        }

        let timeout = BsmError::Timeout {
            pid,
            waited_secs: self.timing.ceiling.as_secs(),
        };
        warn!(pid, "{}; sending SIGKILL", timeout);

        self.signaller.kill(pid)?;
        self.handle.remove_if_owned_by(pid)?;
        info!(pid, "server killed");
        Ok(StopOutcome::Forced)
    }

    /// Report whether the server runs, cleaning up a stale handle
    pub fn status(&self) -> BsmResult<ServerStatus> {
        Ok(match self.live_handle()? {
            Some(handle) => ServerStatus::Running {
                pid: handle.process_id,
            },
            None => ServerStatus::Stopped,
        })
    }

    /// Boolean shorthand for `status`; any error counts as not running
    pub fn is_running(&self) -> bool {
        match self.handle.read() {
            Ok(HandleState::Recorded(handle)) => self.probe_quietly(handle.process_id),
            _ => false,
        }
    }

    /// Read the handle and confirm the process behind it
    ///
    /// Stale and corrupt handles are removed.
    fn live_handle(&self) -> BsmResult<Option<ProcessHandle>> {
        match self.handle.read()? {
            HandleState::Absent => Ok(None),
            HandleState::Corrupt(contents) => {
                warn!(
                    path = %self.handle.path().display(),
                    contents = %contents,
                    "removing unreadable process handle"
                );
                self.handle.remove()?;
                Ok(None)
            }
            HandleState::Recorded(handle) => {
                if self.signaller.probe(handle.process_id)? {
                    Ok(Some(handle))
                } else {
                    info!(pid = handle.process_id, "removing stale process handle");
                    self.handle.remove_if_owned_by(handle.process_id)?;
                    Ok(None)
                }
            }
        }
    }

    fn probe_quietly(&self, pid: u32) -> bool {
        self.signaller.probe(pid).unwrap_or_else(|e| {
            debug!(pid, error = %e, "liveness probe failed");
            false
        })
    }
}

/// Wait for the child in the background and drop its handle when it exits
fn spawn_reaper(mut child: Child, handle: PidFile) {
    let pid = child.id();
    let spawned = thread::Builder::new()
        .name(format!("reaper-{}", pid))
        .spawn(move || {
            match child.wait() {
                Ok(status) => info!(pid, %status, "server exited"),
                Err(e) => warn!(pid, error = %e, "failed to wait for server"),
            }
            if let Err(e) = handle.remove_if_owned_by(pid) {
                warn!(pid, error = %e, "failed to clean up process handle");
            }
        });

    if let Err(e) = spawned {
        // status() will clean the handle up once the process is gone
        warn!(pid, error = %e, "could not spawn reaper thread");
    }
}

#[cfg(unix)]
fn ensure_executable(path: &Path) -> BsmResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path).map_err(|e| BsmError::io("stat", path, e))?;
    let mut permissions = metadata.permissions();
    let mode = permissions.mode();
    if mode & 0o755 != 0o755 {
        permissions.set_mode(mode | 0o755);
        std::fs::set_permissions(path, permissions).map_err(|e| BsmError::PermissionDenied {
            path: path.to_path_buf(),
            reason: format!("cannot make server executable: {}", e),
        })?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_executable(_path: &Path) -> BsmResult<()> {
    Ok(())
}
