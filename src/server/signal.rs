//! Signal delivery
//!
//! The supervisor only ever needs three things from the OS: ask a process to
//! exit, force it to exit, and check whether it still exists. They sit behind
//! [`Signaller`] so stop escalation can be exercised without real processes.

use crate::error::{BsmError, BsmResult};

/// Signal-delivery capability keyed by process id
pub trait Signaller: Send + Sync {
    /// Check whether `pid` refers to a live process without disturbing it
    fn probe(&self, pid: u32) -> BsmResult<bool>;

    /// Ask the process to shut down (SIGTERM)
    fn terminate(&self, pid: u32) -> BsmResult<()>;

    /// Force the process to exit (SIGKILL)
    fn kill(&self, pid: u32) -> BsmResult<()>;
}

/// Signaller backed by the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessSignaller;

#[cfg(unix)]
mod unix {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    use super::*;

    fn target(pid: u32, signal: &'static str) -> BsmResult<Pid> {
        // pid 0 and negatives address process groups, never a single server
        match i32::try_from(pid) {
            Ok(raw) if raw > 0 => Ok(Pid::from_raw(raw)),
            _ => Err(BsmError::SignalFailed {
                signal,
                pid,
                reason: "not a valid process id".into(),
            }),
        }
    }

    fn deliver(pid: u32, signal: Signal, name: &'static str) -> BsmResult<()> {
        match kill(target(pid, name)?, signal) {
            Ok(()) => {
                tracing::debug!(pid, signal = name, "signal delivered");
                Ok(())
            }
            // Already gone: nothing left to stop
            Err(Errno::ESRCH) => {
                tracing::debug!(pid, signal = name, "process already exited");
                Ok(())
            }
            Err(errno) => Err(BsmError::SignalFailed {
                signal: name,
                pid,
                reason: errno.desc().to_string(),
            }),
        }
    }

    impl Signaller for ProcessSignaller {
        fn probe(&self, pid: u32) -> BsmResult<bool> {
            let Ok(process) = target(pid, "probe") else {
                return Ok(false);
            };
            match kill(process, None) {
                Ok(()) => Ok(true),
                Err(Errno::ESRCH) => Ok(false),
                // Exists but belongs to someone else
                Err(Errno::EPERM) => Ok(true),
                Err(errno) => Err(BsmError::SignalFailed {
                    signal: "probe",
                    pid,
                    reason: errno.desc().to_string(),
                }),
            }
        }

        fn terminate(&self, pid: u32) -> BsmResult<()> {
            deliver(pid, Signal::SIGTERM, "SIGTERM")
        }

        fn kill(&self, pid: u32) -> BsmResult<()> {
            deliver(pid, Signal::SIGKILL, "SIGKILL")
        }
    }
}

#[cfg(not(unix))]
impl Signaller for ProcessSignaller {
    fn probe(&self, pid: u32) -> BsmResult<bool> {
        Err(unsupported("probe", pid))
    }

    fn terminate(&self, pid: u32) -> BsmResult<()> {
        Err(unsupported("SIGTERM", pid))
    }

    fn kill(&self, pid: u32) -> BsmResult<()> {
        Err(unsupported("SIGKILL", pid))
    }
}

#[cfg(not(unix))]
fn unsupported(signal: &'static str, pid: u32) -> BsmError {
    BsmError::SignalFailed {
        signal,
        pid,
        reason: "signals are only supported on unix platforms".into(),
    }
}
