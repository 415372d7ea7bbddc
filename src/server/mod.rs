//! Server process management
//!
//! Starts, stops and inspects the dedicated server binary. The only state is
//! the handle file in the server directory (`server.pid`), so any number of
//! short-lived CLI invocations agree on whether the server runs.
//!
//! ## Module Structure
//!
//! - [`handle`]: the durable PID file
//! - [`signal`]: signal delivery and liveness probes
//! - [`supervisor`]: start/stop/status state machine

pub mod handle;
pub mod signal;
pub mod supervisor;

pub use handle::{HandleState, PidFile, ProcessHandle};
pub use signal::{ProcessSignaller, Signaller};
pub use supervisor::{ServerStatus, ServerSupervisor, StopOutcome, StopTiming};
