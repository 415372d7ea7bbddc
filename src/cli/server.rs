//! Server CLI commands
//!
//! Implements CLI commands for starting, stopping and inspecting the server.

use clap::Subcommand;

use crate::config::ServerPaths;
use crate::error::BsmResult;
use crate::server::{ServerStatus, ServerSupervisor, StopOutcome};

/// Server subcommands
#[derive(Subcommand)]
pub enum ServerCommands {
    /// Start the server in the background
    Start,

    /// Stop the server, escalating to SIGKILL after 30 seconds
    Stop,

    /// Show whether the server is running
    Status,
}

/// Handle a server command
pub fn handle_server_command(paths: &ServerPaths, cmd: ServerCommands) -> BsmResult<()> {
    let supervisor = ServerSupervisor::new(paths);

    match cmd {
        ServerCommands::Start => {
            let handle = supervisor.start()?;
            println!("Server started with PID {}", handle.process_id);
        }

        ServerCommands::Stop => {
            println!("Stopping server...");
            match supervisor.stop()? {
                StopOutcome::Graceful => println!("Server stopped."),
                StopOutcome::Forced => {
                    println!("Server did not stop in time and was killed.")
                }
            }
        }

        ServerCommands::Status => match supervisor.status()? {
            ServerStatus::Running { pid } => println!("Server is running (PID: {})", pid),
            ServerStatus::Stopped => println!("Server is stopped"),
        },
    }

    Ok(())
}
