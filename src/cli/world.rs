//! World CLI commands

use clap::Subcommand;

use crate::config::ServerPaths;
use crate::display::format_world_list;
use crate::error::BsmResult;
use crate::server::ServerSupervisor;
use crate::worlds::WorldManager;

/// World subcommands
#[derive(Subcommand)]
pub enum WorldCommands {
    /// List installed worlds
    List,

    /// Make a world the one the server loads
    Switch {
        /// World directory name
        world: String,
    },
}

/// Handle a world command
pub fn handle_world_command(paths: &ServerPaths, cmd: WorldCommands) -> BsmResult<()> {
    let manager = WorldManager::new(paths.clone());

    match cmd {
        WorldCommands::List => {
            let worlds = manager.list_worlds()?;
            print!("{}", format_world_list(&worlds));
        }

        WorldCommands::Switch { world } => {
            let report = manager.switch_world(&world)?;
            println!("Active world is now '{}'", report.world);
            if ServerSupervisor::new(paths).is_running() {
                println!("Restart the server to load it.");
            }
        }
    }

    Ok(())
}
