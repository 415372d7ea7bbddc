//! Config CLI commands

use std::path::Path;

use clap::Subcommand;

use crate::config::{ServerPaths, Settings};
use crate::error::{BsmError, BsmResult};

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a commented default config file
    Init,

    /// Show the effective configuration and resolved paths
    Show,
}

/// Handle a config command
pub fn handle_config_command(config_path: &Path, cmd: ConfigCommands) -> BsmResult<()> {
    match cmd {
        ConfigCommands::Init => {
            if Settings::write_template(config_path)? {
                println!("Wrote default configuration to {}", config_path.display());
            } else {
                println!(
                    "Configuration already exists at {}; leaving it untouched.",
                    config_path.display()
                );
            }
        }

        ConfigCommands::Show => {
            let settings = Settings::load_or_default(config_path)?;
            let paths = ServerPaths::from_settings(&settings);

            println!("Config file:  {}", config_path.display());
            if !config_path.exists() {
                println!("              (not found, using defaults)");
            }
            println!();
            let rendered = serde_yaml::to_string(&settings)
                .map_err(|e| BsmError::Config(format!("Failed to render settings: {}", e)))?;
            print!("{}", rendered);
            println!();
            println!("Resolved paths:");
            println!("  Executable:   {}", paths.executable().display());
            println!("  Handle file:  {}", paths.pid_file().display());
            println!("  Worlds:       {}", paths.worlds_dir().display());
            println!("  Backups:      {}", paths.backup_dir().display());
        }
    }

    Ok(())
}
