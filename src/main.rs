use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use bsm::cli::{
    handle_backup_command, handle_config_command, handle_server_command, handle_world_command,
    BackupCommands, ConfigCommands, ServerCommands, WorldCommands,
};
use bsm::config::paths::DEFAULT_CONFIG_FILE;
use bsm::config::{ServerPaths, Settings};
use bsm::BsmError;

#[derive(Parser)]
#[command(
    name = "bsm",
    version,
    about = "Bedrock dedicated server manager",
    long_about = "bsm starts and stops a Minecraft Bedrock dedicated server, \
                  backs up its worlds as zip archives with a retention limit, \
                  and restores them interactively."
)]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, global = true, env = "BSM_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Server process commands
    #[command(subcommand)]
    Server(ServerCommands),

    /// Backup management commands
    #[command(subcommand)]
    Backup(BackupCommands),

    /// World management commands
    #[command(subcommand)]
    World(WorldCommands),

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Err(BsmError::Cancelled(what)) => {
            println!("{} cancelled", what);
            Ok(())
        }
        other => Ok(other?),
    }
}

fn run(cli: Cli) -> Result<(), BsmError> {
    match cli.command {
        Commands::Config(cmd) => handle_config_command(&cli.config, cmd),
        Commands::Server(cmd) => {
            let (_, paths) = load(&cli.config)?;
            handle_server_command(&paths, cmd)
        }
        Commands::Backup(cmd) => {
            let (settings, paths) = load(&cli.config)?;
            handle_backup_command(&paths, &settings, cmd)
        }
        Commands::World(cmd) => {
            let (_, paths) = load(&cli.config)?;
            handle_world_command(&paths, cmd)
        }
    }
}

fn load(config: &Path) -> Result<(Settings, ServerPaths), BsmError> {
    let settings = Settings::load_or_default(config)?;
    let paths = ServerPaths::from_settings(&settings);
    tracing::debug!(
        config = %config.display(),
        server = %paths.server_dir().display(),
        backups = %paths.backup_dir().display(),
        "configuration loaded"
    );
    Ok((settings, paths))
}

/// Log to stderr; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
