use anyhow::{Context, Result};
use clap::Parser;
use matchload_config::{ConfigLoader, LogLevel, MatchloadConfig};
use matchload_logging::{init_logging_from_config, init_simple_tracing};
use std::path::Path;
use tracing::{debug, info, warn};

mod cli;
mod commands;

use cli::{Cli, Commands, ConfigCommands, RosterCommands};
use commands::{config, roster, run};

/// Load configuration from file or use defaults
fn load_config(config_path: Option<&Path>) -> Result<MatchloadConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if path.exists() {
                loader
                    .from_file(path)
                    .context(format!("Failed to load configuration from {:?}", path))
            } else {
                warn!("Configuration file not found: {:?}. Using defaults.", path);
                loader
                    .from_env()
                    .context("Failed to load configuration from environment")
            }
        }
        None => loader
            .from_env()
            .context("Failed to load configuration from environment"),
    }
}

/// Initialize logging from configuration with fallback to simple tracing
fn init_logging(config: Option<&MatchloadConfig>, log_level: Option<&str>) -> Result<()> {
    let Some(config) = config else {
        return init_simple_tracing(log_level);
    };

    // If CLI log level is provided, override config level
    let mut logging_config = config.logging.clone();
    if let Some(level) = log_level {
        match level.parse::<LogLevel>() {
            Ok(level) => logging_config.level = level,
            Err(e) => eprintln!("{}, keeping '{}'", e, logging_config.level),
        }
    }

    if let Err(e) = init_logging_from_config(&logging_config) {
        eprintln!(
            "Failed to initialize structured logging: {}, falling back to simple tracing",
            e
        );
        init_simple_tracing(Some(logging_config.level.as_str()))?;
    }
    debug!("Logging initialized");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first so logging can follow it
    let loaded = load_config(cli.config.as_deref());
    init_logging(loaded.as_ref().ok(), cli.log_level.as_deref())?;

    match cli.command {
        Commands::Run(args) => {
            info!("matchload {} starting", env!("CARGO_PKG_VERSION"));
            let code = run::execute(loaded?, &args).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Config { config_cmd } => match config_cmd {
            ConfigCommands::Validate { config_file } => {
                config::handle_config_validate(&config_file)?;
            }
            ConfigCommands::Generate { output, force } => {
                config::handle_config_generate(&output, force)?;
            }
            ConfigCommands::Show { format } => {
                config::handle_config_show(&loaded?, &format)?;
            }
        },
        Commands::Roster { roster_cmd } => match roster_cmd {
            RosterCommands::Check { path } => {
                let path = match path {
                    Some(path) => path,
                    None => loaded?.roster.path,
                };
                roster::handle_roster_check(&path)?;
            }
        },
    }

    Ok(())
}
