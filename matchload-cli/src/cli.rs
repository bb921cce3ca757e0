//! CLI argument parsing definitions

use clap::{Args, Parser, Subcommand};
use matchload_config::{parse_duration_value, MatchloadConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "matchload", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a load test against the matching service
    Run(RunArgs),

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },

    /// Identity roster commands
    Roster {
        #[command(subcommand)]
        roster_cmd: RosterCommands,
    },
}

/// Overrides applied on top of the loaded configuration
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Base URL of the matching service
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Number of concurrent virtual users
    #[arg(long, value_name = "COUNT")]
    pub vus: Option<usize>,

    /// Ramp-up stage duration (e.g. 30s)
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_value)]
    pub ramp_up: Option<Duration>,

    /// Steady stage duration (e.g. 5m)
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_value)]
    pub duration: Option<Duration>,

    /// Ramp-down stage duration (e.g. 30s)
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_value)]
    pub ramp_down: Option<Duration>,

    /// Identity roster file
    #[arg(long, value_name = "PATH")]
    pub roster: Option<PathBuf>,

    /// Write the run summary as JSON to this file
    #[arg(long, value_name = "PATH")]
    pub summary_export: Option<PathBuf>,
}

impl RunArgs {
    pub fn apply(&self, config: &mut MatchloadConfig) {
        if let Some(base_url) = &self.base_url {
            config.target.base_url = base_url.clone();
        }
        if let Some(vus) = self.vus {
            config.load.population = vus;
        }
        if let Some(ramp_up) = self.ramp_up {
            config.load.ramp_up = ramp_up;
        }
        if let Some(steady) = self.duration {
            config.load.steady = steady;
        }
        if let Some(ramp_down) = self.ramp_down {
            config.load.ramp_down = ramp_down;
        }
        if let Some(path) = &self.roster {
            config.roster.path = path.clone();
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration in use
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum RosterCommands {
    /// Validate a roster file and report its gender split
    Check {
        /// Roster file (defaults to the configured roster path)
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "matchload",
            "--log-level",
            "debug",
            "run",
            "--vus",
            "50",
            "--ramp-up",
            "10s",
            "--duration",
            "0.5",
            "--base-url",
            "http://matching:8080",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };

        let mut config = MatchloadConfig::default();
        args.apply(&mut config);
        assert_eq!(config.load.population, 50);
        assert_eq!(config.load.ramp_up, Duration::from_secs(10));
        assert_eq!(config.load.steady, Duration::from_millis(500));
        assert_eq!(config.target.base_url, "http://matching:8080");
        // Untouched values keep their defaults
        assert_eq!(config.load.ramp_down, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let result = Cli::try_parse_from(["matchload", "run", "--ramp-up", "soon"]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(["matchload", "run", "--duration", "1e30"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli =
            Cli::try_parse_from(["matchload", "roster", "check", "--config", "load.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("load.yaml")));
        assert!(matches!(
            cli.command,
            Commands::Roster {
                roster_cmd: RosterCommands::Check { path: None }
            }
        ));
    }
}
