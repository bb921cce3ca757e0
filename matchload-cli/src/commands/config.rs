//! `matchload config` subcommands

use super::output::{print_error, print_success};
use anyhow::{Context, Result};
use matchload_config::{ConfigLoader, MatchloadConfig};
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Handle configuration validation
pub fn handle_config_validate(config_file: &Path) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {:?}",
            config_file
        ));
    }

    match ConfigLoader::new().from_file(config_file) {
        Ok(_config) => {
            print_success("Configuration file is valid");
            info!("Configuration validation passed");
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Configuration validation failed: {}", e));
            error!("Configuration validation failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handle configuration generation
pub fn handle_config_generate(output: &Path, force: bool) -> Result<()> {
    info!("Generating sample configuration at: {:?}", output);

    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create output directory")?;
        }
    }

    fs::write(output, MatchloadConfig::generate_sample())
        .context("Failed to write configuration file")?;

    print_success(&format!("Sample configuration generated at: {:?}", output));
    println!(
        "Validate with: matchload config validate --config-file {:?}",
        output
    );
    Ok(())
}

/// Render the effective configuration
pub fn render_config(config: &MatchloadConfig, format: &str) -> Result<String> {
    match format.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::to_string(config).context("Failed to serialize to YAML"),
        "json" => serde_json::to_string_pretty(config).context("Failed to serialize to JSON"),
        _ => Err(anyhow::anyhow!(
            "Unknown output format: {}. Valid formats: yaml, json",
            format
        )),
    }
}

/// Handle configuration display
pub fn handle_config_show(config: &MatchloadConfig, format: &str) -> Result<()> {
    info!("Showing configuration (format: {})", format);
    println!("{}", render_config(config, format)?);
    Ok(())
}
