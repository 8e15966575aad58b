//! Config command implementation.

use clap::{Parser, Subcommand};
use courier_common_config::{validate, ConfigLoader, CourierConfig};

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;

/// Manage configuration
#[derive(Debug, Parser)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print the path of the configuration file in use
    Path,

    /// Validate the configuration and report which features are active
    Validate,

    /// Write a default configuration file to the project directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        match &self.action {
            ConfigAction::Show => show(&ctx.config, ctx.format),
            ConfigAction::Path => {
                let path = match &ctx.config_path {
                    Some(path) => path.clone(),
                    None => ConfigLoader::default().config_path(),
                };
                println!("{}", path.display());
                Ok(())
            }
            ConfigAction::Validate => {
                validate(&ctx.config)?;
                println!("configuration is valid");
                println!(
                    "  cache: {}",
                    if ctx.config.cache.is_enabled() { "enabled" } else { "disabled" }
                );
                println!("  throttle: {:?}", ctx.config.throttle.interval());
                println!("  rewrite rules: {}", ctx.config.rewrite.len());
                Ok(())
            }
            ConfigAction::Init { force } => init(*force),
        }
    }
}

fn show(config: &CourierConfig, format: OutputFormat) -> Result<(), CliError> {
    let rendered = match format {
        OutputFormat::Text => serde_yaml::to_string(config).map_err(anyhow::Error::from)?,
        OutputFormat::Json => serde_json::to_string_pretty(config).map_err(anyhow::Error::from)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

fn init(force: bool) -> Result<(), CliError> {
    let loader = ConfigLoader::default();
    let path = loader.config_path();

    if path.exists() && !force {
        return Err(CliError::config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    loader.save(&CourierConfig::default())?;
    println!("wrote {}", path.display());
    Ok(())
}
