//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};
use courier_common_config::{vars, ConfigLoader, CourierConfig};

use crate::commands::{ConfigCommand, FetchCommand, ResolveCommand, RewriteCommand};
use crate::error::CliError;

/// Courier - resilient HTTP request dispatcher
///
/// Fetch URLs through the rewrite, cache and throttle pipeline, or inspect
/// how URLs resolve and rewrite.
#[derive(Debug, Parser)]
#[command(
    name = "courier",
    author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        env = vars::COURIER_CONFIG_PATH,
        value_hint = ValueHint::FilePath
    )]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Dispatch a request and print the response
    #[command(visible_alias = "get")]
    Fetch(FetchCommand),

    /// Resolve a reference against a base URL
    Resolve(ResolveCommand),

    /// Show how the configured rewrite rules change a URL
    Rewrite(RewriteCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

impl Cli {
    /// Load configuration from the given file or the project directory
    pub fn load_config(&self) -> Result<CourierConfig, CliError> {
        let loader = ConfigLoader::default();
        let config = match &self.config {
            Some(path) => loader.load_file(path)?,
            None => loader.load()?,
        };
        Ok(config)
    }

    /// Execute the selected command
    pub async fn execute(self, config: CourierConfig) -> Result<(), CliError> {
        let ctx = CommandContext {
            config,
            config_path: self.config,
            format: self.format,
        };

        match self.command {
            Command::Fetch(cmd) => cmd.execute(&ctx).await,
            Command::Resolve(cmd) => cmd.execute(&ctx),
            Command::Rewrite(cmd) => cmd.execute(&ctx),
            Command::Config(cmd) => cmd.execute(&ctx),
        }
    }
}

/// Context passed to all commands
#[derive(Debug)]
pub struct CommandContext {
    pub config: CourierConfig,
    pub config_path: Option<PathBuf>,
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::try_parse_from([
            "courier",
            "-vv",
            "fetch",
            "http://example.com/",
            "-X",
            "post",
            "-d",
            "a=1",
            "-H",
            "Accept: text/html",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Fetch(cmd) => {
                assert_eq!(cmd.url, "http://example.com/");
                assert_eq!(cmd.method, "post");
                assert_eq!(cmd.data.as_deref(), Some("a=1"));
                assert_eq!(cmd.headers, vec!["Accept: text/html".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_resolve_with_json() {
        let cli =
            Cli::try_parse_from(["courier", "--format", "json", "resolve", "http://a/b/c", "../d"])
                .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Command::Resolve(_)));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["courier", "-q", "-v", "resolve", "a", "b"]).is_err());
    }
}
