//! Courier CLI.
//!
//! Main entry point for the `courier` binary.

use std::process::ExitCode;

use clap::Parser;
use courier_common_config::{vars, Environment};
use courier_common_log::{LogConfig, LogLevel};
use tracing::error;

mod cli;
mod commands;
mod error;

use cli::Cli;
use error::CliError;

/// Application exit codes
#[repr(u8)]
pub enum Exit {
    Success = 0,
    GeneralError = 1,
    ConfigError = 2,
    IoError = 3,
    NetworkError = 4,
    ValidationError = 5,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // .env files are optional
    let _ = Environment::init();

    init_tracing(&cli);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            return Exit::GeneralError.into();
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => Exit::Success.into(),
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            if let Some(detail) = e.detail() {
                eprintln!("  {detail}");
            }
            e.exit().into()
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.load_config()?;
    cli.execute(config).await
}

/// `-v`/`-q` win over `COURIER_LOG_LEVEL`; without either the CLI stays at `warn`.
fn init_tracing(cli: &Cli) {
    let mut config = LogConfig::from_env();
    if cli.verbose > 0 || cli.quiet || std::env::var_os(vars::COURIER_LOG_LEVEL).is_none() {
        config.level = LogLevel::from_verbosity(cli.verbose, cli.quiet);
    }

    if let Err(e) = courier_common_log::init(config) {
        eprintln!("warning: {e}");
    }
}
