//! Resolve command implementation.

use clap::Parser;
use courier_dispatch::url::resolve;

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;

/// Resolve a reference against a base URL
#[derive(Debug, Parser)]
pub struct ResolveCommand {
    /// Base URL
    pub base: String,

    /// Relative or absolute reference
    pub reference: String,
}

impl ResolveCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let resolved = resolve(&self.base, &self.reference);

        match ctx.format {
            OutputFormat::Text => println!("{resolved}"),
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({
                    "base": self.base,
                    "reference": self.reference,
                    "resolved": resolved,
                })
            ),
        }
        Ok(())
    }
}
