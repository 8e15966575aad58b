//! Rewrite command implementation.

use clap::Parser;
use courier_common_config::RewriteRuleConfig;
use courier_dispatch::RewriteEngine;

use crate::cli::{CommandContext, OutputFormat};
use crate::error::CliError;

/// Show how rewrite rules change a URL
#[derive(Debug, Parser)]
pub struct RewriteCommand {
    /// URL to rewrite
    pub url: String,

    /// Extra rule evaluated after the configured ones, as PATTERN=>REPLACEMENT
    #[arg(short, long = "rule", value_name = "PATTERN=>REPLACEMENT")]
    pub rules: Vec<String>,
}

/// Split `PATTERN=>REPLACEMENT`.
pub fn parse_rule(raw: &str) -> Result<RewriteRuleConfig, CliError> {
    match raw.split_once("=>") {
        Some((pattern, replacement)) if !pattern.is_empty() => {
            Ok(RewriteRuleConfig::new(pattern, replacement))
        }
        _ => Err(CliError::validation(
            format!("invalid rule {raw:?}, expected PATTERN=>REPLACEMENT"),
            "rule",
        )),
    }
}

impl RewriteCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let mut rules = ctx.config.rewrite.clone();
        for raw in &self.rules {
            rules.push(parse_rule(raw)?);
        }

        let engine = RewriteEngine::compile(&rules);
        let rewritten = engine.rewrite(&self.url);

        match ctx.format {
            OutputFormat::Text => println!("{rewritten}"),
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({
                    "url": self.url,
                    "rewritten": rewritten,
                    "changed": rewritten != self.url,
                    "rules": engine.len(),
                })
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rule() {
        let rule = parse_rule(r"^http://old\.com=>http://new.com").unwrap();
        assert_eq!(rule.pattern, r"^http://old\.com");
        assert_eq!(rule.replacement, "http://new.com");

        let empty_replacement = parse_rule("/tmp/=>").unwrap();
        assert_eq!(empty_replacement.replacement, "");

        assert!(parse_rule("no-arrow").is_err());
        assert!(parse_rule("=>x").is_err());
    }
}
