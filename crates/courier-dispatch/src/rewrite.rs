//! Regex-based URL rewriting.

use courier_common_config::RewriteRuleConfig;
use regex::Regex;
use tracing::{debug, warn};

/// A rule whose pattern failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("invalid rewrite pattern {pattern:?}: {source}")]
pub struct RewriteRuleError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// A compiled `pattern -> replacement` rule.
///
/// The replacement may reference capture groups (`$1`, `${name}`).
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: String,
}

impl RewriteRule {
    /// Compile a rule.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, RewriteRuleError> {
        let compiled = Regex::new(pattern).map_err(|source| RewriteRuleError {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern: compiled,
            replacement: replacement.into(),
        })
    }

    /// Source pattern.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Replacement template.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Apply the rule, replacing every match.
    pub fn apply(&self, url: &str) -> String {
        self.pattern
            .replace_all(url, self.replacement.as_str())
            .into_owned()
    }
}

/// Ordered rewrite rules. The first rule that changes a URL wins.
#[derive(Debug, Clone, Default)]
pub struct RewriteEngine {
    rules: Vec<RewriteRule>,
}

impl RewriteEngine {
    /// Engine with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile configured rules in order. Rules that fail to compile are
    /// logged and left out.
    pub fn compile<'a, I>(configs: I) -> Self
    where
        I: IntoIterator<Item = &'a RewriteRuleConfig>,
    {
        let mut engine = Self::new();
        for (index, config) in configs.into_iter().enumerate() {
            match RewriteRule::new(&config.pattern, config.replacement.clone()) {
                Ok(rule) => engine.rules.push(rule),
                Err(e) => warn!(rule = index, pattern = %config.pattern, error = %e, "skipping rewrite rule"),
            }
        }
        engine
    }

    /// Append a compiled rule.
    pub fn push(&mut self, rule: RewriteRule) {
        self.rules.push(rule);
    }

    /// Compiled rules in evaluation order.
    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rewrite `url`. Each rule is tried against the original URL; the
    /// first one producing a different string is returned. Without a
    /// change the URL comes back as is.
    pub fn rewrite(&self, url: &str) -> String {
        for rule in &self.rules {
            let rewritten = rule.apply(url);
            if rewritten != url {
                debug!(pattern = rule.pattern(), from = url, to = %rewritten, "rewrote url");
                return rewritten;
            }
        }
        url.to_string()
    }
}
