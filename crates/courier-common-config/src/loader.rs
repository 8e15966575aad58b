//! Configuration file loading and parsing.

use crate::env::{vars, Environment};
use crate::types::CourierConfig;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

/// Relative location of the project config file.
pub const CONFIG_FILE: &str = ".courier/config.yaml";

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("env var pattern is valid")
    })
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the project config file.
    pub fn config_path(&self) -> PathBuf {
        self.base_path.join(CONFIG_FILE)
    }

    /// Load configuration from `.courier/config.yaml`.
    ///
    /// Returns defaults when the file does not exist. Environment overrides
    /// are applied after parsing and before validation.
    pub fn load(&self) -> Result<CourierConfig, ConfigError> {
        let config_path = self.config_path();

        let mut config = if config_path.exists() {
            self.parse_file(&config_path)?
        } else {
            CourierConfig::default()
        };

        apply_env_overrides(&mut config)?;
        validate(&config)?;
        Ok(config)
    }

    /// Load configuration from an explicit file path. The file must exist.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<CourierConfig, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let mut config = self.parse_file(path)?;
        apply_env_overrides(&mut config)?;
        validate(&config)?;
        Ok(config)
    }

    /// Load from `COURIER_CONFIG_PATH` when set, else from the project file.
    pub fn load_from_env(&self) -> Result<CourierConfig, ConfigError> {
        match Environment::get(vars::COURIER_CONFIG_PATH) {
            Some(path) => self.load_file(path),
            None => self.load(),
        }
    }

    fn parse_file(&self, path: &Path) -> Result<CourierConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        self.parse_str(&contents)
    }

    /// Parse YAML text after environment expansion.
    pub fn parse_str(&self, contents: &str) -> Result<CourierConfig, ConfigError> {
        let expanded = self.expand_env_vars(contents)?;

        serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();

        for cap in env_var_pattern().captures_iter(content) {
            let full_match = &cap[0];
            let var_name = &cap[1];
            let default = cap.get(2).map(|m| m.as_str());

            let value = match std::env::var(var_name) {
                Ok(v) => v,
                Err(_) => match default {
                    Some(d) => d.to_string(),
                    None => {
                        return Err(ConfigError::EnvVarNotFound {
                            var: var_name.to_string(),
                        })
                    }
                },
            };

            result = result.replace(full_match, &value);
        }

        Ok(result)
    }

    /// Save configuration to the project file.
    pub fn save(&self, config: &CourierConfig) -> Result<(), ConfigError> {
        let config_path = self.config_path();
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(config_path, yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

/// Apply `COURIER_*` environment overrides on top of file values.
pub fn apply_env_overrides(config: &mut CourierConfig) -> Result<(), ConfigError> {
    let invalid = |e: crate::env::EnvError| ConfigError::ValidationError {
        message: e.to_string(),
    };

    if let Some(secs) = Environment::get_parsed::<f64>(vars::COURIER_THROTTLE_SECS).map_err(invalid)? {
        config.throttle.interval_secs = secs;
    }
    if let Some(ttl) = Environment::get_parsed::<u64>(vars::COURIER_CACHE_TTL_SECS).map_err(invalid)? {
        config.cache.ttl_secs = Some(ttl);
    }
    if let Some(max) = Environment::get_parsed::<usize>(vars::COURIER_CACHE_MAX_BYTES).map_err(invalid)? {
        config.cache.max_size_bytes = Some(max);
    }
    if let Some(agent) = Environment::get(vars::COURIER_USER_AGENT) {
        config.http.user_agent = agent;
    }

    Ok(())
}

/// Validate configuration values.
///
/// Rewrite patterns are only checked for emptiness here; a pattern that
/// fails to compile is skipped with a warning when rules are loaded.
pub fn validate(config: &CourierConfig) -> Result<(), ConfigError> {
    if config.http.connect_timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            message: "http.connect_timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.http.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            message: "http.request_timeout_secs must be greater than 0".to_string(),
        });
    }

    let interval = config.throttle.interval_secs;
    if !interval.is_finite() || interval < 0.0 {
        return Err(ConfigError::ValidationError {
            message: "throttle.interval_secs must be a finite value >= 0".to_string(),
        });
    }

    if config.cache.ttl_secs == Some(0) {
        return Err(ConfigError::ValidationError {
            message: "cache.ttl_secs must be greater than 0".to_string(),
        });
    }

    if config.cache.max_size_bytes == Some(0) {
        return Err(ConfigError::ValidationError {
            message: "cache.max_size_bytes must be greater than 0".to_string(),
        });
    }

    for (index, rule) in config.rewrite.iter().enumerate() {
        if rule.pattern.is_empty() {
            return Err(ConfigError::ValidationError {
                message: format!("rewrite[{index}].pattern must not be empty"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RewriteRuleConfig;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn write_config(dir: &Path, contents: &str) {
        let courier_dir = dir.join(".courier");
        fs::create_dir_all(&courier_dir).unwrap();
        fs::write(courier_dir.join("config.yaml"), contents).unwrap();
    }

    #[test]
    fn test_load_defaults_when_no_file() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path());
        let config = loader.load().unwrap();
        assert_eq!(config.http.request_timeout_secs, 30);
        assert!(!config.cache.is_enabled());
        assert!(config.rewrite.is_empty());
    }

    #[test]
    fn test_load_config_from_yaml_file() {
        let dir = tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
http:
  request_timeout_secs: 5
  default_headers:
    accept: application/json
cache:
  ttl_secs: 60
  max_size_bytes: 4096
throttle:
  interval_secs: 0.25
rewrite:
  - pattern: "^http://old\\.example\\.com"
    replacement: "http://new.example.com"
"#,
        );

        let loader = ConfigLoader::new(dir.path());
        let config = loader.load().unwrap();

        assert_eq!(config.http.request_timeout_secs, 5);
        assert_eq!(
            config.http.default_headers.get("accept"),
            Some(&"application/json".to_string())
        );
        assert!(config.cache.is_enabled());
        assert_eq!(config.cache.max_size_bytes, Some(4096));
        assert_eq!(config.throttle.interval_secs, 0.25);
        assert_eq!(
            config.rewrite,
            vec![RewriteRuleConfig::new(
                r"^http://old\.example\.com",
                "http://new.example.com"
            )]
        );

        // Unspecified values keep their defaults
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert!(config.http.gzip);
    }

    #[test]
    fn test_load_file_missing() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path());
        let result = loader.load_file(dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_env_var_default() {
        let loader = ConfigLoader::new(".");
        let result = loader
            .expand_env_vars("key: ${COURIER_TEST_NONEXISTENT:-default}")
            .unwrap();
        assert_eq!(result, "key: default");
    }

    #[test]
    fn test_env_var_missing_error() {
        let loader = ConfigLoader::new(".");
        let result = loader.expand_env_vars("key: ${COURIER_TEST_MISSING_VAR}");
        match result.unwrap_err() {
            ConfigError::EnvVarNotFound { var } => assert_eq!(var, "COURIER_TEST_MISSING_VAR"),
            other => panic!("Expected EnvVarNotFound error, got {other:?}"),
        }
    }

    #[test]
    fn test_env_var_expansion_in_config() {
        std::env::set_var("COURIER_TEST_AGENT", "expanded-agent");

        let loader = ConfigLoader::new(".");
        let config = loader
            .parse_str(
                r#"
http:
  user_agent: ${COURIER_TEST_AGENT}
cache:
  ttl_secs: ${COURIER_TEST_TTL:-120}
"#,
            )
            .unwrap();

        assert_eq!(config.http.user_agent, "expanded-agent");
        assert_eq!(config.cache.ttl_secs, Some(120));

        std::env::remove_var("COURIER_TEST_AGENT");
    }

    #[test]
    fn test_validation_errors() {
        let mut config = CourierConfig::default();
        config.http.request_timeout_secs = 0;
        match validate(&config).unwrap_err() {
            ConfigError::ValidationError { message } => {
                assert!(message.contains("request_timeout_secs"))
            }
            other => panic!("Expected ValidationError, got {other:?}"),
        }

        let mut config = CourierConfig::default();
        config.throttle.interval_secs = -1.0;
        assert!(validate(&config).is_err());

        let mut config = CourierConfig::default();
        config.cache.max_size_bytes = Some(0);
        assert!(validate(&config).is_err());

        // Extreme but finite values are accepted and must stay usable
        let mut config = CourierConfig::default();
        config.throttle.interval_secs = 1e20;
        config.cache.ttl_secs = Some(u64::MAX);
        config.cache.max_size_bytes = Some(1024);
        assert!(validate(&config).is_ok());
        assert_eq!(config.throttle.interval(), Duration::MAX);

        let mut config = CourierConfig::default();
        config.rewrite.push(RewriteRuleConfig::new("", "x"));
        match validate(&config).unwrap_err() {
            ConfigError::ValidationError { message } => assert!(message.contains("rewrite[0]")),
            other => panic!("Expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_regex_is_not_a_validation_error() {
        let mut config = CourierConfig::default();
        config.rewrite.push(RewriteRuleConfig::new("([unclosed", "x"));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_parse_error_with_line_number() {
        let loader = ConfigLoader::new(".");
        let result = loader.parse_str(
            r#"
http:
  user_agent: courier
  default_headers: [unclosed
"#,
        );
        match result.unwrap_err() {
            ConfigError::ParseError { line, .. } => assert!(line.is_some()),
            other => panic!("Expected ParseError with line number, got {other:?}"),
        }
    }

    #[test]
    fn test_save_config() {
        let dir = tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path());

        let mut config = CourierConfig::default();
        config.throttle.interval_secs = 1.5;
        config.cache.ttl_secs = Some(30);

        loader.save(&config).unwrap();
        assert!(dir.path().join(".courier/config.yaml").exists());

        let loaded = loader.load().unwrap();
        assert_eq!(loaded.throttle.interval_secs, 1.5);
        assert_eq!(loaded.cache.ttl_secs, Some(30));
    }

    #[test]
    fn test_multiple_env_vars_in_single_value() {
        std::env::set_var("COURIER_TEST_PREFIX", "courier");
        std::env::set_var("COURIER_TEST_SUFFIX", "test");

        let loader = ConfigLoader::new(".");
        let result = loader
            .expand_env_vars("user_agent: ${COURIER_TEST_PREFIX}-${COURIER_TEST_SUFFIX}")
            .unwrap();
        assert_eq!(result, "user_agent: courier-test");

        std::env::remove_var("COURIER_TEST_PREFIX");
        std::env::remove_var("COURIER_TEST_SUFFIX");
    }
}
