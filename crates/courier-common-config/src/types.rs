//! Configuration types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    /// Transport and header configuration.
    pub http: HttpSettings,
    /// Response cache configuration.
    pub cache: CacheConfig,
    /// Outbound request throttling.
    pub throttle: ThrottleConfig,
    /// Ordered URL rewrite rules.
    pub rewrite: Vec<RewriteRuleConfig>,
}

/// Transport settings and default request headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// User agent string.
    pub user_agent: String,
    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// Enable gzip decompression.
    pub gzip: bool,
    /// Headers sent with every request unless the caller overrides them.
    pub default_headers: HashMap<String, String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            user_agent: format!("courier/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
            gzip: true,
            default_headers: HashMap::new(),
        }
    }
}

impl HttpSettings {
    /// Connection timeout as a duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Request timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Response cache configuration.
///
/// Caching only activates when both `ttl_secs` and `max_size_bytes` are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds.
    pub ttl_secs: Option<u64>,
    /// Bodies must be strictly smaller than this to be cached.
    pub max_size_bytes: Option<usize>,
}

impl CacheConfig {
    /// Whether both settings required for caching are present.
    pub fn is_enabled(&self) -> bool {
        self.ttl_secs.is_some() && self.max_size_bytes.is_some()
    }

    /// TTL as a duration, if configured.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

/// Throttle configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Minimum spacing between dispatches in seconds. Zero disables throttling.
    pub interval_secs: f64,
}

impl ThrottleConfig {
    /// Interval as a duration. Negative or non-finite values count as zero;
    /// values too large for a `Duration` saturate at `Duration::MAX`.
    pub fn interval(&self) -> Duration {
        if self.interval_secs.is_finite() && self.interval_secs > 0.0 {
            Duration::try_from_secs_f64(self.interval_secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }
}

/// A single URL rewrite rule as written in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRuleConfig {
    /// Regular expression matched against the URL.
    pub pattern: String,
    /// Replacement text; may reference capture groups (`$1`, `${name}`).
    pub replacement: String,
}

impl RewriteRuleConfig {
    /// Create a rule.
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}
