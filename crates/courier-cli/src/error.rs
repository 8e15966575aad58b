//! CLI error handling.

use courier_common_config::ConfigError;
use courier_dispatch::DispatchError;
use thiserror::Error;

use crate::Exit;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{message}")]
    Config {
        message: String,
        #[source]
        source: Option<ConfigError>,
    },

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Network {
        message: String,
        url: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Exit code for this error
    pub fn exit(&self) -> Exit {
        match self {
            Self::Config { .. } => Exit::ConfigError,
            Self::Io { .. } => Exit::IoError,
            Self::Network { .. } => Exit::NetworkError,
            Self::Validation { .. } => Exit::ValidationError,
            Self::Other(_) => Exit::GeneralError,
        }
    }

    /// Extra context worth printing under the message
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Network { url: Some(url), .. } => Some(format!("url: {url}")),
            Self::Validation { field: Some(field), .. } => Some(format!("argument: {field}")),
            _ => None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Wrap a dispatch failure for `url`.
    pub fn dispatch(url: &str, error: DispatchError) -> Self {
        match error {
            DispatchError::Transport(e) => Self::Network {
                message: format!("request to {url} failed: {e}"),
                url: Some(url.to_string()),
                source: Some(Box::new(e)),
            },
            DispatchError::ContractViolation(message) | DispatchError::InvalidRequest(message) => {
                Self::Validation {
                    message,
                    field: None,
                }
            }
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        Self::Config {
            message: format!("configuration error: {error}"),
            source: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_common_http::HttpError;

    fn code(error: &CliError) -> u8 {
        error.exit() as u8
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(code(&CliError::config("bad")), 2);
        assert_eq!(
            code(&CliError::io("disk", std::io::Error::other("full"))),
            3
        );
        assert_eq!(code(&CliError::validation("bad header", "header")), 5);
        assert_eq!(code(&CliError::Other(anyhow::anyhow!("boom"))), 1);
    }

    #[test]
    fn test_dispatch_errors_map_to_network_and_validation() {
        let network = CliError::dispatch("http://a/", DispatchError::Transport(HttpError::Timeout));
        assert_eq!(code(&network), 4);
        assert!(network.to_string().contains("http://a/"));
        assert_eq!(network.detail().as_deref(), Some("url: http://a/"));

        let contract = CliError::dispatch(
            "http://a/",
            DispatchError::ContractViolation("status 42".to_string()),
        );
        assert_eq!(code(&contract), 5);
    }

    #[test]
    fn test_config_error_conversion() {
        let error: CliError = ConfigError::ValidationError {
            message: "throttle.interval_secs must be >= 0".to_string(),
        }
        .into();
        assert_eq!(code(&error), 2);
        assert!(error.to_string().contains("throttle"));
    }
}
