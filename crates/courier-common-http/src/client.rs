//! HTTP client configuration and the reqwest-backed transport.

use crate::request::{Method, RequestDescriptor};
use crate::response::{RawResponse, ResponseError};
use crate::transport::Transport;
use async_trait::async_trait;
use courier_common_config::HttpSettings;
use reqwest::{redirect, Client, ClientBuilder};
use std::time::Duration;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// Enable gzip decompression.
    pub gzip: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("courier/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
            gzip: true,
        }
    }
}

impl From<&HttpSettings> for HttpConfig {
    fn from(settings: &HttpSettings) -> Self {
        Self {
            connect_timeout: settings.connect_timeout(),
            request_timeout: settings.request_timeout(),
            user_agent: settings.user_agent.clone(),
            pool_max_idle_per_host: settings.pool_max_idle_per_host,
            gzip: settings.gzip,
        }
    }
}

/// Build a configured HTTP client. Redirects are never followed.
pub fn build_client(config: &HttpConfig) -> Result<Client, HttpError> {
    let mut builder = ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .redirect(redirect::Policy::none());

    if config.gzip {
        builder = builder.gzip(true);
    }

    builder.build().map_err(HttpError::ClientBuild)
}

/// HTTP errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("malformed response: {0}")]
    Response(#[from] ResponseError),
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            HttpError::Timeout
        } else {
            HttpError::Request(e)
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Head => reqwest::Method::HEAD,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

/// Transport backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
}

impl ReqwestTransport {
    /// Create a transport with the default config.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_config(&HttpConfig::default())
    }

    /// Create a transport with a custom config.
    pub fn with_config(config: &HttpConfig) -> Result<Self, HttpError> {
        let inner = build_client(config)?;
        Ok(Self { inner })
    }

    /// Create a transport from loaded settings.
    pub fn from_settings(settings: &HttpSettings) -> Result<Self, HttpError> {
        Self::with_config(&HttpConfig::from(settings))
    }

    /// Get the inner reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

/// Render a status line such as `HTTP/1.1 404 Not Found`.
fn status_line(version: reqwest::Version, status: reqwest::StatusCode) -> String {
    let line = format!(
        "{:?} {} {}",
        version,
        status.as_str(),
        status.canonical_reason().unwrap_or("")
    );
    line.trim_end().to_string()
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse, HttpError> {
        tracing::debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self.inner.request(request.method.into(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(payload) = &request.payload {
            builder = builder.body(payload.clone());
        }

        let response = builder.send().await?;

        let mut lines = Vec::with_capacity(response.headers().len() + 1);
        lines.push(status_line(response.version(), response.status()));
        for (name, value) in response.headers() {
            lines.push(format!(
                "{}: {}",
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes())
            ));
        }

        let body = response.bytes().await?;
        tracing::debug!(url = %request.url, bytes = body.len(), "response received");

        Ok(RawResponse { lines, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("courier/"));
        assert_eq!(config.pool_max_idle_per_host, 10);
        assert!(config.gzip);
    }

    #[test]
    fn test_config_from_settings() {
        let settings = HttpSettings {
            connect_timeout_secs: 3,
            request_timeout_secs: 7,
            user_agent: "agent/1".to_string(),
            pool_max_idle_per_host: 2,
            gzip: false,
            ..HttpSettings::default()
        };

        let config = HttpConfig::from(&settings);
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.request_timeout, Duration::from_secs(7));
        assert_eq!(config.user_agent, "agent/1");
        assert_eq!(config.pool_max_idle_per_host, 2);
        assert!(!config.gzip);
    }

    #[test]
    fn test_transport_creation() {
        assert!(ReqwestTransport::new().is_ok());
        assert!(ReqwestTransport::from_settings(&HttpSettings::default()).is_ok());
    }

    #[test]
    fn test_status_line_rendering() {
        assert_eq!(
            status_line(reqwest::Version::HTTP_11, reqwest::StatusCode::NOT_FOUND),
            "HTTP/1.1 404 Not Found"
        );
        assert_eq!(
            status_line(reqwest::Version::HTTP_2, reqwest::StatusCode::OK),
            "HTTP/2.0 200 OK"
        );
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(reqwest::Method::from(Method::Patch), reqwest::Method::PATCH);
        assert_eq!(reqwest::Method::from(Method::Options), reqwest::Method::OPTIONS);
    }
}
