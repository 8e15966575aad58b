//! Injectable response overrides.
//!
//! When a dispatcher has an override, every request is answered by it and
//! nothing else runs: no cache, no rewrite, no throttle, no transport.

use crate::error::{DispatchError, DispatchResult};
use async_trait::async_trait;
use bytes::Bytes;
use courier_common_http::{RequestDescriptor, Response};

/// Answers requests in place of the network.
///
/// The returned response must have a status in 100-599 and lower-case
/// header names, otherwise the dispatch fails with a contract violation.
#[async_trait]
pub trait ResponseOverride: Send + Sync {
    async fn respond(&self, request: &RequestDescriptor) -> Response;
}

/// Answers every request with the same response.
#[derive(Debug, Clone)]
pub struct StaticOverride {
    response: Response,
}

impl StaticOverride {
    /// Build a fixture. Fails if the response would be malformed.
    pub fn new<I, K, V>(status: u16, headers: I, body: impl Into<Bytes>) -> DispatchResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::from_response(Response::new(status, headers, body))
    }

    /// Wrap an existing response after validating it.
    pub fn from_response(response: Response) -> DispatchResult<Self> {
        response.validate().map_err(DispatchError::contract)?;
        Ok(Self { response })
    }
}

#[async_trait]
impl ResponseOverride for StaticOverride {
    async fn respond(&self, _request: &RequestDescriptor) -> Response {
        self.response.clone()
    }
}

/// Adapts a closure into an override.
pub struct FnOverride<F> {
    respond: F,
}

impl<F> FnOverride<F>
where
    F: Fn(&RequestDescriptor) -> Response + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self { respond }
    }
}

#[async_trait]
impl<F> ResponseOverride for FnOverride<F>
where
    F: Fn(&RequestDescriptor) -> Response + Send + Sync,
{
    async fn respond(&self, request: &RequestDescriptor) -> Response {
        (self.respond)(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_override_rejects_bad_status() {
        let err = StaticOverride::new(42, Vec::<(String, String)>::new(), "").unwrap_err();
        assert!(matches!(err, DispatchError::ContractViolation(_)));

        let err = StaticOverride::new(600, Vec::<(String, String)>::new(), "").unwrap_err();
        assert!(err.to_string().contains("600"));
    }

    #[tokio::test]
    async fn test_static_override_answers() {
        let fixture = StaticOverride::new(418, [("X-Teapot", "yes")], "short and stout").unwrap();
        let response = fixture.respond(&RequestDescriptor::get("http://a/")).await;
        assert_eq!(response.status(), 418);
        assert_eq!(response.header("x-teapot"), Some("yes"));
    }

    #[tokio::test]
    async fn test_fn_override_sees_request() {
        let echo = FnOverride::new(|request: &RequestDescriptor| {
            Response::new(200, Vec::<(String, String)>::new(), request.url.clone())
        });
        let response = echo.respond(&RequestDescriptor::get("http://a/echo")).await;
        assert_eq!(response.text(), "http://a/echo");
    }
}
