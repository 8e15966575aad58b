//! The transport seam between the dispatcher and the network.

use crate::client::HttpError;
use crate::request::RequestDescriptor;
use crate::response::RawResponse;
use async_trait::async_trait;
use std::sync::Arc;

/// Executes a fully prepared request and returns its raw head lines and body.
///
/// Implementations own timeouts, connection reuse and TLS. Errors are
/// surfaced to the caller unchanged and are never retried.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the unparsed response.
    async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse, HttpError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse, HttpError> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn execute(&self, request: &RequestDescriptor) -> Result<RawResponse, HttpError> {
        (**self).execute(request).await
    }
}
