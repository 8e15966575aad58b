//! Dispatch errors.

use courier_common_http::{HttpError, ResponseError};

/// Errors surfaced by [`RequestDispatcher::dispatch`](crate::RequestDispatcher::dispatch).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The transport failed or produced an unparseable response. Never retried.
    #[error("transport error: {0}")]
    Transport(#[from] HttpError),

    /// An override produced, or was built from, a malformed response.
    #[error("override contract violation: {0}")]
    ContractViolation(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl DispatchError {
    pub(crate) fn contract(error: ResponseError) -> Self {
        DispatchError::ContractViolation(error.to_string())
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
