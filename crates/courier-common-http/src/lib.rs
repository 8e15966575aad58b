//! HTTP plumbing for Courier.
//!
//! Request and response value types, the raw status/header line parser,
//! the [`Transport`] trait and a reqwest-backed implementation.

pub mod client;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{build_client, HttpConfig, HttpError, ReqwestTransport};
pub use request::{headers, merge_headers, HeaderMap, Method, RequestDescriptor, UnknownMethod};
pub use response::{parse_response, RawResponse, Response, ResponseError};
pub use transport::Transport;
