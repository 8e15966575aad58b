//! Resilient HTTP request dispatching.
//!
//! [`RequestDispatcher`] takes a request through an optional response
//! override, a fingerprint-keyed response cache, ordered URL rewrite rules
//! and a throttle gate before handing it to a [`Transport`]. The URL
//! resolver used for relative requests lives in [`url`].
//!
//! ```no_run
//! use courier_common_http::ReqwestTransport;
//! use courier_dispatch::RequestDispatcher;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = RequestDispatcher::builder(ReqwestTransport::new()?)
//!     .cache(Duration::from_secs(300), 64 * 1024)
//!     .throttle(Duration::from_millis(200))
//!     .build();
//!
//! let response = dispatcher.get("https://example.com/").await?;
//! println!("{} {}", response.status(), response.text());
//! # Ok(())
//! # }
//! ```
//!
//! [`Transport`]: courier_common_http::Transport

pub mod cache;
pub mod dispatcher;
pub mod error;
pub mod overrides;
pub mod rewrite;
pub mod throttle;
pub mod url;

#[cfg(test)]
mod testing;

pub use cache::{
    fingerprint, CachePolicy, KeyValueStore, MemoryStore, ResponseCache, StoreError, StoreStats,
};
pub use dispatcher::{DispatcherBuilder, RequestDispatcher};
pub use error::{DispatchError, DispatchResult};
pub use overrides::{FnOverride, ResponseOverride, StaticOverride};
pub use rewrite::{RewriteEngine, RewriteRule, RewriteRuleError};
pub use throttle::ThrottleGate;
pub use url::{resolve, UrlParts, UrlResolver};
