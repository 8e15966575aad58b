//! Response caching.
//!
//! A byte-oriented key-value store trait with an in-memory backend, and the
//! response cache that fingerprints requests and enforces the size bound.

pub mod memory;
pub mod response;
pub mod store;

pub use memory::MemoryStore;
pub use response::{fingerprint, CachePolicy, ResponseCache};
pub use store::{KeyValueStore, StoreError, StoreResult, StoreStats};
