//! Configuration types for Courier.
//!
//! This crate provides the configuration consumed by the dispatcher,
//! read from `.courier/config.yaml` files with `${VAR}` expansion and
//! `COURIER_*` environment overrides.

pub mod env;
pub mod loader;
pub mod types;


pub use env::*;
pub use loader::*;
pub use types::*;
