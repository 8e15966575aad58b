//! Command implementations.

mod config;
mod fetch;
mod resolve;
mod rewrite;

pub use config::ConfigCommand;
pub use fetch::FetchCommand;
pub use resolve::ResolveCommand;
pub use rewrite::RewriteCommand;
