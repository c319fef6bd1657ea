//! HTTP node for the validator-signed ledger.
//!
//! - [`config`]: command-line and environment settings
//! - [`keys`]: the node's signing key on disk
//! - [`node`]: registry bootstrap and service assembly
//! - [`api`]: the axum router

pub mod api;
pub mod config;
pub mod keys;
pub mod node;

pub use api::{router, ApiError};
pub use config::{Cli, NodeConfig};
