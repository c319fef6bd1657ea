//! Persistent storage for the node.
//!
//! The ledger itself lives in memory; what must survive a restart is the
//! validator registry:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │      Consensus / mining / HTTP API       │
//! │     (via ledger_core::ValidatorRegistry) │
//! └────────────────────┬─────────────────────┘
//!                      │
//! ┌────────────────────▼─────────────────────┐
//! │  NodeRegistry          Storage (DB)      │
//! │   - identity → node     - sled wrapper   │
//! │   - validator flag      - bincode values │
//! │   - insertion order     - atomic batches │
//! └────────────────────┬─────────────────────┘
//!                      │
//! ┌────────────────────▼─────────────────────┐
//! │        sled (embedded key-value)         │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use ledger_core::{NodeRecord, ValidatorRegistry};
//! use ledger_storage::NodeRegistry;
//!
//! let registry = NodeRegistry::open("./data/registry").unwrap();
//! registry
//!     .upsert(&[NodeRecord::new("localhost:5000", "c2VsZg==", true)])
//!     .unwrap();
//! assert!(registry.is_validator("c2VsZg==").unwrap());
//! ```

pub mod db;
pub mod registry;

// Re-export commonly used types
pub use db::{Result, Storage, StorageError};
pub use registry::NodeRegistry;
