//! The validator registry seen from the ledger.
//!
//! The registry maps identities to network addresses and a validator flag.
//! Its backing store lives elsewhere (see `ledger-storage`); consensus code
//! only depends on this trait.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by a registry backend.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry backend error: {0}")]
    Backend(String),
}

/// One known node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Network address, `host:port`.
    pub url: String,
    /// Identity of the node.
    pub public_key: String,
    /// Whether the node may sign blocks.
    pub is_validator: bool,
}

impl NodeRecord {
    pub fn new(url: impl Into<String>, public_key: impl Into<String>, is_validator: bool) -> Self {
        Self {
            url: url.into(),
            public_key: public_key.into(),
            is_validator,
        }
    }
}

/// Durable identity -> node mapping.
pub trait ValidatorRegistry: Send + Sync {
    /// All known nodes, or only validators.
    fn list(&self, validators_only: bool) -> Result<Vec<NodeRecord>, RegistryError>;

    /// Insert or update records keyed by `public_key`.
    fn upsert(&self, records: &[NodeRecord]) -> Result<(), RegistryError>;

    /// Look up a single record.
    fn get(&self, public_key: &str) -> Result<Option<NodeRecord>, RegistryError> {
        Ok(self
            .list(false)?
            .into_iter()
            .find(|record| record.public_key == public_key))
    }

    /// Check whether `public_key` is currently a validator.
    fn is_validator(&self, public_key: &str) -> Result<bool, RegistryError> {
        Ok(self
            .get(public_key)?
            .map(|record| record.is_validator)
            .unwrap_or(false))
    }
}
