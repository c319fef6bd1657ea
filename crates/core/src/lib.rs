//! Core ledger primitives.
//!
//! This crate provides the fundamental types used throughout the node:
//! - Canonical hashing of ledger data
//! - Ed25519 signing keyed by base64 identity strings
//! - Transactions, blocks and signed blocks
//! - The validator registry interface

pub mod block;
pub mod crypto;
pub mod hash;
pub mod registry;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{Block, SignedBlock, GENESIS_PREVIOUS_HASH};
pub use crypto::{verify_identity, CryptoError, Keypair, PublicKey, Signature};
pub use hash::{canonical_hash, hash, Hash, H256};
pub use registry::{NodeRecord, RegistryError, ValidatorRegistry};
pub use transaction::{Transaction, MINING_REWARD, REWARD_SENDER};
