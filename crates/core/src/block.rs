//! Blocks and their signed envelope.

use crate::crypto::{verify_identity, CryptoError, Keypair};
use crate::hash::{canonical_hash, Hash};
use crate::transaction::Transaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// A batch of transactions plus linkage to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Zero-based position in the chain.
    pub index: u64,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Transactions drained from the pool, in submission order.
    pub transactions: Vec<Transaction>,
    /// Hex digest of the parent block's data, or `"1"` for genesis.
    pub previous_hash: String,
}

impl Block {
    /// Create a block stamped with the current time.
    pub fn new(index: u64, previous_hash: String, transactions: Vec<Transaction>) -> Self {
        Self {
            index,
            timestamp: Utc::now(),
            transactions,
            previous_hash,
        }
    }

    /// Create the genesis block.
    pub fn genesis() -> Self {
        Self::new(0, GENESIS_PREVIOUS_HASH.to_string(), Vec::new())
    }

    /// Canonical digest of this block. The value signed by miners and
    /// checked by validators.
    pub fn hash(&self) -> Hash {
        canonical_hash(self)
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }
}

/// A block plus proof of who produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlock {
    pub data: Block,
    /// Base64 signature over `data.hash()`; empty for genesis.
    pub signature: String,
    /// Identity of the signer; empty for genesis.
    pub signer_public_key: String,
}

impl SignedBlock {
    /// Wrap a genesis block. Genesis carries no signature.
    pub fn genesis() -> Self {
        Self {
            data: Block::genesis(),
            signature: String::new(),
            signer_public_key: String::new(),
        }
    }

    /// Sign `data` with `keypair`.
    pub fn sign(data: Block, keypair: &Keypair) -> Self {
        let signature = keypair.sign_hash(&data.hash()).to_base64();
        Self {
            data,
            signature,
            signer_public_key: keypair.identity(),
        }
    }

    /// Check the signature against the signer identity.
    pub fn verify_signature(&self) -> Result<(), CryptoError> {
        verify_identity(
            &self.signer_public_key,
            self.data.hash().as_bytes(),
            &self.signature,
        )
    }
}
