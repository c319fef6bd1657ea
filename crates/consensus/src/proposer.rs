//! Block production for validators.
//!
//! Eligibility is signature based: a node may propose the next block when it
//! is a registered validator and did not sign the current tip. The same two
//! rules are enforced again by [`crate::ChainValidator`] when chains are
//! received from peers.

use ledger_core::{Block, Keypair, RegistryError, SignedBlock, Transaction, ValidatorRegistry};
use thiserror::Error;

/// Reasons a mining attempt is refused.
#[derive(Debug, Error)]
pub enum MiningError {
    #[error("cannot mine block since you are not a validator")]
    NotAValidator,

    #[error("cannot mine block since you mined the last block")]
    ConsecutiveMining,

    #[error("registry unavailable: {0}")]
    Registry(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, MiningError>;

/// Block proposer holding the node's signing key.
pub struct BlockProposer {
    keypair: Keypair,
}

impl BlockProposer {
    /// Create a new block proposer with the given keypair.
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// The proposer's identity.
    pub fn identity(&self) -> String {
        self.keypair.identity()
    }

    /// Check both eligibility rules against the current tip, in order.
    pub fn check_eligibility<R>(&self, registry: &R, tip: &SignedBlock) -> Result<()>
    where
        R: ValidatorRegistry + ?Sized,
    {
        let identity = self.identity();

        if !registry.is_validator(&identity)? {
            return Err(MiningError::NotAValidator);
        }

        if tip.signer_public_key == identity {
            return Err(MiningError::ConsecutiveMining);
        }

        Ok(())
    }

    /// The reward transaction paid to this proposer.
    pub fn reward(&self) -> Transaction {
        Transaction::reward(self.identity())
    }

    /// Build and sign a block at `index` on top of `previous_hash`.
    pub fn propose(
        &self,
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
    ) -> SignedBlock {
        let block = Block::new(index, previous_hash, transactions);
        SignedBlock::sign(block, &self.keypair)
    }
}
