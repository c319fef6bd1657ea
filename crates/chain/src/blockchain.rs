//! The node service owning the ledger and transaction pool.
//!
//! Ledger and pool share one read-write lock. Mining holds the write lock
//! from reading the tip until the new block is appended, so two mining
//! attempts, a submission and a chain replacement can never interleave.
//! Peer chains are fetched without holding the lock; the swap re-checks
//! length under the write lock.

use crate::ledger::{Ledger, LedgerError};
use crate::mempool::TransactionPool;
use ledger_consensus::{
    BlockProposer, ChainValidator, ConsensusResolver, HttpPeerClient, MiningError, PeerClient,
    ValidationError,
};
use ledger_core::{RegistryError, SignedBlock, Transaction, ValidatorRegistry};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Mining(#[from] MiningError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, BlockchainError>;

/// State guarded by the node lock.
#[derive(Debug, Default)]
struct ChainState {
    ledger: Ledger,
    pool: TransactionPool,
}

/// A ledger node: chain, pending transactions, signing key, registry and
/// peer access.
pub struct Blockchain<C = HttpPeerClient> {
    state: RwLock<ChainState>,
    registry: Arc<dyn ValidatorRegistry>,
    proposer: BlockProposer,
    resolver: ConsensusResolver<C>,
}

impl<C: PeerClient> Blockchain<C> {
    /// Create a node and its genesis block.
    pub fn new(
        proposer: BlockProposer,
        registry: Arc<dyn ValidatorRegistry>,
        resolver: ConsensusResolver<C>,
    ) -> Result<Self> {
        let mut state = ChainState::default();
        state.ledger.genesis()?;

        Ok(Self {
            state: RwLock::new(state),
            registry,
            proposer,
            resolver,
        })
    }

    /// This node's identity.
    pub fn identity(&self) -> String {
        self.proposer.identity()
    }

    /// The validator registry this node consults.
    pub fn registry(&self) -> &Arc<dyn ValidatorRegistry> {
        &self.registry
    }

    /// Check whether this node is currently a validator.
    pub fn is_validator(&self) -> Result<bool> {
        Ok(self.registry.is_validator(&self.identity())?)
    }

    /// Add a transaction to the pool.
    ///
    /// Returns the index of the block the transaction is expected to land
    /// in. This is a hint only: a chain replacement may change it.
    pub async fn submit_transaction(&self, tx: Transaction) -> u64 {
        let mut state = self.state.write().await;
        state.pool.add(tx);
        state.ledger.len() as u64
    }

    /// Transactions waiting for the next block.
    pub async fn pending_transactions(&self) -> Vec<Transaction> {
        self.state.read().await.pool.pending()
    }

    /// Snapshot of the full chain.
    pub async fn chain(&self) -> Vec<SignedBlock> {
        self.state.read().await.ledger.blocks().to_vec()
    }

    /// Number of blocks, genesis included.
    pub async fn chain_length(&self) -> usize {
        self.state.read().await.ledger.len()
    }

    /// Every transaction recorded in the chain.
    pub async fn verified_transactions(&self) -> Vec<Transaction> {
        self.state.read().await.ledger.verified_transactions()
    }

    /// Validate the local chain against the current registry.
    pub async fn verify_chain(&self) -> std::result::Result<(), ValidationError> {
        let chain = self.chain().await;
        ChainValidator::validate(&chain, self.registry.as_ref())
    }

    /// Mine, sign and commit the next block.
    ///
    /// Eligibility is checked first; a refused attempt leaves pool and
    /// ledger untouched. On success the pool, including this node's reward,
    /// is drained into the new block.
    pub async fn mine(&self) -> Result<SignedBlock> {
        let mut state = self.state.write().await;

        let tip = state.ledger.tip()?;
        self.proposer
            .check_eligibility(self.registry.as_ref(), tip)?;
        let previous_hash = Ledger::hash(&tip.data).to_hex();

        state.pool.add(self.proposer.reward());
        let transactions = state.pool.drain();
        let index = state.ledger.len() as u64;

        let block = self.proposer.propose(index, previous_hash, transactions);
        state.ledger.append(block.clone());

        info!(
            index,
            transactions = block.data.transactions.len(),
            hash = %block.data.hash(),
            "mined block"
        );
        Ok(block)
    }

    /// Resolve against every validator in the registry except this node.
    pub async fn resolve(&self) -> Result<bool> {
        let identity = self.identity();
        let peers: Vec<String> = self
            .registry
            .list(true)?
            .into_iter()
            .filter(|node| node.public_key != identity)
            .map(|node| node.url)
            .collect();

        Ok(self.resolve_with(&peers).await)
    }

    /// Adopt the longest valid chain among `peers` if it is strictly longer
    /// than ours. Returns whether the local chain was replaced.
    pub async fn resolve_with(&self, peers: &[String]) -> bool {
        let local_length = self.chain_length().await;

        let Some(candidate) = self
            .resolver
            .find_longest(peers, local_length, self.registry.as_ref())
            .await
        else {
            return false;
        };

        let mut state = self.state.write().await;
        if candidate.len() <= state.ledger.len() {
            warn!(
                candidate = candidate.len(),
                local = state.ledger.len(),
                "local chain grew during resolution, keeping it"
            );
            return false;
        }

        info!(
            old_length = state.ledger.len(),
            new_length = candidate.len(),
            "replacing local chain"
        );
        state.ledger.replace(candidate);
        true
    }
}
