//! The in-memory, append-only sequence of signed blocks.

use ledger_core::{Block, Hash, SignedBlock, Transaction};
use thiserror::Error;

/// Errors that can occur on the ledger itself.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Genesis was never created. Indicates a misconfigured node.
    #[error("chain is empty: genesis block was never created")]
    EmptyChain,

    #[error("genesis block already exists")]
    GenesisExists,
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Ordered sequence of committed blocks, genesis at index 0.
///
/// The ledger performs no validation; callers validate before `append`
/// or `replace`.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    blocks: Vec<SignedBlock>,
}

impl Ledger {
    /// An empty ledger. Call [`Ledger::genesis`] before anything else.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and append the genesis block.
    pub fn genesis(&mut self) -> Result<SignedBlock> {
        if !self.blocks.is_empty() {
            return Err(LedgerError::GenesisExists);
        }
        let genesis = SignedBlock::genesis();
        self.blocks.push(genesis.clone());
        Ok(genesis)
    }

    /// The last committed block.
    pub fn tip(&self) -> Result<&SignedBlock> {
        self.blocks.last().ok_or(LedgerError::EmptyChain)
    }

    /// Canonical linkage hash of a block's data.
    pub fn hash(block: &Block) -> Hash {
        block.hash()
    }

    /// Add a block at the end.
    pub fn append(&mut self, block: SignedBlock) {
        self.blocks.push(block);
    }

    /// Swap in a whole new chain, discarding the current one.
    pub fn replace(&mut self, chain: Vec<SignedBlock>) {
        self.blocks = chain;
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if genesis has not been created yet.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All blocks in order.
    pub fn blocks(&self) -> &[SignedBlock] {
        &self.blocks
    }

    /// Every transaction recorded in the chain, oldest first.
    pub fn verified_transactions(&self) -> Vec<Transaction> {
        self.blocks
            .iter()
            .flat_map(|block| block.data.transactions.iter().cloned())
            .collect()
    }
}
