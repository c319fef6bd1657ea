//! Ledger orchestration.
//!
//! This crate brings together all components of a node:
//! - **Ledger**: the append-only, in-memory chain of signed blocks
//! - **Mempool**: transactions waiting for the next block
//! - **Blockchain**: the lock-guarded service that mines and resolves
//!
//! # Example
//!
//! ```rust,no_run
//! use ledger_chain::Blockchain;
//! use ledger_consensus::{BlockProposer, ConsensusResolver, HttpPeerClient, DEFAULT_PEER_TIMEOUT};
//! use ledger_core::{Keypair, NodeRecord, Transaction, ValidatorRegistry};
//! use ledger_storage::NodeRegistry;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let keypair = Keypair::generate();
//! let registry = Arc::new(NodeRegistry::open("./data/registry")?);
//! registry.upsert(&[NodeRecord::new("localhost:5000", keypair.identity(), true)])?;
//!
//! let resolver = ConsensusResolver::new(HttpPeerClient::new(DEFAULT_PEER_TIMEOUT)?, DEFAULT_PEER_TIMEOUT);
//! let blockchain = Blockchain::new(BlockProposer::new(keypair), registry, resolver)?;
//!
//! blockchain.submit_transaction(Transaction::new("alice", "bob", 10)).await;
//! let block = blockchain.mine().await?;
//! assert_eq!(block.data.index, 1);
//! # Ok(())
//! # }
//! ```

pub mod blockchain;
pub mod ledger;
pub mod mempool;

// Re-export commonly used types
pub use blockchain::{Blockchain, BlockchainError};
pub use ledger::{Ledger, LedgerError};
pub use mempool::TransactionPool;
