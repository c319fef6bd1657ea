//! Validator-signed consensus for the ledger.
//!
//! This crate provides:
//! - Whole-chain validation (linkage, signer rotation, authorization, signatures)
//! - Block proposing and the mining eligibility rules
//! - Longest-valid-chain resolution against peers
//!
//! # Example
//!
//! ```rust,no_run
//! use ledger_consensus::{BlockProposer, ChainValidator};
//! use ledger_core::{Keypair, NodeRecord, SignedBlock, ValidatorRegistry};
//! use ledger_storage::NodeRegistry;
//!
//! let keypair = Keypair::generate();
//! let registry = NodeRegistry::open_temporary().unwrap();
//! registry
//!     .upsert(&[NodeRecord::new("localhost:5000", keypair.identity(), true)])
//!     .unwrap();
//!
//! let genesis = SignedBlock::genesis();
//! let proposer = BlockProposer::new(keypair);
//! proposer.check_eligibility(&registry, &genesis).unwrap();
//!
//! let block = proposer.propose(1, genesis.data.hash().to_hex(), vec![proposer.reward()]);
//! assert!(ChainValidator::is_valid(&[genesis, block], &registry));
//! ```

pub mod proposer;
pub mod resolver;
pub mod validator;

// Re-export commonly used types
pub use proposer::{BlockProposer, MiningError};
pub use resolver::{
    ConsensusResolver, HttpPeerClient, PeerClient, PeerError, CHAIN_PATH, DEFAULT_PEER_TIMEOUT,
    NODES_PATH, REGISTER_PATH,
};
pub use validator::{ChainValidator, ValidationError};
