//! Whole-chain validation.
//!
//! A chain is acceptable when every block after genesis links to its parent
//! by hash, is signed by a registered validator, and was not signed by the
//! same validator as its parent.

use ledger_core::{CryptoError, RegistryError, SignedBlock, ValidatorRegistry};
use thiserror::Error;

/// Reasons a candidate chain is rejected. `position` is the offending
/// block's offset in the chain.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("block {position}: previous_hash does not match the parent block")]
    BrokenLink { position: usize },

    #[error("block {position}: signer also signed the parent block")]
    ConsecutiveSigner { position: usize },

    #[error("block {position}: signer is not a registered validator")]
    UnauthorizedSigner { position: usize },

    #[error("block {position}: malformed signer credentials: {source}")]
    MalformedCredentials {
        position: usize,
        source: CryptoError,
    },

    #[error("block {position}: signature verification failed")]
    InvalidSignature { position: usize },

    #[error("registry unavailable: {0}")]
    Registry(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Chain validator.
pub struct ChainValidator;

impl ChainValidator {
    /// Validate a full chain, returning the first violated rule.
    ///
    /// The genesis block is taken as given. Empty and genesis-only chains
    /// are valid.
    pub fn validate<R>(chain: &[SignedBlock], registry: &R) -> Result<()>
    where
        R: ValidatorRegistry + ?Sized,
    {
        let Some(mut last) = chain.first() else {
            return Ok(());
        };

        for (position, block) in chain.iter().enumerate().skip(1) {
            Self::validate_link(last, block, position, registry)?;
            last = block;
        }

        Ok(())
    }

    /// Check whether a chain passes [`ChainValidator::validate`].
    pub fn is_valid<R>(chain: &[SignedBlock], registry: &R) -> bool
    where
        R: ValidatorRegistry + ?Sized,
    {
        Self::validate(chain, registry).is_ok()
    }

    fn validate_link<R>(
        last: &SignedBlock,
        block: &SignedBlock,
        position: usize,
        registry: &R,
    ) -> Result<()>
    where
        R: ValidatorRegistry + ?Sized,
    {
        if block.data.previous_hash != last.data.hash().to_hex() {
            return Err(ValidationError::BrokenLink { position });
        }

        if block.signer_public_key == last.signer_public_key {
            return Err(ValidationError::ConsecutiveSigner { position });
        }

        if !registry.is_validator(&block.signer_public_key)? {
            return Err(ValidationError::UnauthorizedSigner { position });
        }

        block.verify_signature().map_err(|err| match err {
            CryptoError::VerificationFailed => ValidationError::InvalidSignature { position },
            source => ValidationError::MalformedCredentials { position, source },
        })
    }
}
