//! Ed25519 signing and verification keyed by identity strings.
//!
//! A node's identity is the standard base64 encoding of its 32-byte public
//! key. The encoding is canonical: one key has exactly one identity string,
//! so identities can be compared as plain strings and used as registry keys.

use crate::hash::Hash;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;
use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("identity is not valid base64")]
    MalformedIdentity,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("signature is not valid base64 or has the wrong length")]
    MalformedSignature,
    #[error("signature verification failed")]
    VerificationFailed,
}

/// A raw Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    /// Standard base64, the form carried in `SignedBlock::signature`.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Decode from standard base64.
    pub fn from_base64(s: &str) -> Result<Self, CryptoError> {
        let bytes = BASE64
            .decode(s)
            .map_err(|_| CryptoError::MalformedSignature)?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::MalformedSignature)?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &hex::encode(self.0)[..16])
    }
}

/// A public key for signature verification.
#[derive(Clone)]
pub struct PublicKey(pub VerifyingKey);

impl PublicKey {
    /// Parse a public key from its identity string.
    pub fn from_identity(identity: &str) -> Result<Self, CryptoError> {
        let bytes = BASE64
            .decode(identity)
            .map_err(|_| CryptoError::MalformedIdentity)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Self::from_bytes(&arr)
    }

    /// Parse a public key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        VerifyingKey::from_bytes(bytes)
            .map(PublicKey)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// The identity string for this key.
    pub fn identity(&self) -> String {
        BASE64.encode(self.0.as_bytes())
    }

    /// Get the raw bytes of the public key.
    pub fn as_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Verify a signature against this public key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        let sig = DalekSignature::from_bytes(&signature.0);
        self.0
            .verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0.as_bytes()[..8]))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes() == other.0.as_bytes()
    }
}

impl Eq for PublicKey {}

/// The node's signing key.
pub struct Keypair {
    signing_key: SigningKey,
    pub public_key: PublicKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            public_key: PublicKey(verifying_key),
        }
    }

    /// Rebuild a keypair from its 32-byte secret.
    pub fn from_private_key(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            public_key: PublicKey(verifying_key),
        }
    }

    /// Get the private key bytes.
    pub fn private_key(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// The identity string of this keypair's public key.
    pub fn identity(&self) -> String {
        self.public_key.identity()
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }

    /// Sign a digest directly.
    pub fn sign_hash(&self, hash: &Hash) -> Signature {
        self.sign(hash.as_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Verify a base64 signature made by `identity` over `message`.
///
/// Fails with a decode error when either string is malformed and with
/// `VerificationFailed` when the signature does not match.
pub fn verify_identity(identity: &str, message: &[u8], signature: &str) -> Result<(), CryptoError> {
    let signature = Signature::from_base64(signature)?;
    let public_key = PublicKey::from_identity(identity)?;
    public_key.verify(message, &signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash;

    #[test]
    fn test_sign_and_verify_by_identity() {
        let kp = Keypair::generate();
        let digest = hash(b"block data");
        let sig = kp.sign_hash(&digest).to_base64();

        assert!(verify_identity(&kp.identity(), digest.as_bytes(), &sig).is_ok());
    }

    #[test]
    fn test_wrong_message_fails() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"hello").to_base64();
        assert_eq!(
            verify_identity(&kp.identity(), b"world", &sig),
            Err(CryptoError::VerificationFailed)
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        let sig = kp1.sign(b"hello").to_base64();
        assert!(verify_identity(&kp2.identity(), b"hello", &sig).is_err());
    }

    #[test]
    fn test_identity_is_canonical() {
        let kp = Keypair::generate();
        let parsed = PublicKey::from_identity(&kp.identity()).unwrap();
        assert_eq!(parsed, kp.public_key);
        assert_eq!(parsed.identity(), kp.identity());
    }

    #[test]
    fn test_malformed_inputs_are_rejected() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"m").to_base64();

        assert_eq!(
            verify_identity("not base64!", b"m", &sig),
            Err(CryptoError::MalformedIdentity)
        );
        assert_eq!(
            verify_identity(&BASE64.encode([1u8; 5]), b"m", &sig),
            Err(CryptoError::InvalidPublicKey)
        );
        assert_eq!(
            verify_identity(&kp.identity(), b"m", "%%%"),
            Err(CryptoError::MalformedSignature)
        );
        assert_eq!(
            verify_identity(&kp.identity(), b"m", &BASE64.encode([0u8; 10])),
            Err(CryptoError::MalformedSignature)
        );
    }

    #[test]
    fn test_keypair_from_private_key() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::from_private_key(&kp1.private_key());
        assert_eq!(kp1.identity(), kp2.identity());
    }
}
