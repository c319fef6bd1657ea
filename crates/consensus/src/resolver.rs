//! Longest-valid-chain conflict resolution.
//!
//! Peers are asked for their full chain. The longest chain that is strictly
//! longer than ours and passes [`ChainValidator`] wins; ties keep the local
//! chain. A peer that fails, times out, or answers with garbage is skipped.

use crate::validator::ChainValidator;
use async_trait::async_trait;
use ledger_core::{NodeRecord, SignedBlock, ValidatorRegistry};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Path every node serves its chain on.
pub const CHAIN_PATH: &str = "/api/chain";

/// Path serving a node's registry.
pub const NODES_PATH: &str = "/api/nodes";

/// Path accepting `{url, public_key}` from nodes joining the network.
pub const REGISTER_PATH: &str = "/api/nodes/register";

/// Default bound on a single peer fetch.
pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors talking to a single peer. Never fatal to resolution.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("peer {address} unavailable: {reason}")]
    Unavailable { address: String, reason: String },

    #[error("peer {address} sent a malformed chain: {reason}")]
    Serialization { address: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Read-only access to peers' chains.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Fetch the full chain served by the peer at `address`.
    async fn fetch_chain(&self, address: &str) -> Result<Vec<SignedBlock>, PeerError>;
}

/// Fetches chains over HTTP with JSON bodies.
#[derive(Clone)]
pub struct HttpPeerClient {
    client: reqwest::Client,
}

impl HttpPeerClient {
    /// Create a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, PeerError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// `host:port` or a full base URL plus `path`.
    pub fn endpoint(address: &str, path: &str) -> String {
        let base = address.trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            format!("{base}{path}")
        } else {
            format!("http://{base}{path}")
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        address: &str,
        path: &str,
    ) -> Result<T, PeerError> {
        let unavailable = |reason: String| PeerError::Unavailable {
            address: address.to_string(),
            reason,
        };

        let response = self
            .client
            .get(Self::endpoint(address, path))
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| PeerError::Serialization {
            address: address.to_string(),
            reason: e.to_string(),
        })
    }

    /// Fetch the registry served by the peer at `address`.
    pub async fn fetch_nodes(&self, address: &str) -> Result<Vec<NodeRecord>, PeerError> {
        self.get_json(address, NODES_PATH).await
    }

    /// Ask the peer at `address` to record `node`. The peer decides the
    /// validator flag.
    pub async fn announce(&self, address: &str, node: &NodeRecord) -> Result<(), PeerError> {
        let response = self
            .client
            .post(Self::endpoint(address, REGISTER_PATH))
            .json(&serde_json::json!({ "url": node.url, "public_key": node.public_key }))
            .send()
            .await
            .map_err(|e| PeerError::Unavailable {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PeerError::Unavailable {
                address: address.to_string(),
                reason: format!("HTTP {status}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn fetch_chain(&self, address: &str) -> Result<Vec<SignedBlock>, PeerError> {
        self.get_json(address, CHAIN_PATH).await
    }
}

/// Picks the longest valid chain among peers.
pub struct ConsensusResolver<C> {
    client: C,
    timeout: Duration,
}

impl<C: PeerClient> ConsensusResolver<C> {
    pub fn new(client: C, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetch a peer's chain, bounded by the resolver timeout whatever the
    /// client does internally.
    async fn fetch(&self, address: &str) -> Result<Vec<SignedBlock>, PeerError> {
        match tokio::time::timeout(self.timeout, self.client.fetch_chain(address)).await {
            Ok(result) => result,
            Err(_) => Err(PeerError::Unavailable {
                address: address.to_string(),
                reason: format!("timed out after {:?}", self.timeout),
            }),
        }
    }

    /// Return the longest valid peer chain strictly longer than
    /// `local_length`, if any.
    pub async fn find_longest<R>(
        &self,
        peers: &[String],
        local_length: usize,
        registry: &R,
    ) -> Option<Vec<SignedBlock>>
    where
        R: ValidatorRegistry + ?Sized,
    {
        let mut best_length = local_length;
        let mut best = None;

        for address in peers {
            let chain = match self.fetch(address).await {
                Ok(chain) => chain,
                Err(err) => {
                    warn!(peer = %address, error = %err, "skipping peer");
                    continue;
                }
            };

            if chain.len() <= best_length {
                debug!(peer = %address, length = chain.len(), best_length, "peer chain not longer");
                continue;
            }

            match ChainValidator::validate(&chain, registry) {
                Ok(()) => {
                    info!(peer = %address, length = chain.len(), "found longer valid chain");
                    best_length = chain.len();
                    best = Some(chain);
                }
                Err(err) => {
                    warn!(peer = %address, error = %err, "discarding invalid peer chain");
                }
            }
        }

        best
    }
}
