//! Node assembly: key, registry, self-registration and the chain service.

use crate::config::NodeConfig;
use crate::keys;
use anyhow::{Context, Result};
use ledger_chain::Blockchain;
use ledger_consensus::{BlockProposer, ConsensusResolver, HttpPeerClient};
use ledger_core::{NodeRecord, RegistryError, ValidatorRegistry};
use ledger_storage::NodeRegistry;
use std::sync::Arc;
use tracing::info;

/// Record this node in the registry under `address`.
///
/// The first node ever registered becomes a validator. Any later node joins
/// as a non-validator; a node that is already known keeps its flag and only
/// has its address refreshed. Returns whether the node is a validator.
pub fn bootstrap<R>(registry: &R, identity: &str, address: &str) -> Result<bool, RegistryError>
where
    R: ValidatorRegistry + ?Sized,
{
    let is_validator = match registry.get(identity)? {
        Some(existing) => existing.is_validator,
        None => registry.list(false)?.is_empty(),
    };

    registry.upsert(&[NodeRecord::new(address, identity, is_validator)])?;
    info!(address, is_validator, "registered node");
    Ok(is_validator)
}

/// Copy the registry of the node at `peer` into `registry`.
///
/// Records are taken in the peer's order, so its first validator stays
/// first here too. Flags of nodes already known locally follow the peer.
pub async fn join<R>(registry: &R, client: &HttpPeerClient, peer: &str) -> Result<usize>
where
    R: ValidatorRegistry + ?Sized,
{
    let nodes = client.fetch_nodes(peer).await?;
    registry.upsert(&nodes)?;
    info!(peer, nodes = nodes.len(), "copied peer registry");
    Ok(nodes.len())
}

/// Open storage, load the key and build the chain service.
///
/// With `config.join` set, the peer's registry is copied before this node
/// registers itself, so the node joins as a non-validator, and the peer is
/// then told about the new node.
pub async fn start(config: &NodeConfig) -> Result<Arc<Blockchain>> {
    let keypair = keys::load_or_generate(&config.keys_dir()).context("failed to load node key")?;
    let identity = keypair.identity();

    let registry_path = config.registry_path();
    let registry = Arc::new(
        NodeRegistry::open(&registry_path)
            .with_context(|| format!("failed to open registry at {}", registry_path.display()))?,
    );
    let client = HttpPeerClient::new(config.peer_timeout)?;

    if let Some(peer) = &config.join {
        join(registry.as_ref(), &client, peer)
            .await
            .with_context(|| format!("failed to join {peer}"))?;
    }

    let is_validator = bootstrap(registry.as_ref(), &identity, &config.advertise)?;

    if let Some(peer) = &config.join {
        client
            .announce(peer, &NodeRecord::new(&config.advertise, &identity, is_validator))
            .await
            .with_context(|| format!("failed to announce this node to {peer}"))?;
    }

    let blockchain = Blockchain::new(
        BlockProposer::new(keypair),
        registry,
        ConsensusResolver::new(client, config.peer_timeout),
    )?;
    Ok(Arc::new(blockchain))
}
