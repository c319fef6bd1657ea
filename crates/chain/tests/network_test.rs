//! Multi-node scenarios over an in-process peer network.

use async_trait::async_trait;
use ledger_chain::{Blockchain, BlockchainError};
use ledger_consensus::{
    BlockProposer, ChainValidator, ConsensusResolver, MiningError, PeerClient, PeerError,
    DEFAULT_PEER_TIMEOUT,
};
use ledger_core::{Keypair, NodeRecord, SignedBlock, Transaction, ValidatorRegistry};
use ledger_storage::NodeRegistry;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

type Node = Blockchain<Network>;

/// Address -> node map standing in for HTTP.
#[derive(Clone, Default)]
struct Network(Arc<RwLock<HashMap<String, Arc<Node>>>>);

#[async_trait]
impl PeerClient for Network {
    async fn fetch_chain(&self, address: &str) -> Result<Vec<SignedBlock>, PeerError> {
        let node = self.0.read().unwrap().get(address).cloned();
        match node {
            Some(node) => Ok(node.chain().await),
            None => Err(PeerError::Unavailable {
                address: address.to_string(),
                reason: "no such node".into(),
            }),
        }
    }
}

impl Network {
    /// Start a validator node at `address` sharing `registry`.
    fn spawn(&self, address: &str, registry: &Arc<NodeRegistry>) -> Arc<Node> {
        let keypair = Keypair::generate();
        registry
            .upsert(&[NodeRecord::new(address, keypair.identity(), true)])
            .unwrap();

        let node = Arc::new(
            Blockchain::new(
                BlockProposer::new(keypair),
                registry.clone(),
                ConsensusResolver::new(self.clone(), DEFAULT_PEER_TIMEOUT),
            )
            .unwrap(),
        );
        self.0
            .write()
            .unwrap()
            .insert(address.to_string(), node.clone());
        node
    }
}

fn peer(address: &str) -> Vec<String> {
    vec![address.to_string()]
}

#[tokio::test]
async fn test_single_node_chain_growth() {
    let network = Network::default();
    let registry = Arc::new(NodeRegistry::open_temporary().unwrap());
    let a = network.spawn("a", &registry);
    let b = network.spawn("b", &registry);

    // Genesis-only chain is valid.
    assert!(a.verify_chain().await.is_ok());

    // One block by a.
    a.mine().await.unwrap();
    let chain = a.chain().await;
    assert_eq!(chain.len(), 2);
    assert!(ChainValidator::is_valid(&chain, registry.as_ref()));

    // A third block signed by a again is invalid.
    let mut forged = chain.clone();
    let tip = forged.last().unwrap().clone();
    let mut extra = tip.clone();
    extra.data.index = 2;
    extra.data.previous_hash = tip.data.hash().to_hex();
    forged.push(extra);
    assert!(!ChainValidator::is_valid(&forged, registry.as_ref()));

    // b takes over a's chain and extends it.
    assert!(b.resolve_with(&peer("a")).await);
    b.mine().await.unwrap();
    assert_eq!(b.chain_length().await, 3);
    assert!(b.verify_chain().await.is_ok());
}

#[tokio::test]
async fn test_shorter_node_adopts_longer_chain_once() {
    let network = Network::default();
    let registry = Arc::new(NodeRegistry::open_temporary().unwrap());
    let a = network.spawn("a", &registry);
    let b = network.spawn("b", &registry);
    let c = network.spawn("c", &registry);
    let d = network.spawn("d", &registry);

    // a and b alternate to length 5.
    a.mine().await.unwrap();
    assert!(b.resolve_with(&peer("a")).await);
    b.mine().await.unwrap();
    assert!(a.resolve_with(&peer("b")).await);
    a.mine().await.unwrap();
    assert!(b.resolve_with(&peer("a")).await);
    b.mine().await.unwrap();
    assert_eq!(b.chain_length().await, 5);

    // c and d build an unrelated fork of length 3.
    c.mine().await.unwrap();
    assert!(d.resolve_with(&peer("c")).await);
    d.mine().await.unwrap();
    assert!(c.resolve_with(&peer("d")).await);
    assert_eq!(c.chain_length().await, 3);

    assert!(c.resolve_with(&peer("b")).await);
    assert_eq!(c.chain().await, b.chain().await);

    // Unchanged peers: nothing more to adopt.
    assert!(!c.resolve_with(&peer("b")).await);
    assert_eq!(c.chain().await, b.chain().await);
}

#[tokio::test]
async fn test_resolve_queries_registry_validators() {
    let network = Network::default();
    let registry = Arc::new(NodeRegistry::open_temporary().unwrap());
    let a = network.spawn("a", &registry);
    let b = network.spawn("b", &registry);
    // Listed as a validator but not reachable.
    registry
        .upsert(&[NodeRecord::new("ghost", "Z2hvc3Q=", true)])
        .unwrap();

    a.mine().await.unwrap();

    assert!(b.resolve().await.unwrap());
    assert!(!b.resolve().await.unwrap());
    assert!(!a.resolve().await.unwrap());
}

#[tokio::test]
async fn test_equal_length_fork_keeps_local() {
    let network = Network::default();
    let registry = Arc::new(NodeRegistry::open_temporary().unwrap());
    let a = network.spawn("a", &registry);
    let b = network.spawn("b", &registry);

    a.mine().await.unwrap();
    b.mine().await.unwrap();
    let before = b.chain().await;

    assert!(!b.resolve_with(&peer("a")).await);
    assert_eq!(b.chain().await, before);
}

#[tokio::test]
async fn test_chain_from_demoted_signer_is_refused() {
    let network = Network::default();
    let registry = Arc::new(NodeRegistry::open_temporary().unwrap());
    let a = network.spawn("a", &registry);
    let b = network.spawn("b", &registry);

    a.mine().await.unwrap();
    let a_record = registry
        .list(false)
        .unwrap()
        .into_iter()
        .find(|node| node.url == "a")
        .unwrap();
    registry
        .upsert(&[NodeRecord { is_validator: false, ..a_record }])
        .unwrap();

    assert!(!b.resolve_with(&peer("a")).await);
    assert_eq!(b.chain_length().await, 1);
    assert!(matches!(
        a.mine().await,
        Err(BlockchainError::Mining(MiningError::NotAValidator))
    ));
}

#[tokio::test]
async fn test_concurrent_mining_by_one_validator() {
    let network = Network::default();
    let registry = Arc::new(NodeRegistry::open_temporary().unwrap());
    let a = network.spawn("a", &registry);

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let node = a.clone();
            tokio::spawn(async move { node.mine().await })
        })
        .collect();

    let mut mined = 0;
    let mut refused = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => mined += 1,
            Err(BlockchainError::Mining(MiningError::ConsecutiveMining)) => refused += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(mined, 1);
    assert_eq!(refused, 7);
    assert_eq!(a.chain_length().await, 2);
}

#[tokio::test]
async fn test_rounds_keep_indices_unique_and_linked() {
    let network = Network::default();
    let registry = Arc::new(NodeRegistry::open_temporary().unwrap());
    let a = network.spawn("a", &registry);
    let b = network.spawn("b", &registry);

    for round in 0..6 {
        let (miner, follower, from) = if round % 2 == 0 { (&a, &b, "a") } else { (&b, &a, "b") };
        let before = miner.chain_length().await;
        miner.mine().await.unwrap();
        assert_eq!(miner.chain_length().await, before + 1);
        assert!(follower.resolve_with(&peer(from)).await);
    }

    let chain = a.chain().await;
    assert_eq!(chain.len(), 7);
    for (position, block) in chain.iter().enumerate() {
        assert_eq!(block.data.index, position as u64);
    }
    assert!(a.verify_chain().await.is_ok());
}

#[tokio::test]
async fn test_pool_conservation_under_concurrent_submissions() {
    let network = Network::default();
    let registry = Arc::new(NodeRegistry::open_temporary().unwrap());
    let a = network.spawn("a", &registry);

    let mut tasks = Vec::new();
    for i in 0..40 {
        let node = a.clone();
        tasks.push(tokio::spawn(async move {
            node.submit_transaction(Transaction::new(format!("s{i}"), "r", i))
                .await;
        }));
    }
    let miner = a.clone();
    let mining = tokio::spawn(async move { miner.mine().await });

    for task in tasks {
        task.await.unwrap();
    }
    mining.await.unwrap().unwrap();

    let mut seen: Vec<_> = a
        .verified_transactions()
        .await
        .into_iter()
        .chain(a.pending_transactions().await)
        .filter(|tx| !tx.is_reward())
        .map(|tx| tx.amount)
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..40).collect::<Vec<_>>());

    // Everything left in the pool lands in the next block.
    let b = network.spawn("b", &registry);
    assert!(b.resolve_with(&peer("a")).await);
    b.mine().await.unwrap();
    assert!(a.resolve_with(&peer("b")).await);
    a.mine().await.unwrap();
    assert!(a.pending_transactions().await.is_empty());

    let recorded = a
        .verified_transactions()
        .await
        .into_iter()
        .filter(|tx| !tx.is_reward())
        .count();
    assert_eq!(recorded, 40);
}

/// Serves `remote`'s chain, but first makes `local` mine a block, as if a
/// block were mined while the fetch was on the wire.
struct MinesDuringFetch {
    remote: Arc<Node>,
    local: Arc<OnceLock<Arc<Blockchain<MinesDuringFetch>>>>,
}

#[async_trait]
impl PeerClient for MinesDuringFetch {
    async fn fetch_chain(&self, address: &str) -> Result<Vec<SignedBlock>, PeerError> {
        if let Some(local) = self.local.get() {
            local.mine().await.map_err(|e| PeerError::Unavailable {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(self.remote.chain().await)
    }
}

#[tokio::test]
async fn test_block_mined_during_resolution_is_kept() {
    let network = Network::default();
    let registry = Arc::new(NodeRegistry::open_temporary().unwrap());
    let remote = network.spawn("remote", &registry);
    remote.mine().await.unwrap();

    let keypair = Keypair::generate();
    registry
        .upsert(&[NodeRecord::new("local", keypair.identity(), true)])
        .unwrap();
    let handle = Arc::new(OnceLock::new());
    let client = MinesDuringFetch {
        remote: remote.clone(),
        local: handle.clone(),
    };
    let local = Arc::new(
        Blockchain::new(
            BlockProposer::new(keypair),
            registry.clone(),
            ConsensusResolver::new(client, DEFAULT_PEER_TIMEOUT),
        )
        .unwrap(),
    );
    // The client reaches back into the node that owns it.
    assert!(handle.set(local.clone()).is_ok());

    // The peer chain (length 2) beats the local one (length 1) when the
    // fetch starts, but the local node mines to length 2 meanwhile.
    assert!(!local.resolve_with(&peer("remote")).await);

    let chain = local.chain().await;
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[1].signer_public_key, local.identity());
    assert_ne!(chain, remote.chain().await);
    assert!(local.verify_chain().await.is_ok());
}
