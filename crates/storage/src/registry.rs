//! sled-backed validator registry.

use crate::db::{Result, Storage, NODE_PREFIX};
use ledger_core::{NodeRecord, RegistryError, ValidatorRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

/// A record plus the order in which it was first registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredNode {
    seq: u64,
    record: NodeRecord,
}

/// Persistent identity -> node mapping.
///
/// Entries are listed in registration order, so the node that initialized
/// the registry always comes first.
pub struct NodeRegistry {
    storage: Storage,
    /// Serializes upserts so the read-then-write of `seq` cannot interleave.
    write_lock: Mutex<()>,
}

impl NodeRegistry {
    /// Wrap an opened storage.
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Open the registry database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Storage::open(path)?))
    }

    /// An in-memory registry (for testing).
    pub fn open_temporary() -> Result<Self> {
        Ok(Self::new(Storage::open_temporary()?))
    }

    fn load(&self) -> Result<Vec<StoredNode>> {
        let mut nodes: Vec<StoredNode> = self.storage.scan(NODE_PREFIX)?;
        nodes.sort_by_key(|node| node.seq);
        Ok(nodes)
    }

    fn upsert_records(&self, records: &[NodeRecord]) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let key = Storage::node_key(&record.public_key);
            let seq = match self.storage.get::<_, StoredNode>(&key)? {
                Some(existing) => existing.seq,
                None => self.storage.next_id()?,
            };
            entries.push((
                key,
                StoredNode {
                    seq,
                    record: record.clone(),
                },
            ));
        }

        self.storage.put_batch(&entries)?;
        self.storage.flush()
    }
}

impl ValidatorRegistry for NodeRegistry {
    fn list(&self, validators_only: bool) -> std::result::Result<Vec<NodeRecord>, RegistryError> {
        Ok(self
            .load()?
            .into_iter()
            .map(|node| node.record)
            .filter(|record| !validators_only || record.is_validator)
            .collect())
    }

    fn upsert(&self, records: &[NodeRecord]) -> std::result::Result<(), RegistryError> {
        Ok(self.upsert_records(records)?)
    }

    fn get(&self, public_key: &str) -> std::result::Result<Option<NodeRecord>, RegistryError> {
        let stored: Option<StoredNode> = self.storage.get(Storage::node_key(public_key))?;
        Ok(stored.map(|node| node.record))
    }
}
