//! sled database wrapper with serialization helpers.

use ledger_core::RegistryError;
use sled::Db;
use std::path::Path;
use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error")]
    Database(#[from] sled::Error),

    #[error("serialization error")]
    Serialization(#[from] bincode::Error),
}

impl From<StorageError> for RegistryError {
    // The registry error is a plain string, so the cause is folded in here.
    fn from(err: StorageError) -> Self {
        let detail = match &err {
            StorageError::Database(e) => e.to_string(),
            StorageError::Serialization(e) => e.to_string(),
        };
        RegistryError::Backend(format!("{err}: {detail}"))
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Wrapper around sled database with serialization helpers.
pub struct Storage {
    db: Db,
}

impl Storage {
    /// Open a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory database (for testing).
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Retrieve and deserialize a value.
    pub fn get<K, V>(&self, key: K) -> Result<Option<V>>
    where
        K: AsRef<[u8]>,
        V: serde::de::DeserializeOwned,
    {
        match self.db.get(key)? {
            Some(bytes) => {
                let value = bincode::deserialize(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Deserialize every value stored under `prefix`, in key order.
    pub fn scan<V>(&self, prefix: &[u8]) -> Result<Vec<V>>
    where
        V: serde::de::DeserializeOwned,
    {
        self.db
            .scan_prefix(prefix)
            .map(|entry| -> Result<V> {
                let (_, bytes) = entry?;
                Ok(bincode::deserialize(&bytes)?)
            })
            .collect()
    }

    /// A fresh, strictly increasing id. Survives restarts.
    pub fn next_id(&self) -> Result<u64> {
        Ok(self.db.generate_id()?)
    }

    /// Write several serialized values atomically.
    pub fn put_batch<V: serde::Serialize>(&self, entries: &[(Vec<u8>, V)]) -> Result<()> {
        let mut batch = sled::Batch::default();
        for (key, value) in entries {
            batch.insert(key.as_slice(), bincode::serialize(value)?);
        }
        self.db.apply_batch(batch)?;
        Ok(())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Key of a registry entry.
    /// Format: "node:" + identity
    pub fn node_key(identity: &str) -> Vec<u8> {
        let mut key = NODE_PREFIX.to_vec();
        key.extend_from_slice(identity.as_bytes());
        key
    }
}

/// Prefix shared by all registry entries.
pub const NODE_PREFIX: &[u8] = b"node:";
