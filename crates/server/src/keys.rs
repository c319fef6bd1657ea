//! Node key persistence.
//!
//! The node signs blocks with a single Ed25519 key kept as JSON under
//! `<data_dir>/keys/node_key.json`. A missing file is replaced by a fresh
//! key; a file that exists but cannot be trusted is an error, never
//! silently overwritten.

use ledger_core::Keypair;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// File name of the node key inside the keys directory.
pub const NODE_KEY_FILE: &str = "node_key.json";

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("failed to access key file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed key file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("key file {path}: public key does not match private key")]
    Mismatch { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, KeyError>;

/// On-disk key layout.
#[derive(Debug, Serialize, Deserialize)]
struct KeyFile {
    identity: String,
    public_key: String,
    private_key: String,
}

impl KeyFile {
    fn from_keypair(keypair: &Keypair) -> Self {
        Self {
            identity: keypair.identity(),
            public_key: hex::encode(keypair.public_key.as_bytes()),
            private_key: hex::encode(keypair.private_key()),
        }
    }

    fn into_keypair(self, path: &Path) -> Result<Keypair> {
        let malformed = |reason: String| KeyError::Malformed {
            path: path.to_path_buf(),
            reason,
        };

        let mut secret = [0u8; 32];
        hex::decode_to_slice(&self.private_key, &mut secret)
            .map_err(|e| malformed(format!("private_key: {e}")))?;
        let mut public = [0u8; 32];
        hex::decode_to_slice(&self.public_key, &mut public)
            .map_err(|e| malformed(format!("public_key: {e}")))?;

        let keypair = Keypair::from_private_key(&secret);
        if keypair.public_key.as_bytes() != public || keypair.identity() != self.identity {
            return Err(KeyError::Mismatch {
                path: path.to_path_buf(),
            });
        }
        Ok(keypair)
    }
}

/// Load the node key from `keys_dir`, generating and saving one if absent.
pub fn load_or_generate(keys_dir: &Path) -> Result<Keypair> {
    let path = keys_dir.join(NODE_KEY_FILE);

    match fs::read_to_string(&path) {
        Ok(contents) => {
            let file: KeyFile =
                serde_json::from_str(&contents).map_err(|e| KeyError::Malformed {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            let keypair = file.into_keypair(&path)?;
            info!(path = %path.display(), "loaded node key");
            Ok(keypair)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let keypair = Keypair::generate();
            save(&path, &keypair)?;
            info!(path = %path.display(), "generated new node key");
            Ok(keypair)
        }
        Err(source) => Err(KeyError::Io { path, source }),
    }
}

fn save(path: &Path, keypair: &Keypair) -> Result<()> {
    let io_error = |source| KeyError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io_error)?;
    }
    let json = serde_json::to_string_pretty(&KeyFile::from_keypair(keypair)).map_err(|e| {
        KeyError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    fs::write(path, json).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generates_then_reloads_same_key() {
        let dir = TempDir::new().unwrap();
        let keys = dir.path().join("keys");

        let first = load_or_generate(&keys).unwrap();
        assert!(keys.join(NODE_KEY_FILE).exists());

        let second = load_or_generate(&keys).unwrap();
        assert_eq!(first.identity(), second.identity());
        assert_eq!(first.private_key(), second.private_key());
    }

    #[test]
    fn test_key_file_layout() {
        let dir = TempDir::new().unwrap();
        let keypair = load_or_generate(dir.path()).unwrap();

        let contents = fs::read_to_string(dir.path().join(NODE_KEY_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(json["identity"], keypair.identity());
        assert_eq!(json["public_key"], hex::encode(keypair.public_key.as_bytes()));
        assert_eq!(json["private_key"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn test_malformed_file_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(NODE_KEY_FILE);
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            load_or_generate(dir.path()),
            Err(KeyError::Malformed { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json");
    }

    #[test]
    fn test_mismatched_public_key_rejected() {
        let dir = TempDir::new().unwrap();
        let (a, b) = (Keypair::generate(), Keypair::generate());
        let file = KeyFile {
            identity: a.identity(),
            public_key: hex::encode(b.public_key.as_bytes()),
            private_key: hex::encode(a.private_key()),
        };
        fs::write(
            dir.path().join(NODE_KEY_FILE),
            serde_json::to_string(&file).unwrap(),
        )
        .unwrap();

        assert!(matches!(
            load_or_generate(dir.path()),
            Err(KeyError::Mismatch { .. })
        ));
    }
}
