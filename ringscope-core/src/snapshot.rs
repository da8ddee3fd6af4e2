// src/snapshot.rs

//! JSON chain snapshots.
//!
//! A snapshot lists raw transaction blobs in chain order together with the
//! height of their block. Loading one replays it into a [`MemoryStore`],
//! which assigns the same per-amount output indices the chain did.

use crate::errors::{Result, ScopeError};
use crate::storage::MemoryStore;
use crate::transaction::Transaction;
use crate::types::{hash_to_hex, hex_to_hash, Hash, Height};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// One transaction of a snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Height of the containing block
    pub height: Height,
    /// Hex-encoded transaction blob
    pub blob: String,
    /// Hex transaction hash; required for RingCT transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// Transactions in chain order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    /// Entries, oldest first
    pub transactions: Vec<SnapshotEntry>,
}

impl ChainSnapshot {
    /// Creates an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transaction
    pub fn push(&mut self, tx: &Transaction, height: Height, hash: Option<Hash>) {
        self.transactions.push(SnapshotEntry {
            height,
            blob: hex::encode(tx.to_bytes()),
            hash: hash.map(|h| hash_to_hex(&h)),
        });
    }

    /// Reads a snapshot from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            ScopeError::StoreError(format!("cannot read snapshot {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Writes the snapshot as pretty JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Replays every entry into a fresh store
    ///
    /// Any undecodable entry fails the whole load as a `StoreError` naming
    /// the entry.
    pub fn into_store(self) -> Result<MemoryStore> {
        let store = MemoryStore::new();
        for (i, entry) in self.transactions.into_iter().enumerate() {
            let wrap = |e: ScopeError| ScopeError::StoreError(format!("snapshot entry {}: {}", i, e));
            let tx = Transaction::from_hex(&entry.blob).map_err(wrap)?;
            let hash = entry.hash.as_deref().map(hex_to_hash).transpose().map_err(wrap)?;
            store.add_transaction(tx, entry.height, hash).map_err(wrap)?;
        }
        Ok(store)
    }
}

/// Loads the snapshot at `path` into a store
pub fn open_store(path: &Path) -> Result<MemoryStore> {
    let snapshot = ChainSnapshot::from_file(path)?;
    let count = snapshot.transactions.len();
    let store = snapshot.into_store()?;
    info!(path = %path.display(), transactions = count, "Loaded chain snapshot");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::storage::BlockchainStore;
    use crate::transaction::{TransactionPrefix, TxIn, TxOut};

    fn coinbase(height: u64) -> Transaction {
        Transaction {
            prefix: TransactionPrefix {
                version: 1,
                unlock_time: height + 60,
                inputs: vec![TxIn::Gen { height }],
                outputs: vec![TxOut { amount: 1000, key: [height as u8; 32] }],
                extra: vec![],
            },
            signatures: vec![Default::default()],
            rct_remainder: vec![],
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chain.json");

        let mut snapshot = ChainSnapshot::new();
        snapshot.push(&coinbase(1), 1, None);
        snapshot.push(&coinbase(2), 2, None);
        snapshot.save_to_file(&path).unwrap();

        let loaded = ChainSnapshot::from_file(&path).unwrap();
        assert_eq!(loaded, snapshot);

        let store = open_store(&path).unwrap();
        assert_eq!(store.get_num_outputs(1000).unwrap(), 2);
        let hash = coinbase(2).hash().unwrap();
        assert_eq!(store.get_tx_block_height(&hash).unwrap(), 2);
    }

    #[test]
    fn test_missing_file_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_store(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreError);
    }

    #[test]
    fn test_bad_blob_is_store_error() {
        let snapshot = ChainSnapshot {
            transactions: vec![SnapshotEntry { height: 0, blob: "01zz".to_string(), hash: None }],
        };
        let err = snapshot.into_store().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreError);
        assert!(err.to_string().contains("snapshot entry 0"));
    }

    #[test]
    fn test_malformed_json_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(open_store(&path).unwrap_err().kind(), ErrorKind::StoreError);
    }
}
