// src/storage.rs

//! Read-only view of a blockchain and an in-memory implementation.
//!
//! Pre-RingCT outputs are indexed per amount: the `k`-th output of amount
//! `a` ever created on chain has global index `k` in bucket `a`. Ring
//! inputs reference members by these indices.

use crate::errors::{Result, ScopeError};
use crate::transaction::Transaction;
use crate::types::{hash_to_hex, Hash, Height};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Key data of one output, as returned by a batch lookup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputData {
    /// Raw one-time public key
    pub key: [u8; 32],
    /// Amount commitment, for RingCT outputs
    pub commitment: Option<[u8; 32]>,
    /// Height of the block that created the output
    pub height: Height,
}

/// Where an output was created
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputLocation {
    /// Parent transaction
    pub tx_hash: Hash,
    /// Position in the parent's outputs
    pub index_in_tx: u32,
}

/// Queries the inspector needs from a chain database
///
/// Implementations are read-only and must stay consistent for the duration
/// of one inspection run.
pub trait BlockchainStore {
    /// Loads a transaction by hash
    fn get_tx(&self, hash: &Hash) -> Result<Transaction>;

    /// Number of outputs ever created with `amount`
    fn get_num_outputs(&self, amount: u64) -> Result<u64>;

    /// Batch lookup by absolute offset; preserves order and length
    fn get_output_keys(&self, amount: u64, offsets: &[u64]) -> Result<Vec<OutputData>>;

    /// Parent transaction and index of one output
    fn get_output_tx(&self, amount: u64, offset: u64) -> Result<OutputLocation>;

    /// Height of the block containing `hash`
    fn get_tx_block_height(&self, hash: &Hash) -> Result<Height>;
}

#[derive(Clone, Debug)]
struct StoredOutput {
    data: OutputData,
    location: OutputLocation,
}

#[derive(Debug, Default)]
struct ChainIndex {
    transactions: HashMap<Hash, (Transaction, Height)>,
    outputs: HashMap<u64, Vec<StoredOutput>>,
    tip_height: Option<Height>,
}

/// In-memory store for snapshots and testing
///
/// Transactions must be added in chain order; global output indices are
/// assigned per amount as they are added.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    index: Arc<RwLock<ChainIndex>>,
}

fn lock_poisoned<E: std::fmt::Display>(e: E) -> ScopeError {
    ScopeError::StoreError(format!("Lock poisoned: {}", e))
}

impl MemoryStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transaction mined at `height`
    ///
    /// `hash` is required when it cannot be computed from the blob (RingCT
    /// transactions); when both exist they must agree.
    ///
    /// # Returns
    /// The transaction hash
    pub fn add_transaction(&self, tx: Transaction, height: Height, hash: Option<Hash>) -> Result<Hash> {
        let tx_hash = match (tx.hash(), hash) {
            (Some(computed), Some(given)) if computed != given => {
                return Err(ScopeError::InvalidEncoding(format!(
                    "supplied hash {} does not match computed {}",
                    hash_to_hex(&given),
                    hash_to_hex(&computed)
                )))
            }
            (Some(computed), _) => computed,
            (None, Some(given)) => given,
            (None, None) => {
                return Err(ScopeError::InvalidEncoding(
                    "transaction hash cannot be computed and was not supplied".to_string(),
                ))
            }
        };

        let mut index = self.index.write().map_err(lock_poisoned)?;

        if index.transactions.contains_key(&tx_hash) {
            return Err(ScopeError::StoreError(format!(
                "transaction {} already stored",
                hash_to_hex(&tx_hash)
            )));
        }
        if let Some(tip) = index.tip_height {
            if height < tip {
                return Err(ScopeError::StoreError(format!(
                    "height {} is below chain tip {}",
                    height, tip
                )));
            }
        }

        for (i, output) in tx.outputs().iter().enumerate() {
            // RingCT-era outputs all live in the zero-amount bucket
            let bucket = if tx.version() >= 2 { 0 } else { output.amount };
            index.outputs.entry(bucket).or_default().push(StoredOutput {
                data: OutputData { key: output.key, commitment: None, height },
                location: OutputLocation { tx_hash, index_in_tx: i as u32 },
            });
        }

        debug!(
            tx = %hash_to_hex(&tx_hash),
            height,
            outputs = tx.outputs().len(),
            "Stored transaction"
        );

        index.tip_height = Some(height);
        index.transactions.insert(tx_hash, (tx, height));
        Ok(tx_hash)
    }

    /// Returns the total number of stored transactions
    pub fn transaction_count(&self) -> Result<usize> {
        Ok(self.index.read().map_err(lock_poisoned)?.transactions.len())
    }

    /// Highest height added so far
    pub fn tip_height(&self) -> Result<Option<Height>> {
        Ok(self.index.read().map_err(lock_poisoned)?.tip_height)
    }

    /// Checks if a transaction exists
    pub fn has_transaction(&self, hash: &Hash) -> Result<bool> {
        Ok(self.index.read().map_err(lock_poisoned)?.transactions.contains_key(hash))
    }

    fn with_output<T>(
        &self,
        amount: u64,
        offset: u64,
        f: impl FnOnce(&StoredOutput) -> T,
    ) -> Result<T> {
        let index = self.index.read().map_err(lock_poisoned)?;
        let bucket = index
            .outputs
            .get(&amount)
            .ok_or_else(|| ScopeError::NotFound(format!("no outputs with amount {}", amount)))?;
        let output = usize::try_from(offset)
            .ok()
            .and_then(|i| bucket.get(i))
            .ok_or_else(|| {
                ScopeError::NotFound(format!(
                    "offset {} in amount {} (bucket holds {})",
                    offset,
                    amount,
                    bucket.len()
                ))
            })?;
        Ok(f(output))
    }
}

impl BlockchainStore for MemoryStore {
    fn get_tx(&self, hash: &Hash) -> Result<Transaction> {
        let index = self.index.read().map_err(lock_poisoned)?;
        index
            .transactions
            .get(hash)
            .map(|(tx, _)| tx.clone())
            .ok_or_else(|| ScopeError::NotFound(format!("transaction {}", hash_to_hex(hash))))
    }

    fn get_num_outputs(&self, amount: u64) -> Result<u64> {
        let index = self.index.read().map_err(lock_poisoned)?;
        Ok(index.outputs.get(&amount).map_or(0, |bucket| bucket.len() as u64))
    }

    fn get_output_keys(&self, amount: u64, offsets: &[u64]) -> Result<Vec<OutputData>> {
        offsets
            .iter()
            .map(|&offset| self.with_output(amount, offset, |o| o.data.clone()))
            .collect()
    }

    fn get_output_tx(&self, amount: u64, offset: u64) -> Result<OutputLocation> {
        self.with_output(amount, offset, |o| o.location)
    }

    fn get_tx_block_height(&self, hash: &Hash) -> Result<Height> {
        let index = self.index.read().map_err(lock_poisoned)?;
        index
            .transactions
            .get(hash)
            .map(|(_, height)| *height)
            .ok_or_else(|| ScopeError::NotFound(format!("transaction {}", hash_to_hex(hash))))
    }
}
