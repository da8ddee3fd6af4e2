// src/transaction_builder.rs

//! Synthetic pre-RingCT transactions and chains, for tests.
//!
//! [`TransactionBuilder`] assembles one version 1 transaction: outputs paid
//! to stealth addresses and ring-signed key inputs. [`ChainBuilder`] mines
//! a sequence of such transactions, tracking per-amount global output
//! indices the same way [`MemoryStore`] assigns them, so rings can be
//! drawn and later resolved against the resulting store.

use crate::errors::{Result, ScopeError};
use crate::extra::{write_extra, ExtraField};
use crate::resolver::absolute_to_relative;
use crate::snapshot::ChainSnapshot;
use crate::storage::MemoryStore;
use crate::transaction::{KeyInput, Transaction, TransactionPrefix, TxIn, TxOut};
use crate::types::{Hash, Height};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use rand::{CryptoRng, RngCore};
use ringscope_crypto::keys::{PublicKey, SecretKey, SpendKey, ViewKey};
use ringscope_crypto::ring::{generate_ring_signature, Ring, RingSignature};
use ringscope_crypto::stealth::{derive_for_output, derive_output_key, generate_key_image};
use std::collections::HashMap;

struct PendingInput {
    amount: u64,
    absolute_offsets: Vec<u64>,
    ring: Ring,
    secret: SecretKey,
    signer_index: usize,
}

/// Builder for version 1 transactions
pub struct TransactionBuilder {
    tx_secret: SecretKey,
    unlock_time: u64,
    coinbase_height: Option<Height>,
    inputs: Vec<PendingInput>,
    outputs: Vec<TxOut>,
    extra: Vec<ExtraField>,
}

impl TransactionBuilder {
    /// Creates a builder whose transaction key is `r`
    pub fn new(tx_secret: SecretKey) -> Self {
        let extra = vec![ExtraField::PublicKey(tx_secret.public_key().to_bytes())];
        Self {
            tx_secret,
            unlock_time: 0,
            coinbase_height: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            extra,
        }
    }

    /// Makes this a coinbase transaction for block `height`
    pub fn coinbase(mut self, height: Height) -> Self {
        self.coinbase_height = Some(height);
        self.unlock_time = height + 60;
        self
    }

    /// Appends an extra field after the transaction public key
    pub fn with_extra(mut self, field: ExtraField) -> Self {
        self.extra.push(field);
        self
    }

    /// Pays `amount` to the address `(A, B)` at the next output index
    pub fn pay_to(mut self, view_public: &PublicKey, spend_public: &PublicKey, amount: u64) -> Self {
        let index = self.outputs.len() as u64;
        let key = derive_output_key(view_public, spend_public, &self.tx_secret, index);
        self.outputs.push(TxOut { amount, key: key.to_bytes() });
        self
    }

    /// Appends an output with an arbitrary key
    pub fn add_raw_output(mut self, amount: u64, key: [u8; 32]) -> Self {
        self.outputs.push(TxOut { amount, key });
        self
    }

    /// Adds a key input spending `ring[signer_index]` with secret `x`
    ///
    /// `absolute_offsets` must be ascending and match `ring` positionally.
    pub fn add_input(
        mut self,
        amount: u64,
        absolute_offsets: Vec<u64>,
        ring: Ring,
        secret: SecretKey,
        signer_index: usize,
    ) -> Result<Self> {
        if absolute_offsets.len() != ring.len() {
            return Err(ScopeError::RingSizeMismatch {
                expected: absolute_offsets.len(),
                actual: ring.len(),
            });
        }
        if signer_index >= ring.len() {
            return Err(ScopeError::InvalidSignerIndex { index: signer_index, ring_size: ring.len() });
        }
        self.inputs.push(PendingInput { amount, absolute_offsets, ring, secret, signer_index });
        Ok(self)
    }

    /// Builds and signs the transaction
    pub fn build<R: RngCore + CryptoRng>(self, rng: &mut R) -> Result<Transaction> {
        let mut inputs = Vec::with_capacity(self.inputs.len() + 1);
        if let Some(height) = self.coinbase_height {
            inputs.push(TxIn::Gen { height });
        }

        let mut key_images = Vec::with_capacity(self.inputs.len());
        for pending in &self.inputs {
            let member = pending
                .ring
                .get(pending.signer_index)
                .map(|m| m.public_key)
                .ok_or(ScopeError::InvalidSignerIndex {
                    index: pending.signer_index,
                    ring_size: pending.ring.len(),
                })?;
            let key_image = generate_key_image(&pending.secret, &member);
            inputs.push(TxIn::ToKey(KeyInput {
                amount: pending.amount,
                key_offsets: absolute_to_relative(&pending.absolute_offsets)?,
                key_image: key_image.to_bytes(),
            }));
            key_images.push(key_image);
        }

        let prefix = TransactionPrefix {
            version: 1,
            unlock_time: self.unlock_time,
            inputs,
            outputs: self.outputs,
            extra: write_extra(&self.extra),
        };
        let prefix_hash = prefix.hash();

        let mut signatures = Vec::with_capacity(prefix.inputs.len());
        if self.coinbase_height.is_some() {
            signatures.push(RingSignature::default());
        }
        for (pending, key_image) in self.inputs.iter().zip(key_images.iter()) {
            signatures.push(generate_ring_signature(
                &prefix_hash,
                key_image,
                &pending.ring,
                &pending.secret,
                pending.signer_index,
                rng,
            )?);
        }

        Ok(Transaction { prefix, signatures, rct_remainder: Vec::new() })
    }
}

/// An output the builder knows the owner of
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedOutput {
    /// Amount bucket
    pub amount: u64,
    /// Global index within the bucket
    pub global_index: u64,
    /// Parent transaction
    pub tx_hash: Hash,
    /// Position in the parent's outputs
    pub index_in_tx: u64,
    /// One-time public key
    pub public_key: PublicKey,
    /// Parent's transaction public key
    pub tx_public_key: PublicKey,
}

/// Result of a synthetic spend
#[derive(Clone, Debug)]
pub struct SpendRecord {
    /// Hash of the spending transaction
    pub tx_hash: Hash,
    /// Real signer position per input
    pub real_positions: Vec<usize>,
    /// Outputs the spend created for the recipient
    pub change: Vec<OwnedOutput>,
}

/// Mines a synthetic chain, one transaction per block
pub struct ChainBuilder {
    rng: StdRng,
    height: Height,
    blocks: Vec<(Transaction, Height)>,
    buckets: HashMap<u64, Vec<PublicKey>>,
}

impl ChainBuilder {
    /// Creates an empty chain with a deterministic RNG
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), height: 0, blocks: Vec::new(), buckets: HashMap::new() }
    }

    /// The builder's RNG, for creating wallets in the same deterministic stream
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Current number of outputs of `amount`
    pub fn bucket_size(&self, amount: u64) -> u64 {
        self.buckets.get(&amount).map_or(0, |b| b.len() as u64)
    }

    /// Appends a transaction in a new block
    pub fn append(&mut self, tx: Transaction) -> Result<Hash> {
        let hash = tx
            .hash()
            .ok_or_else(|| ScopeError::InvalidEncoding("synthetic chains are version 1 only".to_string()))?;
        for output in tx.outputs() {
            self.buckets.entry(output.amount).or_default().push(output.public_key()?);
        }
        self.blocks.push((tx, self.height));
        self.height += 1;
        Ok(hash)
    }

    fn record_owned(&self, tx: &Transaction, tx_hash: Hash, view: &ViewKey, spend_public: &PublicKey) -> Vec<OwnedOutput> {
        let tx_public_key = match tx.tx_public_key() {
            Some(key) => key,
            None => return Vec::new(),
        };
        let mut seen: HashMap<u64, u64> = HashMap::new();
        let mut owned = Vec::new();
        for (i, output) in tx.outputs().iter().enumerate() {
            let before = seen.entry(output.amount).or_insert(0);
            // global index = bucket size after append - outputs of this amount still to come
            let total_in_tx = tx.outputs().iter().filter(|o| o.amount == output.amount).count() as u64;
            let global_index = self.bucket_size(output.amount) - total_in_tx + *before;
            *before += 1;
            if matches!(tx.is_output_ours(view.secret(), spend_public, i), Ok(true)) {
                if let Ok(public_key) = output.public_key() {
                    owned.push(OwnedOutput {
                        amount: output.amount,
                        global_index,
                        tx_hash,
                        index_in_tx: i as u64,
                        public_key,
                        tx_public_key,
                    });
                }
            }
        }
        owned
    }

    /// Mines a coinbase paying each of `amounts` to the wallet
    pub fn mine_to(&mut self, view: &ViewKey, spend_public: &PublicKey, amounts: &[u64]) -> Result<Vec<OwnedOutput>> {
        let tx_secret = SecretKey::generate(&mut self.rng);
        let mut builder = TransactionBuilder::new(tx_secret).coinbase(self.height);
        for &amount in amounts {
            builder = builder.pay_to(view.public(), spend_public, amount);
        }
        let tx = builder.build(&mut self.rng)?;
        let hash = self.append(tx.clone())?;
        Ok(self.record_owned(&tx, hash, view, spend_public))
    }

    /// Mines a coinbase with `count` outputs of `amount` to random wallets
    pub fn mine_decoys(&mut self, amount: u64, count: usize) -> Result<Hash> {
        let tx_secret = SecretKey::generate(&mut self.rng);
        let mut builder = TransactionBuilder::new(tx_secret).coinbase(self.height);
        for _ in 0..count {
            let view = SecretKey::generate(&mut self.rng).public_key();
            let spend = SecretKey::generate(&mut self.rng).public_key();
            builder = builder.pay_to(&view, &spend, amount);
        }
        let tx = builder.build(&mut self.rng)?;
        self.append(tx)
    }

    /// Spends `outputs` of the wallet with rings of `ring_size`, paying
    /// the same amounts to `(recipient_view, recipient_spend)`
    pub fn spend(
        &mut self,
        view: &ViewKey,
        spend: &SpendKey,
        outputs: &[OwnedOutput],
        ring_size: usize,
        recipient_view: &ViewKey,
        recipient_spend: &PublicKey,
    ) -> Result<SpendRecord> {
        let tx_secret = SecretKey::generate(&mut self.rng);
        let mut builder = TransactionBuilder::new(tx_secret);
        let mut real_positions = Vec::with_capacity(outputs.len());

        for owned in outputs {
            let bucket = self.buckets.get(&owned.amount).cloned().unwrap_or_default();
            if ring_size == 0 || bucket.len() < ring_size {
                return Err(ScopeError::NotFound(format!(
                    "amount {} has {} outputs, ring needs {}",
                    owned.amount,
                    bucket.len(),
                    ring_size
                )));
            }

            let mut offsets: Vec<u64> = sample(&mut self.rng, bucket.len() - 1, ring_size - 1)
                .into_iter()
                .map(|i| {
                    // skip over the real output's slot
                    let i = i as u64;
                    if i >= owned.global_index { i + 1 } else { i }
                })
                .collect();
            offsets.push(owned.global_index);
            offsets.sort_unstable();

            let position = offsets
                .iter()
                .position(|&o| o == owned.global_index)
                .ok_or_else(|| ScopeError::MissingOutput("real output dropped from ring".to_string()))?;
            let ring = Ring::from_keys(offsets.iter().map(|&o| bucket[o as usize]).collect::<Vec<_>>());

            let keys = derive_for_output(view, spend, &owned.tx_public_key, owned.index_in_tx, &owned.public_key)?;
            builder = builder.add_input(owned.amount, offsets, ring, keys.secret, position)?;
            builder = builder.pay_to(recipient_view.public(), recipient_spend, owned.amount);
            real_positions.push(position);
        }

        let tx = builder.build(&mut self.rng)?;
        let tx_hash = self.append(tx.clone())?;
        let change = self.record_owned(&tx, tx_hash, recipient_view, recipient_spend);
        Ok(SpendRecord { tx_hash, real_positions, change })
    }

    /// Every mined transaction with its height
    pub fn blocks(&self) -> &[(Transaction, Height)] {
        &self.blocks
    }

    /// Snapshot of the chain
    pub fn snapshot(&self) -> ChainSnapshot {
        let mut snapshot = ChainSnapshot::new();
        for (tx, height) in &self.blocks {
            snapshot.push(tx, *height, None);
        }
        snapshot
    }

    /// Store holding the chain
    pub fn build_store(&self) -> Result<MemoryStore> {
        let store = MemoryStore::new();
        for (tx, height) in &self.blocks {
            store.add_transaction(tx.clone(), *height, None)?;
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::resolver::resolve_ring;
    use crate::storage::BlockchainStore;
    use ringscope_crypto::keys::generate_wallet_keys;
    use ringscope_crypto::ring::verify_ring_signature;

    const AMOUNT: u64 = 10_000_000_000;

    fn funded_chain(seed: u64) -> (ChainBuilder, ViewKey, SpendKey, Vec<OwnedOutput>) {
        let mut chain = ChainBuilder::new(seed);
        let (view, spend) = generate_wallet_keys(chain.rng());
        chain.mine_decoys(AMOUNT, 4).unwrap();
        let owned = chain.mine_to(&view, spend.public(), &[AMOUNT, AMOUNT]).unwrap();
        chain.mine_decoys(AMOUNT, 6).unwrap();
        (chain, view, spend, owned)
    }

    #[test]
    fn test_owned_outputs_indexed() {
        let (chain, _, _, owned) = funded_chain(1);
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0].global_index, 4);
        assert_eq!(owned[1].global_index, 5);
        assert_eq!(chain.bucket_size(AMOUNT), 12);
    }

    #[test]
    fn test_spend_resolves_and_verifies() {
        let (mut chain, view, spend, owned) = funded_chain(2);
        let (recipient_view, recipient_spend) = generate_wallet_keys(chain.rng());
        let record = chain
            .spend(&view, &spend, &owned, 5, &recipient_view, recipient_spend.public())
            .unwrap();
        assert_eq!(record.change.len(), 2);

        let store = chain.build_store().unwrap();
        let tx = store.get_tx(&record.tx_hash).unwrap();
        assert!(tx.check_signature_rows().is_ok());

        for (i, input) in tx.inputs().iter().enumerate() {
            let key_input = input.as_key_input().unwrap();
            let ring = resolve_ring(&store, key_input).unwrap();
            assert_eq!(ring.len(), 5);
            assert_eq!(ring.members[record.real_positions[i]].public_key, owned[i].public_key);
            assert_eq!(ring.members[record.real_positions[i]].tx_hash, owned[i].tx_hash);

            let image = key_input.key_image().unwrap();
            let sig = tx.signature(i).unwrap();
            assert!(verify_ring_signature(&tx.prefix_hash(), &image, &ring.to_ring(), sig));
        }
    }

    #[test]
    fn test_resolve_offset_beyond_bucket() {
        let (chain, _, _, _) = funded_chain(3);
        let store = chain.build_store().unwrap();
        let input = KeyInput { amount: AMOUNT, key_offsets: vec![3, 100], key_image: [0u8; 32] };
        assert_eq!(resolve_ring(&store, &input).unwrap_err().kind(), ErrorKind::NotFound);

        let unknown_amount = KeyInput { amount: 7, key_offsets: vec![0], key_image: [0u8; 32] };
        assert_eq!(resolve_ring(&store, &unknown_amount).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_resolve_members_carry_parent_data() {
        let (chain, _, _, owned) = funded_chain(4);
        let store = chain.build_store().unwrap();
        let input = KeyInput { amount: AMOUNT, key_offsets: vec![0, 4, 1], key_image: [0u8; 32] };
        let ring = resolve_ring(&store, &input).unwrap();

        assert_eq!(ring.absolute_offsets(), vec![0, 4, 5]);
        assert_eq!(ring.members[1].public_key, owned[0].public_key);
        assert_eq!(ring.members[1].height, 1);
        assert_eq!(ring.members[2].index_in_tx, 1);
        assert_eq!(ring.members[1].tx_public_key, Some(owned[0].tx_public_key));
        assert_eq!(ring.to_ring().get(2).unwrap().hint, Some(5));
    }

    #[test]
    fn test_builder_rejects_bad_signer_index() {
        let mut rng = StdRng::seed_from_u64(5);
        let secret = SecretKey::generate(&mut rng);
        let ring = Ring::from_keys([secret.public_key()]);
        let result = TransactionBuilder::new(SecretKey::generate(&mut rng)).add_input(1, vec![0], ring, secret, 1);
        assert!(matches!(result, Err(ScopeError::InvalidSignerIndex { index: 1, ring_size: 1 })));
    }

    #[test]
    fn test_snapshot_matches_store() {
        let (chain, _, _, _) = funded_chain(6);
        let store = chain.snapshot().into_store().unwrap();
        assert_eq!(store.get_num_outputs(AMOUNT).unwrap(), 12);
        assert_eq!(store.transaction_count().unwrap(), 3);
    }
}
