// src/resolver.rs

//! Ring-input resolution.
//!
//! Turns the relative key offsets of a `txin_to_key` into the ring the
//! signature was made over: absolute output indices, member public keys,
//! and the transaction that created each member.

use crate::errors::{Result, ScopeError};
use crate::storage::BlockchainStore;
use crate::transaction::KeyInput;
use crate::types::{hash_to_hex, Hash, Height};
use ringscope_crypto::ring::{Ring, RingMember};
use ringscope_crypto::PublicKey;
use tracing::debug;

/// Converts relative offsets to absolute ones by prefix sum
///
/// Overflow of the running sum is an encoding error.
pub fn relative_to_absolute(relative: &[u64]) -> Result<Vec<u64>> {
    let mut absolute = Vec::with_capacity(relative.len());
    let mut sum: u64 = 0;
    for &offset in relative {
        sum = sum.checked_add(offset).ok_or_else(|| {
            ScopeError::InvalidEncoding("key offsets overflow u64".to_string())
        })?;
        absolute.push(sum);
    }
    Ok(absolute)
}

/// Converts ascending absolute offsets back to relative form
pub fn absolute_to_relative(absolute: &[u64]) -> Result<Vec<u64>> {
    let mut previous = 0u64;
    absolute
        .iter()
        .map(|&offset| {
            let delta = offset.checked_sub(previous).ok_or_else(|| {
                ScopeError::InvalidEncoding(format!(
                    "absolute offsets not ascending: {} after {}",
                    offset, previous
                ))
            })?;
            previous = offset;
            Ok(delta)
        })
        .collect()
}

/// One resolved ring member
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedMember {
    /// Member's one-time public key `P`
    pub public_key: PublicKey,
    /// Global index in the amount bucket
    pub absolute_offset: u64,
    /// Transaction that created the output
    pub tx_hash: Hash,
    /// Height of that transaction's block
    pub height: Height,
    /// Output index inside the parent transaction
    pub index_in_tx: u32,
    /// Parent's transaction public key `R`, if it has one
    pub tx_public_key: Option<PublicKey>,
}

/// The ring behind one input, in ring order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRing {
    /// Amount bucket
    pub amount: u64,
    /// Members, matched positionally to the signature elements
    pub members: Vec<ResolvedMember>,
}

impl ResolvedRing {
    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if the ring has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Absolute offsets in ring order
    pub fn absolute_offsets(&self) -> Vec<u64> {
        self.members.iter().map(|m| m.absolute_offset).collect()
    }

    /// Ring context for signing and verification; hint = absolute offset
    pub fn to_ring(&self) -> Ring {
        Ring::new(
            self.members
                .iter()
                .map(|m| RingMember { public_key: m.public_key, hint: Some(m.absolute_offset) })
                .collect(),
        )
    }

    /// Lowest ring position holding `public_key`
    pub fn position(&self, public_key: &PublicKey) -> Option<usize> {
        self.members.iter().position(|m| m.public_key == *public_key)
    }
}

/// Resolves the ring of a key input against `store`
///
/// Errors: `NotFound` for offsets beyond the amount bucket or unknown
/// parents, `MissingOutput` when a parent does not contain the member key,
/// `InvalidEncoding` for overflowing offsets or undecodable member keys.
pub fn resolve_ring<S: BlockchainStore + ?Sized>(store: &S, input: &KeyInput) -> Result<ResolvedRing> {
    let absolute = relative_to_absolute(&input.key_offsets)?;

    let available = store.get_num_outputs(input.amount)?;
    if let Some(&beyond) = absolute.iter().find(|&&offset| offset >= available) {
        return Err(ScopeError::NotFound(format!(
            "offset {} in amount {} (bucket holds {})",
            beyond, input.amount, available
        )));
    }

    let outputs = store.get_output_keys(input.amount, &absolute)?;
    if outputs.len() != absolute.len() {
        return Err(ScopeError::StoreError(format!(
            "store returned {} outputs for {} offsets",
            outputs.len(),
            absolute.len()
        )));
    }

    let mut members = Vec::with_capacity(absolute.len());
    for (&offset, output) in absolute.iter().zip(outputs.iter()) {
        let public_key = PublicKey::from_bytes(&output.key)?;
        let location = store.get_output_tx(input.amount, offset)?;

        let parent = store.get_tx(&location.tx_hash).map_err(|e| match e {
            ScopeError::NotFound(msg) => ScopeError::MissingOutput(format!(
                "parent of offset {} in amount {}: {}",
                offset, input.amount, msg
            )),
            other => other,
        })?;

        let index_in_tx = parent
            .outputs()
            .iter()
            .position(|o| o.key == output.key)
            .ok_or_else(|| {
                ScopeError::MissingOutput(format!(
                    "key {} not among outputs of {}",
                    public_key,
                    hash_to_hex(&location.tx_hash)
                ))
            })?;

        if index_in_tx as u32 != location.index_in_tx {
            debug!(
                offset,
                stored = location.index_in_tx,
                matched = index_in_tx,
                "Duplicate output key in parent, using lowest index"
            );
        }

        let height = store.get_tx_block_height(&location.tx_hash)?;
        members.push(ResolvedMember {
            public_key,
            absolute_offset: offset,
            tx_hash: location.tx_hash,
            height,
            index_in_tx: index_in_tx as u32,
            tx_public_key: parent.tx_public_key(),
        });
    }

    debug!(amount = input.amount, ring_size = members.len(), "Resolved ring");
    Ok(ResolvedRing { amount: input.amount, members })
}
