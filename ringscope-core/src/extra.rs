// src/extra.rs

//! The transaction `extra` field.
//!
//! `extra` is a sequence of tagged fields. Only the transaction public key
//! matters for inspection, but the other well-known fields are parsed so
//! that a key appearing after them is still found. Parsing stops at the
//! first unknown or malformed field, keeping what was read so far.

use ringscope_crypto::varint::{read_varint, write_varint};
use ringscope_crypto::PublicKey;

const TAG_PADDING: u8 = 0x00;
const TAG_PUBKEY: u8 = 0x01;
const TAG_NONCE: u8 = 0x02;
const TAG_MERGE_MINING: u8 = 0x03;
const TAG_ADDITIONAL_PUBKEYS: u8 = 0x04;
const TAG_MINERGATE: u8 = 0xde;

/// Largest padding run accepted
pub const MAX_PADDING: usize = 255;

/// One parsed `extra` field
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtraField {
    /// Zero padding of the given length (tag byte included)
    Padding(usize),
    /// Transaction public key `R`, raw
    PublicKey([u8; 32]),
    /// Opaque nonce (payment ids live here)
    Nonce(Vec<u8>),
    /// Merge-mining tag: depth and merkle root
    MergeMining {
        /// Merkle tree depth
        depth: u64,
        /// Merkle root
        merkle_root: [u8; 32],
    },
    /// Per-output public keys used by subaddress payments
    AdditionalPublicKeys(Vec<[u8; 32]>),
    /// Opaque MinerGate data
    MinerGate(Vec<u8>),
}

fn take<'a>(input: &mut &'a [u8], len: usize) -> Option<&'a [u8]> {
    if input.len() < len {
        return None;
    }
    let (head, tail) = input.split_at(len);
    *input = tail;
    Some(head)
}

fn take32(input: &mut &[u8]) -> Option<[u8; 32]> {
    let bytes = take(input, 32)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(bytes);
    Some(out)
}

fn parse_field(tag: u8, input: &mut &[u8]) -> Option<ExtraField> {
    match tag {
        TAG_PADDING => {
            // padding runs to the end of extra and must be all zeros
            let len = input.len();
            if len + 1 > MAX_PADDING || input.iter().any(|&b| b != 0) {
                return None;
            }
            *input = &input[len..];
            Some(ExtraField::Padding(len + 1))
        }
        TAG_PUBKEY => take32(input).map(ExtraField::PublicKey),
        TAG_NONCE => {
            let len = read_varint(input).ok()? as usize;
            take(input, len).map(|b| ExtraField::Nonce(b.to_vec()))
        }
        TAG_MERGE_MINING => {
            let len = read_varint(input).ok()? as usize;
            let mut body = take(input, len)?;
            let depth = read_varint(&mut body).ok()?;
            let merkle_root = take32(&mut body)?;
            Some(ExtraField::MergeMining { depth, merkle_root })
        }
        TAG_ADDITIONAL_PUBKEYS => {
            let count = read_varint(input).ok()? as usize;
            if count > input.len() / 32 {
                return None;
            }
            let keys = (0..count).map(|_| take32(input)).collect::<Option<Vec<_>>>()?;
            Some(ExtraField::AdditionalPublicKeys(keys))
        }
        TAG_MINERGATE => {
            let len = read_varint(input).ok()? as usize;
            take(input, len).map(|b| ExtraField::MinerGate(b.to_vec()))
        }
        _ => None,
    }
}

/// Parses as many fields as possible from `extra`
pub fn parse_extra(extra: &[u8]) -> Vec<ExtraField> {
    let mut input = extra;
    let mut fields = Vec::new();

    while let Some((&tag, rest)) = input.split_first() {
        input = rest;
        match parse_field(tag, &mut input) {
            Some(field) => fields.push(field),
            None => break,
        }
    }

    fields
}

/// The first transaction public key in `extra`, if present and valid
pub fn tx_public_key(extra: &[u8]) -> Option<PublicKey> {
    parse_extra(extra).into_iter().find_map(|field| match field {
        ExtraField::PublicKey(bytes) => PublicKey::from_bytes(&bytes).ok(),
        _ => None,
    })
}

/// Serializes fields back into an `extra` blob
pub fn write_extra(fields: &[ExtraField]) -> Vec<u8> {
    let mut out = Vec::new();
    for field in fields {
        match field {
            ExtraField::Padding(len) => {
                out.extend(std::iter::repeat(0u8).take(*len));
            }
            ExtraField::PublicKey(key) => {
                out.push(TAG_PUBKEY);
                out.extend_from_slice(key);
            }
            ExtraField::Nonce(data) => {
                out.push(TAG_NONCE);
                write_varint(data.len() as u64, &mut out);
                out.extend_from_slice(data);
            }
            ExtraField::MergeMining { depth, merkle_root } => {
                let mut body = Vec::new();
                write_varint(*depth, &mut body);
                body.extend_from_slice(merkle_root);
                out.push(TAG_MERGE_MINING);
                write_varint(body.len() as u64, &mut out);
                out.extend_from_slice(&body);
            }
            ExtraField::AdditionalPublicKeys(keys) => {
                out.push(TAG_ADDITIONAL_PUBKEYS);
                write_varint(keys.len() as u64, &mut out);
                for key in keys {
                    out.extend_from_slice(key);
                }
            }
            ExtraField::MinerGate(data) => {
                out.push(TAG_MINERGATE);
                write_varint(data.len() as u64, &mut out);
                out.extend_from_slice(data);
            }
        }
    }
    out
}
