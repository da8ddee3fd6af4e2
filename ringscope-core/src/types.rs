// src/types.rs

//! Core type definitions shared by the codec, store and resolver

use crate::errors::Result;
pub use ringscope_crypto::HASH_SIZE;

/// 32-byte hash type (transaction hashes, prefix hashes)
pub type Hash = [u8; HASH_SIZE];

/// Block height
pub type Height = u64;

/// Converts hash to hex using ringscope-crypto
pub fn hash_to_hex(hash: &Hash) -> String {
    ringscope_crypto::hash::hash_to_hex(hash)
}

/// Parses a 64-character hex string into a hash
pub fn hex_to_hash(hex_str: &str) -> Result<Hash> {
    Ok(ringscope_crypto::hash::hex_to_hash(hex_str)?)
}

/// Keccak-256 of `data`
pub fn hash_bytes(data: &[u8]) -> Hash {
    ringscope_crypto::hash::keccak_hash(data)
}
