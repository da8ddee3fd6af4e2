// src/hash.rs

//! CryptoNote hash functions.
//!
//! `cn_fast_hash` is the original (pre-NIST padding) Keccak-256. The two
//! derived maps used everywhere in the protocol are built on it:
//!
//! - `Hs(bytes)`: Keccak-256 reduced modulo the group order ℓ
//! - `Hp(bytes)`: Keccak-256 followed by the reference `hash_to_ec` map,
//!   cofactor cleared

use crate::errors::{CryptoError, Result};
use crate::HASH_SIZE;
use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use sha3::{Digest, Keccak256};

/// Computes the CryptoNote fast hash (Keccak-256) of input data
///
/// # Example
/// ```
/// use ringscope_crypto::hash::keccak_hash;
///
/// let hash = keccak_hash(b"");
/// assert_eq!(
///     hex::encode(hash),
///     "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
/// );
/// ```
pub fn keccak_hash(data: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&result[..HASH_SIZE]);
    out
}

/// Hashes multiple data chunks together
///
/// Equivalent to hashing the concatenation, without allocating it.
pub fn hash_chunks(chunks: &[&[u8]]) -> [u8; HASH_SIZE] {
    let mut hasher = Keccak256::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    let result = hasher.finalize();
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&result[..HASH_SIZE]);
    out
}

/// `Hs`: Keccak-256 of the input, reduced modulo ℓ (`sc_reduce32`)
pub fn hash_to_scalar(data: &[u8]) -> Scalar {
    Scalar::from_bytes_mod_order(keccak_hash(data))
}

/// `Hp`: the CryptoNote `hash_to_ec` map applied to a 32-byte encoding
///
/// The result always lies in the prime-order subgroup.
pub fn hash_to_point(bytes: &[u8; 32]) -> EdwardsPoint {
    monero_generators::hash_to_point(*bytes)
}

/// Converts a hash to hexadecimal string
pub fn hash_to_hex(hash: &[u8; HASH_SIZE]) -> String {
    hex::encode(hash)
}

/// Parses a 64-character hexadecimal string into a 32-byte value
pub fn hex_to_hash(hex_str: &str) -> Result<[u8; HASH_SIZE]> {
    if hex_str.len() != HASH_SIZE * 2 {
        return Err(CryptoError::InvalidEncoding(format!(
            "Invalid hex length: expected {}, got {}",
            HASH_SIZE * 2,
            hex_str.len()
        )));
    }

    let bytes = hex::decode(hex_str)
        .map_err(|e| CryptoError::InvalidEncoding(format!("Hex decode failed: {}", e)))?;

    let mut hash = [0u8; HASH_SIZE];
    hash.copy_from_slice(&bytes);
    Ok(hash)
}
