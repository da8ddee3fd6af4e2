// src/lib.rs

//! # Ringscope Crypto
//!
//! CryptoNote cryptography for inspecting pre-RingCT ring signatures.
//!
//! This crate provides the pure, I/O-free primitives the inspector is
//! built on:
//!
//! - **Hashing**: `cn_fast_hash` (Keccak-256), `Hs` and `Hp`
//! - **Curve**: canonical scalar/point decoding and ed25519 arithmetic
//! - **Keys**: view/spend keypairs, one-time keys and key images
//! - **Stealth addresses**: per-output key derivation and ownership checks
//! - **Ring signatures**: linkable ring signature generation and verification
//! - **Addresses**: standard base58 addresses with checksum
//!
//! ## Example Usage
//!
//! ```rust
//! use ringscope_crypto::keys::{generate_wallet_keys, SecretKey};
//! use ringscope_crypto::ring::{generate_ring_signature, verify_ring_signature, Ring};
//! use ringscope_crypto::stealth::{derive, derive_output_key};
//!
//! let mut rng = rand::thread_rng();
//! let (view, spend) = generate_wallet_keys(&mut rng);
//!
//! // A sender pays output 0 of a transaction with key R = r·G
//! let tx_secret = SecretKey::generate(&mut rng);
//! let output_key = derive_output_key(view.public(), spend.public(), &tx_secret, 0);
//!
//! // The wallet recovers the one-time keys and key image
//! let keys = derive(&view, &spend, &tx_secret.public_key(), 0).unwrap();
//! assert_eq!(keys.public, output_key);
//!
//! // Hide the output among a decoy and sign
//! let decoy = SecretKey::generate(&mut rng).public_key();
//! let ring = Ring::from_keys([decoy, output_key]);
//! let prefix_hash = [0x42u8; 32];
//! let sig = generate_ring_signature(&prefix_hash, &keys.key_image, &ring, &keys.secret, 1, &mut rng)
//!     .unwrap();
//! assert!(verify_ring_signature(&prefix_hash, &keys.key_image, &ring, &sig));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod address;
pub mod curve;
pub mod errors;
pub mod hash;
pub mod keys;
pub mod ring;
pub mod stealth;
pub mod varint;

// Re-export commonly used types
pub use crate::address::{Address, Network};
pub use crate::errors::{CryptoError, Result};
pub use crate::keys::{KeyImage, PublicKey, SecretKey, SpendKey, ViewKey};
pub use crate::ring::{Ring, RingMember, RingSignature, SignatureElement};
pub use crate::stealth::EphemeralKeys;

/// Standard hash output size (32 bytes / 256 bits)
pub const HASH_SIZE: usize = 32;

/// Compressed point / canonical scalar size
pub const KEY_SIZE: usize = 32;

/// Key image size (32 bytes)
pub const KEY_IMAGE_SIZE: usize = 32;

/// Size of one `(c, r)` pair on the wire
pub const SIGNATURE_ELEMENT_SIZE: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(HASH_SIZE, 32);
        assert_eq!(KEY_IMAGE_SIZE, KEY_SIZE);
        assert_eq!(SIGNATURE_ELEMENT_SIZE, 2 * KEY_SIZE);
    }
}
