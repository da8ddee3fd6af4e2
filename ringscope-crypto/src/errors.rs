// src/errors.rs

//! Error types for cryptographic operations.
//!
//! Every failure of a primitive is reported with its own kind so callers
//! can surface it verbatim instead of folding it into a generic bucket.

use thiserror::Error;

/// Main error type for cryptographic operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// A scalar, point or hash failed canonicality or decoding
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Ephemeral key recomputation disagreed with the expected public key
    #[error("Derivation mismatch: {0}")]
    DerivationMismatch(String),

    /// A ring signature was requested over an empty ring
    #[error("Ring must contain at least one member")]
    EmptyRing,

    /// The real signer index is outside the ring
    #[error("Invalid signer index {index} for ring of size {ring_size}")]
    InvalidSignerIndex {
        /// Requested index
        index: usize,
        /// Number of ring members
        ring_size: usize,
    },

    /// Ring and signature disagree on the number of members
    #[error("Ring size mismatch: ring has {ring} members, signature has {signatures} elements")]
    RingSizeMismatch {
        /// Number of ring members
        ring: usize,
        /// Number of (c, r) pairs
        signatures: usize,
    },

    /// Address failed base58, checksum or prefix validation
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Result type alias for cryptographic operations
pub type Result<T> = std::result::Result<T, CryptoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CryptoError::InvalidEncoding("scalar not reduced".to_string());
        assert_eq!(format!("{}", err), "Invalid encoding: scalar not reduced");

        let err = CryptoError::InvalidSignerIndex { index: 11, ring_size: 11 };
        assert_eq!(format!("{}", err), "Invalid signer index 11 for ring of size 11");
    }

    #[test]
    fn test_error_clone() {
        let err1 = CryptoError::DerivationMismatch("wrong wallet".to_string());
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
