// src/errors.rs

//! Error types for chain inspection.
//!
//! Every kind produced by the codec, the store or the resolver is kept
//! distinct all the way up to the driver's report; crypto failures map
//! onto the kind of the same name.

use ringscope_crypto::CryptoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for inspection operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// A scalar, point, hash, varint or transaction blob failed to decode
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Transaction hash, amount bucket or output offset absent from the store
    #[error("Not found: {0}")]
    NotFound(String),

    /// A ring member's parent transaction or output index could not be located
    #[error("Missing output: {0}")]
    MissingOutput(String),

    /// Ephemeral key recomputation disagreed with the stored output key
    #[error("Derivation mismatch: {0}")]
    DerivationMismatch(String),

    /// Signature row and ring disagree on the number of members
    #[error("Ring size mismatch: expected {expected}, got {actual}")]
    RingSizeMismatch {
        /// Number of key offsets in the input
        expected: usize,
        /// Number of signature elements (or resolved members)
        actual: usize,
    },

    /// An on-chain or freshly generated signature did not verify
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    /// Underlying store or snapshot I/O failed
    #[error("Store error: {0}")]
    StoreError(String),

    /// Real signer index outside the ring
    #[error("Invalid signer index {index} for ring of size {ring_size}")]
    InvalidSignerIndex {
        /// Requested index
        index: usize,
        /// Number of ring members
        ring_size: usize,
    },
}

/// Fieldless discriminant of [`ScopeError`], for reports and matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// See [`ScopeError::InvalidEncoding`]
    InvalidEncoding,
    /// See [`ScopeError::NotFound`]
    NotFound,
    /// See [`ScopeError::MissingOutput`]
    MissingOutput,
    /// See [`ScopeError::DerivationMismatch`]
    DerivationMismatch,
    /// See [`ScopeError::RingSizeMismatch`]
    RingSizeMismatch,
    /// See [`ScopeError::VerificationFailed`]
    VerificationFailed,
    /// See [`ScopeError::StoreError`]
    StoreError,
    /// See [`ScopeError::InvalidSignerIndex`]
    InvalidSignerIndex,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl ScopeError {
    /// The kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScopeError::InvalidEncoding(_) => ErrorKind::InvalidEncoding,
            ScopeError::NotFound(_) => ErrorKind::NotFound,
            ScopeError::MissingOutput(_) => ErrorKind::MissingOutput,
            ScopeError::DerivationMismatch(_) => ErrorKind::DerivationMismatch,
            ScopeError::RingSizeMismatch { .. } => ErrorKind::RingSizeMismatch,
            ScopeError::VerificationFailed(_) => ErrorKind::VerificationFailed,
            ScopeError::StoreError(_) => ErrorKind::StoreError,
            ScopeError::InvalidSignerIndex { .. } => ErrorKind::InvalidSignerIndex,
        }
    }
}

impl From<CryptoError> for ScopeError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidEncoding(msg) => ScopeError::InvalidEncoding(msg),
            CryptoError::DerivationMismatch(msg) => ScopeError::DerivationMismatch(msg),
            CryptoError::EmptyRing => ScopeError::RingSizeMismatch { expected: 1, actual: 0 },
            CryptoError::InvalidSignerIndex { index, ring_size } => {
                ScopeError::InvalidSignerIndex { index, ring_size }
            }
            CryptoError::RingSizeMismatch { ring, signatures } => {
                ScopeError::RingSizeMismatch { expected: ring, actual: signatures }
            }
            CryptoError::InvalidAddress(msg) => ScopeError::InvalidEncoding(msg),
        }
    }
}

impl From<serde_json::Error> for ScopeError {
    fn from(err: serde_json::Error) -> Self {
        ScopeError::StoreError(format!("snapshot JSON: {}", err))
    }
}

impl From<std::io::Error> for ScopeError {
    fn from(err: std::io::Error) -> Self {
        ScopeError::StoreError(err.to_string())
    }
}

/// Result type alias for inspection operations
pub type Result<T> = std::result::Result<T, ScopeError>;
