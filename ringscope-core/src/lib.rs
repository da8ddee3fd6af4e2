// src/lib.rs

//! # Ringscope Core
//!
//! Chain-facing half of the ring-signature inspector for pre-RingCT
//! CryptoNote transactions.
//!
//! ## Architecture
//!
//! - **Codec**: bit-exact transaction parsing/serialization and the prefix
//!   hash every ring signature signs
//! - **Store**: the read-only queries the inspector needs, an in-memory
//!   implementation and a JSON snapshot loader
//! - **Resolver**: relative key offsets to ring members and their parent
//!   transactions
//!
//! Nothing here performs process I/O beyond reading snapshot files.
//!
//! ## Example Usage
//!
//! ```rust
//! use ringscope_core::{Transaction, TransactionPrefix, TxIn, TxOut};
//!
//! let tx = Transaction {
//!     prefix: TransactionPrefix {
//!         version: 1,
//!         unlock_time: 60,
//!         inputs: vec![TxIn::Gen { height: 0 }],
//!         outputs: vec![TxOut { amount: 1000, key: [0x58; 32] }],
//!         extra: vec![],
//!     },
//!     signatures: vec![Default::default()],
//!     rct_remainder: vec![],
//! };
//!
//! let blob = tx.to_bytes();
//! let parsed = Transaction::from_bytes(&blob).unwrap();
//! assert_eq!(parsed.hash(), tx.hash());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod errors;
pub mod extra;
pub mod resolver;
pub mod snapshot;
pub mod storage;
pub mod transaction;
#[cfg(any(test, feature = "test-utils"))]
pub mod transaction_builder;
pub mod types;

// Re-export crypto for convenience
pub use ringscope_crypto;

// Re-export commonly used types
pub use crate::errors::{ErrorKind, Result, ScopeError};
pub use crate::resolver::{relative_to_absolute, resolve_ring, ResolvedMember, ResolvedRing};
pub use crate::snapshot::{open_store, ChainSnapshot};
pub use crate::storage::{BlockchainStore, MemoryStore, OutputData, OutputLocation};
pub use crate::transaction::{KeyInput, Transaction, TransactionPrefix, TxIn, TxOut};
pub use crate::types::{hash_to_hex, hex_to_hash, Hash, Height};

#[cfg(any(test, feature = "test-utils"))]
pub use crate::transaction_builder::{ChainBuilder, OwnedOutput, TransactionBuilder};

/// Only version 1 transactions carry CryptoNote ring signatures
pub const RING_SIGNATURE_TX_VERSION: u64 = 1;

/// Default location of the chain snapshot
pub const DEFAULT_SNAPSHOT_PATH: &str = ".ringscope/chain.json";
