// src/lib.rs

//! # Ringscope
//!
//! Walks through the CryptoNote ring signatures of one transaction in a
//! local chain snapshot.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           ringscope (binary)            │
//! ├─────────────────────────────────────────┤
//! │  CLI  │  Config  │  Wallet  │  Report   │
//! ├───────┴──────────┴──────────┴───────────┤
//! │              Inspector                  │
//! ├─────────────────────────────────────────┤
//! │  Codec │ Store │ Resolver               │
//! │  (ringscope-core)                       │
//! ├─────────────────────────────────────────┤
//! │  Keys │ Stealth │ Ring signatures       │
//! │  (ringscope-crypto)                     │
//! └─────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod errors;
pub mod inspector;
pub mod report;
pub mod wallet;

// Re-export commonly used types
pub use crate::cli::{parse_error_exit_code, run, run_with_rng, Cli};
pub use crate::config::{InspectorConfig, OutputFormat};
pub use crate::errors::{CliError, Result};
pub use crate::inspector::Inspector;
pub use crate::report::{InputReport, InputStage, TxReport};
pub use crate::wallet::Wallet;

/// Inspector version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
