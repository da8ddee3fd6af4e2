// src/report.rs

//! Inspection reports.
//!
//! A [`TxReport`] records, per key input, how far the input progressed
//! through `Unresolved → Resolved → Signed → Verified` and what was
//! observed on the way. It renders as text or serializes to JSON.

use ringscope_core::{ErrorKind, ScopeError};
use ringscope_crypto::{RingSignature, SignatureElement};
use serde::Serialize;
use std::fmt;

/// Progress of one input
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputStage {
    /// Ring not yet resolved
    Unresolved,
    /// Ring members and parents known
    Resolved,
    /// A fresh signature was generated with the wallet's key
    Signed,
    /// Every applicable verification ran
    Verified,
}

impl fmt::Display for InputStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputStage::Unresolved => "unresolved",
            InputStage::Resolved => "resolved",
            InputStage::Signed => "signed",
            InputStage::Verified => "verified",
        };
        f.write_str(name)
    }
}

/// Why an input stopped
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    /// Error kind
    pub kind: ErrorKind,
    /// Full message
    pub message: String,
}

impl From<&ScopeError> for FailureReport {
    fn from(err: &ScopeError) -> Self {
        Self { kind: err.kind(), message: err.to_string() }
    }
}

/// One `(c, r)` pair as hex
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignatureElementReport {
    /// Challenge share
    pub c: String,
    /// Response
    pub r: String,
}

impl From<&SignatureElement> for SignatureElementReport {
    fn from(element: &SignatureElement) -> Self {
        Self { c: hex::encode(element.c_bytes()), r: hex::encode(element.r_bytes()) }
    }
}

/// Hex rows of a signature
pub fn signature_rows(signature: &RingSignature) -> Vec<SignatureElementReport> {
    signature.elements().iter().map(SignatureElementReport::from).collect()
}

/// One resolved ring member
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemberReport {
    /// Position in the ring
    pub position: usize,
    /// Global index in the amount bucket
    pub absolute_offset: u64,
    /// One-time public key
    pub public_key: String,
    /// Parent transaction
    pub tx_hash: String,
    /// Parent block height
    pub height: u64,
    /// Output index in the parent
    pub index_in_tx: u32,
    /// Ownership, when a wallet was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_ours: Option<bool>,
}

/// Secret material, present only with unsafe diagnostics enabled
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SecretDiagnostics {
    /// Shared secret `D = 8·a·R` of the real output
    pub key_derivation: String,
    /// One-time secret key `x`
    pub ephemeral_secret: String,
}

/// What happened to one key input
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InputReport {
    /// Position among the transaction's inputs
    pub index: usize,
    /// Amount bucket
    pub amount: u64,
    /// Ring size
    pub ring_size: usize,
    /// Key image as stored on chain
    pub key_image: String,
    /// Relative key offsets as stored on chain
    pub key_offsets: Vec<u64>,
    /// Resolved members
    pub members: Vec<MemberReport>,
    /// On-chain signature rows
    pub onchain_signature: Vec<SignatureElementReport>,
    /// On-chain signature verification result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onchain_verified: Option<bool>,
    /// Position of the wallet's output, when found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_index: Option<usize>,
    /// Key image re-derived from the wallet keys
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_key_image: Option<String>,
    /// Freshly generated signature rows
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fresh_signature: Vec<SignatureElementReport>,
    /// Fresh signature verification over the prefix hash
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fresh_verified: Option<bool>,
    /// Fresh signature verification over a different message (expected false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fresh_verified_other_message: Option<bool>,
    /// Secrets, with unsafe diagnostics only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<SecretDiagnostics>,
    /// Furthest stage reached
    pub stage: InputStage,
    /// Failure that stopped the input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureReport>,
}

impl InputReport {
    /// Empty report for an input that has not been processed yet
    pub fn new(index: usize, amount: u64, key_image: String, key_offsets: Vec<u64>) -> Self {
        Self {
            index,
            amount,
            ring_size: key_offsets.len(),
            key_image,
            key_offsets,
            members: Vec::new(),
            onchain_signature: Vec::new(),
            onchain_verified: None,
            real_index: None,
            derived_key_image: None,
            fresh_signature: Vec::new(),
            fresh_verified: None,
            fresh_verified_other_message: None,
            secrets: None,
            stage: InputStage::Unresolved,
            error: None,
        }
    }

    /// True if the input finished without error
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.stage == InputStage::Verified
    }

    /// Records `err` as the reason this input stopped
    pub fn fail(&mut self, err: &ScopeError) {
        self.error = Some(FailureReport::from(err));
    }
}

/// Report over one transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TxReport {
    /// Transaction hash
    pub tx_hash: String,
    /// Prefix hash (the signed message)
    pub prefix_hash: String,
    /// Format version
    pub version: u64,
    /// Number of inputs, all kinds
    pub input_count: usize,
    /// Number of outputs
    pub output_count: usize,
    /// Transaction public key, if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_public_key: Option<String>,
    /// Outputs of this transaction payable to the wallet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_outputs: Option<Vec<usize>>,
    /// Per-input results, key inputs only
    pub inputs: Vec<InputReport>,
}

impl TxReport {
    /// True if every inspected input succeeded
    pub fn all_succeeded(&self) -> bool {
        self.inputs.iter().all(InputReport::succeeded)
    }

    /// Pretty JSON rendering
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "n/a",
    }
}

impl fmt::Display for TxReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transaction {}", self.tx_hash)?;
        writeln!(f, "  version:       {}", self.version)?;
        writeln!(f, "  prefix hash:   {}", self.prefix_hash)?;
        writeln!(f, "  inputs:        {}", self.input_count)?;
        writeln!(f, "  outputs:       {}", self.output_count)?;
        if let Some(key) = &self.tx_public_key {
            writeln!(f, "  tx public key: {}", key)?;
        }
        if let Some(owned) = &self.owned_outputs {
            writeln!(f, "  ours:          {:?}", owned)?;
        }

        for input in &self.inputs {
            writeln!(f)?;
            writeln!(
                f,
                "Input {}: amount {}, ring size {}, stage {}",
                input.index, input.amount, input.ring_size, input.stage
            )?;
            writeln!(f, "  key image:     {}", input.key_image)?;
            writeln!(f, "  key offsets:   {:?}", input.key_offsets)?;

            for member in &input.members {
                let marker = match member.is_ours {
                    Some(true) => " <- ours",
                    _ => "",
                };
                writeln!(
                    f,
                    "  [{:>2}] offset {:>8}  {}  tx {} (height {}, out {}){}",
                    member.position,
                    member.absolute_offset,
                    member.public_key,
                    member.tx_hash,
                    member.height,
                    member.index_in_tx,
                    marker
                )?;
            }

            if !input.onchain_signature.is_empty() {
                writeln!(f, "  on-chain signature:")?;
                for (i, row) in input.onchain_signature.iter().enumerate() {
                    writeln!(f, "    c[{}] = {}", i, row.c)?;
                    writeln!(f, "    r[{}] = {}", i, row.r)?;
                }
            }
            writeln!(f, "  on-chain verifies:   {}", yes_no(input.onchain_verified))?;

            if let Some(real) = input.real_index {
                writeln!(f, "  real signer index:   {}", real)?;
            }
            if let Some(image) = &input.derived_key_image {
                writeln!(f, "  derived key image:   {}", image)?;
            }
            if let Some(secrets) = &input.secrets {
                writeln!(f, "  UNSAFE derivation:   {}", secrets.key_derivation)?;
                writeln!(f, "  UNSAFE ephemeral x:  {}", secrets.ephemeral_secret)?;
            }
            if !input.fresh_signature.is_empty() {
                writeln!(f, "  fresh signature:")?;
                for (i, row) in input.fresh_signature.iter().enumerate() {
                    writeln!(f, "    c[{}] = {}", i, row.c)?;
                    writeln!(f, "    r[{}] = {}", i, row.r)?;
                }
                writeln!(f, "  fresh verifies:      {}", yes_no(input.fresh_verified))?;
                writeln!(
                    f,
                    "  fresh verifies other message: {}",
                    yes_no(input.fresh_verified_other_message)
                )?;
            }
            if let Some(error) = &input.error {
                writeln!(f, "  error ({}): {}", error.kind, error.message)?;
            }
        }

        Ok(())
    }
}
