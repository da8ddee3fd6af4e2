// src/inspector.rs

//! Per-transaction orchestration.
//!
//! For every key input the inspector resolves the ring, verifies the
//! on-chain signature and, given wallet keys, finds the real signer,
//! reproduces its key image and signs the same prefix again. Inputs are
//! processed one after another; a failure stops only the input it
//! belongs to.

use crate::errors::{CliError, Result};
use crate::report::{
    signature_rows, InputReport, InputStage, MemberReport, SecretDiagnostics, TxReport,
};
use crate::wallet::Wallet;
use rand::{CryptoRng, RngCore};
use ringscope_core::{
    hash_to_hex, resolve_ring, BlockchainStore, Hash, KeyInput, ResolvedRing, ScopeError,
    Transaction, RING_SIGNATURE_TX_VERSION,
};
use ringscope_crypto::ring::{generate_ring_signature, verify_ring_signature};
use ringscope_crypto::stealth::{derive_for_output, generate_key_derivation, is_output_ours};
use tracing::{debug, info, warn};

/// Walks the ring signatures of one transaction
pub struct Inspector<'a, S: BlockchainStore + ?Sized> {
    /// Chain the transaction and its ring members are read from
    store: &'a S,

    /// Keys of the wallet that made the transaction, if known
    wallet: Option<&'a Wallet>,

    /// Include secret material in reports and logs
    unsafe_diagnostics: bool,
}

impl<'a, S: BlockchainStore + ?Sized> Inspector<'a, S> {
    /// Creates an inspector that only checks on-chain signatures
    pub fn new(store: &'a S) -> Self {
        Self { store, wallet: None, unsafe_diagnostics: false }
    }

    /// Attaches wallet keys
    pub fn with_wallet(mut self, wallet: &'a Wallet) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Enables printing of secrets
    pub fn with_unsafe_diagnostics(mut self, enabled: bool) -> Self {
        self.unsafe_diagnostics = enabled;
        self
    }

    /// Inspects transaction `tx_hash`, all key inputs or only `only_input`
    ///
    /// Setup problems (unknown transaction, RingCT transaction, bad input
    /// index) are returned as errors; per-input failures are recorded in
    /// the report.
    pub fn inspect<R: RngCore + CryptoRng>(
        &self,
        tx_hash: &Hash,
        only_input: Option<usize>,
        rng: &mut R,
    ) -> Result<TxReport> {
        info!(tx = %hash_to_hex(tx_hash), "Inspecting transaction");

        let tx = self.store.get_tx(tx_hash)?;
        if tx.version() != RING_SIGNATURE_TX_VERSION {
            return Err(ScopeError::InvalidEncoding(format!(
                "transaction version {} does not carry CryptoNote ring signatures",
                tx.version()
            ))
            .into());
        }

        let selected = self.select_inputs(&tx, only_input)?;
        let prefix_hash = tx.prefix_hash();

        let owned_outputs = self
            .wallet
            .map(|wallet| tx.owned_outputs(wallet.view().secret(), wallet.spend_public()));

        let mut inputs = Vec::with_capacity(selected.len());
        for (index, input) in selected {
            let mut report = InputReport::new(
                index,
                input.amount,
                hex::encode(input.key_image),
                input.key_offsets.clone(),
            );
            match self.inspect_input(&tx, &prefix_hash, index, input, &mut report, rng) {
                Ok(()) => info!(input = index, stage = %report.stage, "Input verified"),
                Err(e) => {
                    warn!(input = index, stage = %report.stage, error = %e, "Input failed");
                    report.fail(&e);
                }
            }
            inputs.push(report);
        }

        Ok(TxReport {
            tx_hash: hash_to_hex(tx_hash),
            prefix_hash: hash_to_hex(&prefix_hash),
            version: tx.version(),
            input_count: tx.inputs().len(),
            output_count: tx.outputs().len(),
            tx_public_key: tx.tx_public_key().map(|key| key.to_hex()),
            owned_outputs,
            inputs,
        })
    }

    fn select_inputs<'t>(
        &self,
        tx: &'t Transaction,
        only_input: Option<usize>,
    ) -> Result<Vec<(usize, &'t KeyInput)>> {
        match only_input {
            Some(index) => {
                let input = tx.inputs().get(index).ok_or_else(|| {
                    CliError::InvalidArgument(format!(
                        "--idx {} but transaction has {} inputs",
                        index,
                        tx.inputs().len()
                    ))
                })?;
                let key_input = input.as_key_input().ok_or_else(|| {
                    CliError::InvalidArgument(format!("input {} is a coinbase input", index))
                })?;
                Ok(vec![(index, key_input)])
            }
            None => Ok(tx
                .inputs()
                .iter()
                .enumerate()
                .filter_map(|(i, input)| input.as_key_input().map(|k| (i, k)))
                .collect()),
        }
    }

    fn inspect_input<R: RngCore + CryptoRng>(
        &self,
        tx: &Transaction,
        prefix_hash: &Hash,
        index: usize,
        input: &KeyInput,
        report: &mut InputReport,
        rng: &mut R,
    ) -> ringscope_core::Result<()> {
        let signature = tx.signature(index).ok_or_else(|| {
            ScopeError::InvalidEncoding(format!("input {} has no signature", index))
        })?;
        report.onchain_signature = signature_rows(signature);
        if signature.len() != input.ring_size() {
            return Err(ScopeError::RingSizeMismatch {
                expected: input.ring_size(),
                actual: signature.len(),
            });
        }

        let resolved = resolve_ring(self.store, input)?;
        report.members = self.member_reports(&resolved);
        report.stage = InputStage::Resolved;

        let key_image = input.key_image()?;
        let ring = resolved.to_ring();
        signature.check_shape(&ring)?;

        let onchain = verify_ring_signature(prefix_hash, &key_image, &ring, signature);
        report.onchain_verified = Some(onchain);
        debug!(input = index, verified = onchain, "Checked on-chain signature");
        if !onchain {
            return Err(ScopeError::VerificationFailed(format!(
                "on-chain signature of input {}",
                index
            )));
        }

        let wallet = match self.wallet {
            Some(wallet) => wallet,
            None => {
                report.stage = InputStage::Verified;
                return Ok(());
            }
        };

        let ours: Vec<usize> = report
            .members
            .iter()
            .filter(|m| m.is_ours == Some(true))
            .map(|m| m.position)
            .collect();
        let first = *ours.first().ok_or_else(|| {
            ScopeError::DerivationMismatch(format!(
                "no member of ring {} belongs to the wallet",
                index
            ))
        })?;
        if ours.len() > 1 {
            warn!(input = index, positions = ?ours, "Several ring members belong to the wallet");
        }

        let spend = match wallet.spend() {
            Some(spend) => spend,
            None => {
                report.real_index = Some(first);
                report.stage = InputStage::Verified;
                return Ok(());
            }
        };

        // With several candidates the one reproducing the on-chain image is the signer
        let mut chosen = None;
        for &position in &ours {
            let member = &resolved.members[position];
            let tx_public_key = member.tx_public_key.ok_or_else(|| {
                ScopeError::MissingOutput(format!(
                    "parent {} has no transaction public key",
                    hash_to_hex(&member.tx_hash)
                ))
            })?;
            let keys = derive_for_output(
                wallet.view(),
                spend,
                &tx_public_key,
                u64::from(member.index_in_tx),
                &member.public_key,
            )?;
            let matches = keys.key_image == key_image;
            if matches || chosen.is_none() {
                chosen = Some((position, tx_public_key, keys));
            }
            if matches {
                break;
            }
        }
        let (real, tx_public_key, keys) = chosen.ok_or_else(|| {
            ScopeError::DerivationMismatch(format!("no signer candidate in ring {}", index))
        })?;
        report.real_index = Some(real);
        report.derived_key_image = Some(keys.key_image.to_hex());

        if self.unsafe_diagnostics {
            let derivation = generate_key_derivation(&tx_public_key, wallet.view().secret());
            let secrets = SecretDiagnostics {
                key_derivation: derivation.expose_hex(),
                ephemeral_secret: keys.secret.expose_hex(),
            };
            debug!(
                input = index,
                derivation = %secrets.key_derivation,
                ephemeral_secret = %secrets.ephemeral_secret,
                "UNSAFE secret diagnostics"
            );
            report.secrets = Some(secrets);
        }

        if keys.key_image != key_image {
            return Err(ScopeError::DerivationMismatch(format!(
                "derived key image {} differs from on-chain {}",
                keys.key_image, key_image
            )));
        }

        let fresh = generate_ring_signature(prefix_hash, &keys.key_image, &ring, &keys.secret, real, rng)?;
        report.fresh_signature = signature_rows(&fresh);
        report.stage = InputStage::Signed;

        let fresh_ok = verify_ring_signature(prefix_hash, &keys.key_image, &ring, &fresh);
        let mut other_message = *prefix_hash;
        other_message[0] ^= 0x01;
        let other_ok = verify_ring_signature(&other_message, &keys.key_image, &ring, &fresh);
        report.fresh_verified = Some(fresh_ok);
        report.fresh_verified_other_message = Some(other_ok);

        if !fresh_ok {
            return Err(ScopeError::VerificationFailed(format!(
                "fresh signature of input {}",
                index
            )));
        }
        if other_ok {
            return Err(ScopeError::VerificationFailed(format!(
                "fresh signature of input {} also verifies a different message",
                index
            )));
        }

        report.stage = InputStage::Verified;
        Ok(())
    }

    fn member_reports(&self, resolved: &ResolvedRing) -> Vec<MemberReport> {
        resolved
            .members
            .iter()
            .enumerate()
            .map(|(position, member)| {
                let is_ours = self.wallet.map(|wallet| {
                    member.tx_public_key.map_or(false, |tx_public_key| {
                        is_output_ours(
                            wallet.view().secret(),
                            wallet.spend_public(),
                            &tx_public_key,
                            u64::from(member.index_in_tx),
                            &member.public_key,
                        )
                    })
                });
                MemberReport {
                    position,
                    absolute_offset: member.absolute_offset,
                    public_key: member.public_key.to_hex(),
                    tx_hash: hash_to_hex(&member.tx_hash),
                    height: member.height,
                    index_in_tx: member.index_in_tx,
                    is_ours,
                }
            })
            .collect()
    }
}
