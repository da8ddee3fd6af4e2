// src/transaction.rs

//! CryptoNote transaction model and wire codec.
//!
//! Layout of the prefix:
//!
//! ```text
//! version: varint || unlock_time: varint
//! || vin:  varint count || (tag || body)*
//! || vout: varint count || (amount: varint || tag || key)*
//! || extra: varint len || bytes
//! ```
//!
//! Version 1 transactions carry one `(c, r)` pair per ring member of every
//! key input right after the prefix. Version 2 (RingCT) transactions keep
//! everything after the prefix as an opaque remainder.

use crate::errors::{Result, ScopeError};
use crate::extra;
use crate::types::{hash_bytes, Hash};
use ringscope_crypto::hash::hash_chunks;
use ringscope_crypto::keys::{KeyImage, PublicKey, SecretKey};
use ringscope_crypto::ring::RingSignature;
use ringscope_crypto::stealth::is_output_ours;
use ringscope_crypto::varint::{read_varint, write_varint};
use ringscope_crypto::SIGNATURE_ELEMENT_SIZE;

const TXIN_GEN: u8 = 0xff;
const TXIN_TO_SCRIPT: u8 = 0x00;
const TXIN_TO_SCRIPTHASH: u8 = 0x01;
const TXIN_TO_KEY: u8 = 0x02;
const TXOUT_TO_KEY: u8 = 0x02;

/// RingCT type byte of a transaction without RingCT data
const RCT_TYPE_NULL: u8 = 0x00;

/// A `txin_to_key` input: spends one member of a ring of same-amount outputs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyInput {
    /// Amount bucket the ring is drawn from
    pub amount: u64,
    /// Relative offsets into the amount's global output index
    pub key_offsets: Vec<u64>,
    /// Raw key image; decoded on use
    pub key_image: [u8; 32],
}

impl KeyInput {
    /// Number of ring members
    pub fn ring_size(&self) -> usize {
        self.key_offsets.len()
    }

    /// Decodes the key image
    pub fn key_image(&self) -> Result<KeyImage> {
        Ok(KeyImage::from_bytes(&self.key_image)?)
    }
}

/// Transaction input
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxIn {
    /// Coinbase input creating new coins at `height`
    Gen {
        /// Block height
        height: u64,
    },
    /// Ring-signed spend
    ToKey(KeyInput),
}

impl TxIn {
    /// The key input, if this is one
    pub fn as_key_input(&self) -> Option<&KeyInput> {
        match self {
            TxIn::ToKey(input) => Some(input),
            TxIn::Gen { .. } => None,
        }
    }

    /// Number of signature elements this input carries
    pub fn signature_count(&self) -> usize {
        match self {
            TxIn::Gen { .. } => 0,
            TxIn::ToKey(input) => input.ring_size(),
        }
    }
}

/// Transaction output paying a one-time key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOut {
    /// Amount in atomic units (zero for RingCT outputs)
    pub amount: u64,
    /// Raw one-time public key `P`; decoded on use
    pub key: [u8; 32],
}

impl TxOut {
    /// Decodes the one-time public key
    pub fn public_key(&self) -> Result<PublicKey> {
        Ok(PublicKey::from_bytes(&self.key)?)
    }
}

/// The unsigned body of a transaction
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct TransactionPrefix {
    /// Format version
    pub version: u64,
    /// Height or timestamp before which outputs are locked
    pub unlock_time: u64,
    /// Inputs
    pub inputs: Vec<TxIn>,
    /// Outputs
    pub outputs: Vec<TxOut>,
    /// Raw extra field
    pub extra: Vec<u8>,
}

/// Byte cursor over a transaction blob
struct Reader<'a> {
    input: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    fn varint(&mut self) -> Result<u64> {
        Ok(read_varint(&mut self.input)?)
    }

    /// Reads a count and checks that at least `min_item_len` bytes per
    /// item remain, so a hostile count cannot force a huge allocation
    fn count(&mut self, min_item_len: usize, what: &str) -> Result<usize> {
        let count = self.varint()?;
        let available = (self.input.len() / min_item_len.max(1)) as u64;
        if count > available {
            return Err(ScopeError::InvalidEncoding(format!(
                "{} count {} exceeds remaining data",
                what, count
            )));
        }
        Ok(count as usize)
    }

    fn byte(&mut self) -> Result<u8> {
        let (&byte, rest) = self
            .input
            .split_first()
            .ok_or_else(|| ScopeError::InvalidEncoding("unexpected end of transaction".to_string()))?;
        self.input = rest;
        Ok(byte)
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.input.len() < len {
            return Err(ScopeError::InvalidEncoding(format!(
                "needed {} bytes, {} left",
                len,
                self.input.len()
            )));
        }
        let (head, tail) = self.input.split_at(len);
        self.input = tail;
        Ok(head)
    }

    fn bytes32(&mut self) -> Result<[u8; 32]> {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.bytes(32)?);
        Ok(out)
    }

    fn remaining(&self) -> &'a [u8] {
        self.input
    }

    fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}

impl TransactionPrefix {
    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let version = reader.varint()?;
        if version == 0 || version > 2 {
            return Err(ScopeError::InvalidEncoding(format!("unsupported version {}", version)));
        }
        let unlock_time = reader.varint()?;

        let input_count = reader.count(2, "input")?;
        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            inputs.push(Self::read_input(reader)?);
        }

        let output_count = reader.count(34, "output")?;
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            let amount = reader.varint()?;
            match reader.byte()? {
                TXOUT_TO_KEY => outputs.push(TxOut { amount, key: reader.bytes32()? }),
                tag => {
                    return Err(ScopeError::InvalidEncoding(format!(
                        "unsupported output target 0x{:02x}",
                        tag
                    )))
                }
            }
        }

        let extra_len = reader.count(1, "extra byte")?;
        let extra = reader.bytes(extra_len)?.to_vec();

        Ok(Self { version, unlock_time, inputs, outputs, extra })
    }

    fn read_input(reader: &mut Reader<'_>) -> Result<TxIn> {
        match reader.byte()? {
            TXIN_GEN => Ok(TxIn::Gen { height: reader.varint()? }),
            TXIN_TO_KEY => {
                let amount = reader.varint()?;
                let offset_count = reader.count(1, "key offset")?;
                let mut key_offsets = Vec::with_capacity(offset_count);
                for _ in 0..offset_count {
                    key_offsets.push(reader.varint()?);
                }
                let key_image = reader.bytes32()?;
                Ok(TxIn::ToKey(KeyInput { amount, key_offsets, key_image }))
            }
            tag @ (TXIN_TO_SCRIPT | TXIN_TO_SCRIPTHASH) => Err(ScopeError::InvalidEncoding(
                format!("script input 0x{:02x} is not supported", tag),
            )),
            tag => Err(ScopeError::InvalidEncoding(format!("unknown input tag 0x{:02x}", tag))),
        }
    }

    /// Parses a standalone prefix; trailing bytes are an error
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let prefix = Self::read(&mut reader)?;
        if !reader.is_empty() {
            return Err(ScopeError::InvalidEncoding(format!(
                "{} trailing bytes after prefix",
                reader.remaining().len()
            )));
        }
        Ok(prefix)
    }

    /// Appends the canonical prefix encoding to `out`
    pub fn write(&self, out: &mut Vec<u8>) {
        write_varint(self.version, out);
        write_varint(self.unlock_time, out);

        write_varint(self.inputs.len() as u64, out);
        for input in &self.inputs {
            match input {
                TxIn::Gen { height } => {
                    out.push(TXIN_GEN);
                    write_varint(*height, out);
                }
                TxIn::ToKey(key_input) => {
                    out.push(TXIN_TO_KEY);
                    write_varint(key_input.amount, out);
                    write_varint(key_input.key_offsets.len() as u64, out);
                    for offset in &key_input.key_offsets {
                        write_varint(*offset, out);
                    }
                    out.extend_from_slice(&key_input.key_image);
                }
            }
        }

        write_varint(self.outputs.len() as u64, out);
        for output in &self.outputs {
            write_varint(output.amount, out);
            out.push(TXOUT_TO_KEY);
            out.extend_from_slice(&output.key);
        }

        write_varint(self.extra.len() as u64, out);
        out.extend_from_slice(&self.extra);
    }

    /// Canonical prefix encoding
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    /// The prefix hash: the message every ring signature in the transaction signs
    pub fn hash(&self) -> Hash {
        hash_bytes(&self.to_bytes())
    }

    /// Transaction public key `R` from `extra`
    pub fn tx_public_key(&self) -> Option<PublicKey> {
        extra::tx_public_key(&self.extra)
    }
}

/// A complete transaction: prefix, per-input signatures and, for RingCT
/// transactions, the undecoded remainder
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Transaction {
    /// Unsigned body
    pub prefix: TransactionPrefix,
    /// One signature per input, positionally matched (version 1 only)
    pub signatures: Vec<RingSignature>,
    /// Bytes after the prefix of a version 2 transaction
    pub rct_remainder: Vec<u8>,
}

impl Transaction {
    /// Parses a complete transaction blob
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let prefix = TransactionPrefix::read(&mut reader)?;

        if prefix.version >= 2 {
            let rct_remainder = reader.remaining().to_vec();
            return Ok(Self { prefix, signatures: Vec::new(), rct_remainder });
        }

        let mut signatures = Vec::with_capacity(prefix.inputs.len());
        for input in &prefix.inputs {
            let n = input.signature_count();
            let bytes = reader.bytes(n * SIGNATURE_ELEMENT_SIZE)?;
            signatures.push(RingSignature::from_bytes(bytes, n)?);
        }

        if !reader.is_empty() {
            return Err(ScopeError::InvalidEncoding(format!(
                "{} trailing bytes after signatures",
                reader.remaining().len()
            )));
        }

        Ok(Self { prefix, signatures, rct_remainder: Vec::new() })
    }

    /// Parses a hex-encoded transaction blob
    pub fn from_hex(blob: &str) -> Result<Self> {
        let bytes = hex::decode(blob.trim())
            .map_err(|e| ScopeError::InvalidEncoding(format!("transaction hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Serializes the transaction; byte-exact for parsed blobs
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.prefix.to_bytes();
        if self.prefix.version >= 2 {
            out.extend_from_slice(&self.rct_remainder);
        } else {
            for signature in &self.signatures {
                out.extend_from_slice(&signature.to_bytes());
            }
        }
        out
    }

    /// Prefix hash (the signed message)
    pub fn prefix_hash(&self) -> Hash {
        self.prefix.hash()
    }

    /// Transaction hash, when it can be computed from the blob alone
    ///
    /// Version 1: Keccak of the whole blob. Version 2 without RingCT data
    /// (coinbase): `H(prefix_hash || H(rct_type) || 0^32)`. Any other
    /// version 2 transaction needs its hash from the store.
    pub fn hash(&self) -> Option<Hash> {
        match self.prefix.version {
            1 => Some(hash_bytes(&self.to_bytes())),
            _ if self.rct_remainder == [RCT_TYPE_NULL] => {
                let base_hash = hash_bytes(&self.rct_remainder);
                let prefix_hash = self.prefix_hash();
                Some(hash_chunks(&[&prefix_hash[..], &base_hash[..], &[0u8; 32][..]]))
            }
            _ => None,
        }
    }

    /// Version of the transaction format
    pub fn version(&self) -> u64 {
        self.prefix.version
    }

    /// Inputs
    pub fn inputs(&self) -> &[TxIn] {
        &self.prefix.inputs
    }

    /// Outputs
    pub fn outputs(&self) -> &[TxOut] {
        &self.prefix.outputs
    }

    /// True for a coinbase transaction
    pub fn is_coinbase(&self) -> bool {
        matches!(self.prefix.inputs.as_slice(), [TxIn::Gen { .. }])
    }

    /// Transaction public key `R`
    pub fn tx_public_key(&self) -> Option<PublicKey> {
        self.prefix.tx_public_key()
    }

    /// Signature row of input `index`
    pub fn signature(&self, index: usize) -> Option<&RingSignature> {
        self.signatures.get(index)
    }

    /// Checks that every key input carries one signature element per ring member
    pub fn check_signature_rows(&self) -> Result<()> {
        if self.prefix.version >= 2 {
            return Ok(());
        }
        for (input, signature) in self.prefix.inputs.iter().zip(self.signatures.iter()) {
            if input.signature_count() != signature.len() {
                return Err(ScopeError::RingSizeMismatch {
                    expected: input.signature_count(),
                    actual: signature.len(),
                });
            }
        }
        Ok(())
    }

    /// Ownership oracle: is output `index` payable to `(a, B)`?
    ///
    /// A transaction without a public key owns nothing; an output key that
    /// is not a valid point cannot be ours.
    pub fn is_output_ours(
        &self,
        view_secret: &SecretKey,
        spend_public: &PublicKey,
        index: usize,
    ) -> Result<bool> {
        let output = self.prefix.outputs.get(index).ok_or_else(|| {
            ScopeError::NotFound(format!(
                "output {} of a transaction with {} outputs",
                index,
                self.prefix.outputs.len()
            ))
        })?;

        let tx_public_key = match self.tx_public_key() {
            Some(key) => key,
            None => return Ok(false),
        };

        Ok(match output.public_key() {
            Ok(key) => is_output_ours(view_secret, spend_public, &tx_public_key, index as u64, &key),
            Err(_) => false,
        })
    }

    /// Indices of every output payable to `(a, B)`
    pub fn owned_outputs(&self, view_secret: &SecretKey, spend_public: &PublicKey) -> Vec<usize> {
        (0..self.prefix.outputs.len())
            .filter(|&i| matches!(self.is_output_ours(view_secret, spend_public, i), Ok(true)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extra::{write_extra, ExtraField};
    use rand::{rngs::StdRng, SeedableRng};
    use ringscope_crypto::keys::generate_wallet_keys;
    use ringscope_crypto::ring::SignatureElement;
    use ringscope_crypto::stealth::derive_output_key;

    fn coinbase(height: u64, key: [u8; 32], tx_key: &PublicKey) -> Transaction {
        Transaction {
            prefix: TransactionPrefix {
                version: 1,
                unlock_time: height + 60,
                inputs: vec![TxIn::Gen { height }],
                outputs: vec![TxOut { amount: 17_592_186_044_415, key }],
                extra: write_extra(&[ExtraField::PublicKey(tx_key.to_bytes())]),
            },
            signatures: vec![RingSignature::default()],
            rct_remainder: Vec::new(),
        }
    }

    fn spend(offsets: Vec<u64>) -> Transaction {
        let n = offsets.len();
        let elements = (0..n)
            .map(|i| SignatureElement::from_bytes(&[i as u8; 64]))
            .collect();
        Transaction {
            prefix: TransactionPrefix {
                version: 1,
                unlock_time: 0,
                inputs: vec![TxIn::ToKey(KeyInput {
                    amount: 1_000_000,
                    key_offsets: offsets,
                    key_image: [0x11; 32],
                })],
                outputs: vec![TxOut { amount: 900_000, key: [0x22; 32] }],
                extra: vec![],
            },
            signatures: vec![RingSignature::new(elements)],
            rct_remainder: Vec::new(),
        }
    }

    #[test]
    fn test_coinbase_layout() {
        let mut rng = StdRng::seed_from_u64(1);
        let tx_key = SecretKey::generate(&mut rng).public_key();
        let tx = coinbase(5, [0x33; 32], &tx_key);
        let bytes = tx.to_bytes();

        assert_eq!(&bytes[..5], &[0x01, 0x41, 0x01, 0xff, 0x05]);
        assert_eq!(Transaction::from_bytes(&bytes).unwrap(), tx);
        assert!(tx.is_coinbase());
        assert_eq!(tx.tx_public_key(), Some(tx_key));
    }

    #[test]
    fn test_spend_round_trip_and_hashes() {
        let tx = spend(vec![10, 3, 7]);
        let bytes = tx.to_bytes();
        let parsed = Transaction::from_bytes(&bytes).unwrap();

        assert_eq!(parsed, tx);
        assert_eq!(parsed.to_bytes(), bytes);
        assert_eq!(parsed.hash(), Some(hash_bytes(&bytes)));
        assert_eq!(parsed.prefix_hash(), hash_bytes(&tx.prefix.to_bytes()));
        assert_ne!(parsed.prefix_hash(), parsed.hash().unwrap());
    }

    #[test]
    fn test_prefix_hash_ignores_signatures() {
        let tx = spend(vec![1, 2]);
        let mut tampered = tx.clone();
        tampered.signatures[0].elements_mut()[0] = SignatureElement::from_bytes(&[0xee; 64]);
        assert_eq!(tx.prefix_hash(), tampered.prefix_hash());
        assert_ne!(tx.hash(), tampered.hash());
    }

    #[test]
    fn test_truncated_signatures_rejected() {
        let bytes = spend(vec![4, 4]).to_bytes();
        let err = Transaction::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, ScopeError::InvalidEncoding(_)));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = spend(vec![4]).to_bytes();
        bytes.push(0);
        assert!(Transaction::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_script_inputs_rejected() {
        // version, unlock, one input tagged txin_to_script
        let bytes = [0x01, 0x00, 0x01, 0x00, 0x00];
        assert!(matches!(
            Transaction::from_bytes(&bytes),
            Err(ScopeError::InvalidEncoding(msg)) if msg.contains("script")
        ));
    }

    #[test]
    fn test_hostile_counts_rejected() {
        // one-byte blob claiming 2^63 inputs
        let mut bytes = vec![0x01, 0x00];
        bytes.extend(ringscope_crypto::varint::encode_varint(1 << 63));
        assert!(Transaction::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_v2_coinbase_hash() {
        let mut rng = StdRng::seed_from_u64(2);
        let tx_key = SecretKey::generate(&mut rng).public_key();
        let mut tx = coinbase(1_400_000, [0x44; 32], &tx_key);
        tx.prefix.version = 2;
        tx.signatures.clear();
        tx.rct_remainder = vec![RCT_TYPE_NULL];

        let bytes = tx.to_bytes();
        let parsed = Transaction::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, tx);

        let mut preimage = tx.prefix_hash().to_vec();
        preimage.extend_from_slice(&hash_bytes(&[0x00]));
        preimage.extend_from_slice(&[0u8; 32]);
        let expected = hash_bytes(&preimage);
        assert_eq!(parsed.hash(), Some(expected));

        let mut ringct = parsed.clone();
        ringct.rct_remainder = vec![0x01, 0x02];
        assert_eq!(ringct.hash(), None);
    }

    #[test]
    fn test_signature_row_check() {
        let mut tx = spend(vec![1, 2, 3]);
        assert!(tx.check_signature_rows().is_ok());
        tx.signatures[0].elements_mut().pop();
        assert_eq!(
            tx.check_signature_rows(),
            Err(ScopeError::RingSizeMismatch { expected: 3, actual: 2 })
        );
    }

    #[test]
    fn test_ownership_oracle() {
        let mut rng = StdRng::seed_from_u64(3);
        let (view, spend_key) = generate_wallet_keys(&mut rng);
        let tx_secret = SecretKey::generate(&mut rng);
        let ours = derive_output_key(view.public(), spend_key.public(), &tx_secret, 1);

        let mut tx = coinbase(9, [0x55; 32], &tx_secret.public_key());
        tx.prefix.outputs.push(TxOut { amount: 5, key: ours.to_bytes() });

        assert_eq!(tx.owned_outputs(view.secret(), spend_key.public()), vec![1]);
        assert!(!tx.is_output_ours(view.secret(), spend_key.public(), 0).unwrap());
        assert!(tx.is_output_ours(view.secret(), spend_key.public(), 2).is_err());

        tx.prefix.extra.clear();
        assert!(tx.owned_outputs(view.secret(), spend_key.public()).is_empty());
    }
}
