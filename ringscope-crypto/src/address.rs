// src/address.rs

//! Standard CryptoNote addresses.
//!
//! Layout after base58 decoding (checksum stripped by `decode_check`):
//! `varint(network prefix) || spend public key || view public key`.

use crate::errors::{CryptoError, Result};
use crate::keys::{PublicKey, SpendKey, ViewKey};
use crate::varint::{read_varint, write_varint};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Network an address belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Main network
    #[default]
    Mainnet,
    /// Public test network
    Testnet,
    /// Staging network
    Stagenet,
}

impl Network {
    /// Prefix of standard (non-integrated, non-sub) addresses
    pub fn standard_prefix(&self) -> u64 {
        match self {
            Network::Mainnet => 18,
            Network::Testnet => 53,
            Network::Stagenet => 24,
        }
    }

    fn from_standard_prefix(prefix: u64) -> Option<Self> {
        match prefix {
            18 => Some(Network::Mainnet),
            53 => Some(Network::Testnet),
            24 => Some(Network::Stagenet),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
            Network::Stagenet => write!(f, "stagenet"),
        }
    }
}

/// Public half of a wallet: `(A, B)` plus the network it is rendered for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Network the address belongs to
    pub network: Network,
    /// Public spend key `B`
    pub spend_public: PublicKey,
    /// Public view key `A`
    pub view_public: PublicKey,
}

impl Address {
    /// Address of a wallet's keypairs
    pub fn from_keys(network: Network, view: &ViewKey, spend: &SpendKey) -> Self {
        Self { network, spend_public: *spend.public(), view_public: *view.public() }
    }

    /// Parses a base58 address, verifying the Keccak checksum
    ///
    /// # Example
    /// ```
    /// use ringscope_crypto::address::{Address, Network};
    /// use ringscope_crypto::keys::generate_wallet_keys;
    ///
    /// let (view, spend) = generate_wallet_keys(&mut rand::thread_rng());
    /// let address = Address::from_keys(Network::Mainnet, &view, &spend);
    /// let encoded = address.to_base58().unwrap();
    /// assert!(encoded.starts_with('4'));
    /// assert_eq!(Address::from_base58(&encoded).unwrap(), address);
    /// ```
    pub fn from_base58(encoded: &str) -> Result<Self> {
        let decoded = base58_monero::decode_check(encoded)
            .map_err(|e| CryptoError::InvalidAddress(format!("base58 decode failed: {:?}", e)))?;

        let mut input = &decoded[..];
        let prefix = read_varint(&mut input)
            .map_err(|_| CryptoError::InvalidAddress("missing network prefix".to_string()))?;
        let network = Network::from_standard_prefix(prefix).ok_or_else(|| {
            CryptoError::InvalidAddress(format!(
                "unsupported address prefix {} (only standard addresses are accepted)",
                prefix
            ))
        })?;

        if input.len() != 64 {
            return Err(CryptoError::InvalidAddress(format!(
                "expected 64 key bytes, got {}",
                input.len()
            )));
        }

        let mut spend = [0u8; 32];
        let mut view = [0u8; 32];
        spend.copy_from_slice(&input[..32]);
        view.copy_from_slice(&input[32..]);

        Ok(Self {
            network,
            spend_public: PublicKey::from_bytes(&spend)?,
            view_public: PublicKey::from_bytes(&view)?,
        })
    }

    /// Renders the address as base58 with checksum
    pub fn to_base58(&self) -> Result<String> {
        let mut raw = Vec::with_capacity(1 + 64);
        write_varint(self.network.standard_prefix(), &mut raw);
        raw.extend_from_slice(self.spend_public.as_bytes());
        raw.extend_from_slice(self.view_public.as_bytes());

        base58_monero::encode_check(&raw)
            .map_err(|e| CryptoError::InvalidAddress(format!("base58 encode failed: {:?}", e)))
    }

    /// Checks that the given keys belong to this address
    pub fn matches(&self, view: &ViewKey, spend_public: &PublicKey) -> bool {
        self.view_public == *view.public() && self.spend_public == *spend_public
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_wallet_keys;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_round_trip_all_networks() {
        let mut rng = StdRng::seed_from_u64(10);
        let (view, spend) = generate_wallet_keys(&mut rng);

        for network in [Network::Mainnet, Network::Testnet, Network::Stagenet] {
            let address = Address::from_keys(network, &view, &spend);
            let encoded = address.to_base58().unwrap();
            assert_eq!(encoded.len(), 95);
            assert_eq!(Address::from_base58(&encoded).unwrap(), address);
        }
    }

    #[test]
    fn test_mainnet_leading_character() {
        let mut rng = StdRng::seed_from_u64(11);
        let (view, spend) = generate_wallet_keys(&mut rng);
        let encoded = Address::from_keys(Network::Mainnet, &view, &spend).to_base58().unwrap();
        assert!(encoded.starts_with('4'));
    }

    #[test]
    fn test_corrupted_checksum_rejected() {
        let mut rng = StdRng::seed_from_u64(12);
        let (view, spend) = generate_wallet_keys(&mut rng);
        let encoded = Address::from_keys(Network::Mainnet, &view, &spend).to_base58().unwrap();

        let mut chars: Vec<char> = encoded.chars().collect();
        let last = chars.len() - 2;
        chars[last] = if chars[last] == '1' { '2' } else { '1' };
        let corrupted: String = chars.into_iter().collect();

        assert!(matches!(
            Address::from_base58(&corrupted),
            Err(CryptoError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_matches_keys() {
        let mut rng = StdRng::seed_from_u64(13);
        let (view, spend) = generate_wallet_keys(&mut rng);
        let (other_view, _) = generate_wallet_keys(&mut rng);
        let address = Address::from_keys(Network::Mainnet, &view, &spend);

        assert!(address.matches(&view, spend.public()));
        assert!(!address.matches(&other_view, spend.public()));
    }
}
