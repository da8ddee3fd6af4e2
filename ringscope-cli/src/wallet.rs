// src/wallet.rs

//! The wallet an inspection runs against.
//!
//! Three levels of access are supported:
//!
//! - view key + address: detects which ring member is the wallet's
//! - view key + spend key: additionally reproduces key images and signs
//! - none: only on-chain signatures are checked

use crate::errors::{CliError, Result};
use ringscope_crypto::{Address, Network, PublicKey, SpendKey, ViewKey};
use tracing::warn;

/// View key, spend public key and optionally the spend secret
#[derive(Clone, Debug)]
pub struct Wallet {
    view: ViewKey,
    spend: Option<SpendKey>,
    spend_public: PublicKey,
    network: Network,
}

impl Wallet {
    /// Builds a wallet from hex keys and an optional base58 address
    ///
    /// The spend public key comes from the spend secret when given, else
    /// from the address. When both are available they must agree, and the
    /// address's view key must match `view_hex`.
    pub fn from_parts(
        view_hex: &str,
        spend_hex: Option<&str>,
        address: Option<&str>,
        network: Network,
    ) -> Result<Self> {
        let view = ViewKey::from_hex(view_hex)?;
        let spend = spend_hex.map(SpendKey::from_hex).transpose()?;
        let address = address.map(Address::from_base58).transpose()?;

        let spend_public = match (&spend, &address) {
            (Some(spend), _) => *spend.public(),
            (None, Some(address)) => address.spend_public,
            (None, None) => {
                return Err(CliError::WalletError(
                    "a spend key or an address is required alongside the view key".to_string(),
                ))
            }
        };

        let network = match &address {
            Some(address) => {
                if !address.matches(&view, &spend_public) {
                    return Err(CliError::WalletError(
                        "address does not belong to the supplied keys".to_string(),
                    ));
                }
                if address.network != network {
                    warn!(
                        address_network = %address.network,
                        configured = %network,
                        "Address network differs from configuration, using the address's"
                    );
                }
                address.network
            }
            None => network,
        };

        Ok(Self { view, spend, spend_public, network })
    }

    /// Wallet with full access
    pub fn from_keys(view: ViewKey, spend: SpendKey, network: Network) -> Self {
        let spend_public = *spend.public();
        Self { view, spend: Some(spend), spend_public, network }
    }

    /// Private view key
    pub fn view(&self) -> &ViewKey {
        &self.view
    }

    /// Private spend key, when available
    pub fn spend(&self) -> Option<&SpendKey> {
        self.spend.as_ref()
    }

    /// Public spend key `B`
    pub fn spend_public(&self) -> &PublicKey {
        &self.spend_public
    }

    /// Network of the wallet's address
    pub fn network(&self) -> Network {
        self.network
    }

    /// Standard address of the wallet
    pub fn address(&self) -> Address {
        Address { network: self.network, spend_public: self.spend_public, view_public: *self.view.public() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use ringscope_crypto::keys::generate_wallet_keys;

    #[test]
    fn test_full_wallet_with_address() {
        let mut rng = StdRng::seed_from_u64(1);
        let (view, spend) = generate_wallet_keys(&mut rng);
        let address = Address::from_keys(Network::Testnet, &view, &spend).to_base58().unwrap();

        let wallet = Wallet::from_parts(
            &view.secret().expose_hex(),
            Some(&spend.secret().expose_hex()),
            Some(&address),
            Network::Mainnet,
        )
        .unwrap();
        assert_eq!(wallet.spend_public(), spend.public());
        assert_eq!(wallet.network(), Network::Testnet);
        assert!(wallet.spend().is_some());
    }

    #[test]
    fn test_view_only_wallet() {
        let mut rng = StdRng::seed_from_u64(2);
        let (view, spend) = generate_wallet_keys(&mut rng);
        let address = Address::from_keys(Network::Mainnet, &view, &spend).to_base58().unwrap();

        let wallet =
            Wallet::from_parts(&view.secret().expose_hex(), None, Some(&address), Network::Mainnet).unwrap();
        assert!(wallet.spend().is_none());
        assert_eq!(wallet.spend_public(), spend.public());
        assert_eq!(wallet.address().to_base58().unwrap(), address);
    }

    #[test]
    fn test_mismatched_address_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let (view, spend) = generate_wallet_keys(&mut rng);
        let (other_view, other_spend) = generate_wallet_keys(&mut rng);
        let foreign = Address::from_keys(Network::Mainnet, &other_view, &other_spend).to_base58().unwrap();

        let result = Wallet::from_parts(
            &view.secret().expose_hex(),
            Some(&spend.secret().expose_hex()),
            Some(&foreign),
            Network::Mainnet,
        );
        assert!(matches!(result, Err(CliError::WalletError(_))));
    }

    #[test]
    fn test_view_key_alone_rejected() {
        let mut rng = StdRng::seed_from_u64(4);
        let (view, _) = generate_wallet_keys(&mut rng);
        let result = Wallet::from_parts(&view.secret().expose_hex(), None, None, Network::Mainnet);
        assert!(matches!(result, Err(CliError::WalletError(_))));
    }

    #[test]
    fn test_bad_hex_is_crypto_error() {
        let result = Wallet::from_parts("00", None, None, Network::Mainnet);
        assert!(matches!(result, Err(CliError::Crypto(_))));
    }
}
