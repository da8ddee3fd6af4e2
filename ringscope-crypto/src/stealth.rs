// src/stealth.rs

//! Stealth-address derivation.
//!
//! Ties a wallet's `(a, b)` to one specific transaction output:
//!
//! ```text
//! D   = 8·a·R                    shared secret (sender computes 8·r·A)
//! d_i = Hs(D || varint(i))
//! x   = d_i + b                  one-time secret key
//! P   = x·G = d_i·G + B          one-time public key
//! I   = x·Hp(P)                  key image
//! ```
//!
//! The cofactor multiplication in `D` follows the reference
//! `generate_key_derivation`, which on-chain outputs depend on.

use crate::curve::{scalar_mul_base, scalar_mul_point};
use crate::errors::Result;
use crate::hash::{hash_to_point, hash_to_scalar};
use crate::keys::{ensure_public_matches, KeyImage, PublicKey, SecretKey, SpendKey, ViewKey};
use crate::varint::write_varint;
use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Shared secret `D` between a transaction key and a view key
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyDerivation([u8; 32]);

impl fmt::Debug for KeyDerivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyDerivation([REDACTED])")
    }
}

impl KeyDerivation {
    fn from_point(point: EdwardsPoint) -> Self {
        KeyDerivation(point.mul_by_cofactor().compress().to_bytes())
    }

    /// Encoding of `D`, for explicitly unsafe diagnostics only
    pub fn expose_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// `d_i = Hs(D || varint(i))`
    pub fn to_scalar(&self, output_index: u64) -> Scalar {
        let mut buf = Vec::with_capacity(32 + 10);
        buf.extend_from_slice(&self.0);
        write_varint(output_index, &mut buf);
        let scalar = hash_to_scalar(&buf);
        buf.zeroize();
        scalar
    }
}

/// Recipient side: `D = 8·a·R`
pub fn generate_key_derivation(tx_public_key: &PublicKey, view_secret: &SecretKey) -> KeyDerivation {
    KeyDerivation::from_point(scalar_mul_point(view_secret.as_scalar(), tx_public_key.point()))
}

/// Sender side: `D = 8·r·A`, identical to the recipient's value
pub fn generate_sender_derivation(view_public: &PublicKey, tx_secret: &SecretKey) -> KeyDerivation {
    KeyDerivation::from_point(scalar_mul_point(tx_secret.as_scalar(), view_public.point()))
}

/// `P = Hs(D || i)·G + B`
pub fn derive_public_key(
    derivation: &KeyDerivation,
    output_index: u64,
    spend_public: &PublicKey,
) -> PublicKey {
    let d = derivation.to_scalar(output_index);
    PublicKey::from_point(scalar_mul_base(&d) + spend_public.point())
}

/// `x = Hs(D || i) + b`
pub fn derive_secret_key(
    derivation: &KeyDerivation,
    output_index: u64,
    spend_secret: &SecretKey,
) -> SecretKey {
    let mut d = derivation.to_scalar(output_index);
    let x = SecretKey::from_scalar(d + spend_secret.as_scalar());
    d.zeroize();
    x
}

/// `I = x·Hp(P)`
pub fn generate_key_image(secret: &SecretKey, public: &PublicKey) -> KeyImage {
    KeyImage::from_point(scalar_mul_point(secret.as_scalar(), &hash_to_point(public.as_bytes())))
}

/// One-time keys of a single output, as seen by its owner
#[derive(Debug)]
pub struct EphemeralKeys {
    /// `x`
    pub secret: SecretKey,
    /// `P`
    pub public: PublicKey,
    /// `I`
    pub key_image: KeyImage,
}

/// Derives `(x, P, I)` for output `i` of the transaction with public key `R`
///
/// `P` is computed both as `x·G` and as `d_i·G + B`; disagreement means the
/// spend key does not belong to the view key's wallet and is reported as
/// `DerivationMismatch`.
pub fn derive(
    view: &ViewKey,
    spend: &SpendKey,
    tx_public_key: &PublicKey,
    output_index: u64,
) -> Result<EphemeralKeys> {
    let derivation = generate_key_derivation(tx_public_key, view.secret());
    let secret = derive_secret_key(&derivation, output_index, spend.secret());
    let public = secret.public_key();

    let expected = derive_public_key(&derivation, output_index, spend.public());
    ensure_public_matches(&expected, &public, "one-time (d·G + B versus x·G)")?;

    let key_image = generate_key_image(&secret, &public);
    Ok(EphemeralKeys { secret, public, key_image })
}

/// Derives `(x, P, I)` and checks `P` against the output key stored on chain
pub fn derive_for_output(
    view: &ViewKey,
    spend: &SpendKey,
    tx_public_key: &PublicKey,
    output_index: u64,
    output_key: &PublicKey,
) -> Result<EphemeralKeys> {
    let keys = derive(view, spend, tx_public_key, output_index)?;
    ensure_public_matches(output_key, &keys.public, "derived one-time")?;
    Ok(keys)
}

/// Ownership oracle: does output `i` with key `P` pay `(A, B)`?
///
/// Only public values are compared; the single branch is on the final
/// equality.
pub fn is_output_ours(
    view_secret: &SecretKey,
    spend_public: &PublicKey,
    tx_public_key: &PublicKey,
    output_index: u64,
    output_key: &PublicKey,
) -> bool {
    let derivation = generate_key_derivation(tx_public_key, view_secret);
    derive_public_key(&derivation, output_index, spend_public) == *output_key
}

/// Sender side: one-time key for output `i` paying `(A, B)` under tx key `r`
pub fn derive_output_key(
    view_public: &PublicKey,
    spend_public: &PublicKey,
    tx_secret: &SecretKey,
    output_index: u64,
) -> PublicKey {
    let derivation = generate_sender_derivation(view_public, tx_secret);
    derive_public_key(&derivation, output_index, spend_public)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CryptoError;
    use crate::keys::generate_wallet_keys;
    use rand::{rngs::StdRng, SeedableRng};

    fn setup(seed: u64) -> (ViewKey, SpendKey, SecretKey, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let (view, spend) = generate_wallet_keys(&mut rng);
        let tx_secret = SecretKey::generate(&mut rng);
        (view, spend, tx_secret, rng)
    }

    #[test]
    fn test_sender_and_recipient_agree() {
        let (view, spend, r, _) = setup(20);
        let tx_public = r.public_key();

        let sent = derive_output_key(view.public(), spend.public(), &r, 3);
        let keys = derive(&view, &spend, &tx_public, 3).unwrap();

        assert_eq!(keys.public, sent);
        assert_eq!(keys.secret.public_key(), sent);
    }

    #[test]
    fn test_key_image_formula() {
        let (view, spend, r, _) = setup(21);
        let keys = derive(&view, &spend, &r.public_key(), 0).unwrap();

        let expected = keys.secret.as_scalar() * hash_to_point(keys.public.as_bytes());
        assert_eq!(keys.key_image.point(), &expected);
        assert!(keys.key_image.is_torsion_free());
    }

    #[test]
    fn test_wrong_spend_key_mismatch() {
        let (view, _, r, mut rng) = setup(22);
        let (_, foreign_spend) = generate_wallet_keys(&mut rng);
        let (_, real_spend) = generate_wallet_keys(&mut rng);
        let output_key = derive_output_key(view.public(), real_spend.public(), &r, 0);

        let result = derive_for_output(&view, &foreign_spend, &r.public_key(), 0, &output_key);
        assert!(matches!(result, Err(CryptoError::DerivationMismatch(_))));
    }

    #[test]
    fn test_is_output_ours() {
        let (view, spend, r, mut rng) = setup(23);
        let tx_public = r.public_key();
        let output_key = derive_output_key(view.public(), spend.public(), &r, 1);

        assert!(is_output_ours(view.secret(), spend.public(), &tx_public, 1, &output_key));
        // Same key at another index is not ours
        assert!(!is_output_ours(view.secret(), spend.public(), &tx_public, 0, &output_key));

        let (other_view, other_spend) = generate_wallet_keys(&mut rng);
        assert!(!is_output_ours(
            other_view.secret(),
            other_spend.public(),
            &tx_public,
            1,
            &output_key
        ));
    }

    #[test]
    fn test_key_images_distinct_per_output() {
        let (view, spend, r, mut rng) = setup(24);
        let r2 = SecretKey::generate(&mut rng);

        let a = derive(&view, &spend, &r.public_key(), 0).unwrap().key_image;
        let b = derive(&view, &spend, &r.public_key(), 1).unwrap().key_image;
        let c = derive(&view, &spend, &r2.public_key(), 0).unwrap().key_image;

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_large_output_index_uses_varint() {
        let (view, spend, r, _) = setup(25);
        let derivation = generate_key_derivation(&r.public_key(), view.secret());

        let mut buf = derivation.0.to_vec();
        buf.extend_from_slice(&[0x80, 0x01]);
        assert_eq!(derivation.to_scalar(128), hash_to_scalar(&buf));

        let sent = derive_output_key(view.public(), spend.public(), &r, 128);
        assert!(is_output_ours(view.secret(), spend.public(), &r.public_key(), 128, &sent));
    }

    #[test]
    fn test_derivation_debug_redacted() {
        let (view, _, r, _) = setup(26);
        let derivation = generate_key_derivation(&r.public_key(), view.secret());
        assert_eq!(format!("{:?}", derivation), "KeyDerivation([REDACTED])");
    }
}
