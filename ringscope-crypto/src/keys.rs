// src/keys.rs

//! Key material: secret scalars, validated public points, key images and
//! the wallet's view/spend keypairs.

use crate::curve::{point_from_bytes, random_scalar, scalar_from_canonical, scalar_mul_base};
use crate::errors::{CryptoError, Result};
use crate::hash::hex_to_hash;
use curve25519_dalek::{
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret scalar, zeroized on drop
///
/// Never printed: `Debug` is redacted, and the hex form is only available
/// through [`SecretKey::expose_hex`].
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(Scalar);

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

impl SecretKey {
    /// Parses a canonical 32-byte scalar
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        scalar_from_canonical(bytes).map(SecretKey)
    }

    /// Parses a 64-character hex string
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let mut bytes = hex_to_hash(hex_str)?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    /// Wraps an already reduced scalar
    pub fn from_scalar(scalar: Scalar) -> Self {
        SecretKey(scalar)
    }

    /// Generates a random secret key
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        SecretKey(random_scalar(rng))
    }

    /// Borrows the underlying scalar
    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }

    /// `x·G`
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_point(scalar_mul_base(&self.0))
    }

    /// Hex encoding of the secret, for explicitly unsafe diagnostics only
    pub fn expose_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }
}

/// A validated ed25519 point together with its canonical encoding
#[derive(Clone, Copy)]
pub struct PublicKey {
    compressed: CompressedEdwardsY,
    point: EdwardsPoint,
}

impl PublicKey {
    /// Decodes a canonical compressed point
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let point = point_from_bytes(bytes)?;
        Ok(Self { compressed: CompressedEdwardsY(*bytes), point })
    }

    /// Parses a 64-character hex string
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        Self::from_bytes(&hex_to_hash(hex_str)?)
    }

    /// Wraps a point
    pub fn from_point(point: EdwardsPoint) -> Self {
        Self { compressed: point.compress(), point }
    }

    /// The decompressed point
    pub fn point(&self) -> &EdwardsPoint {
        &self.point
    }

    /// The compressed encoding
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.compressed.as_bytes()
    }

    /// The compressed encoding, by value
    pub fn to_bytes(&self) -> [u8; 32] {
        self.compressed.to_bytes()
    }

    /// Hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.compressed == other.compressed
    }
}

impl Eq for PublicKey {}

impl std::hash::Hash for PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.compressed.as_bytes().hash(state);
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        PublicKey::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

/// Key image `I = x·Hp(P)`
///
/// Decoding only checks that the bytes are a canonical point; membership
/// of the prime-order subgroup is checked by [`KeyImage::is_torsion_free`]
/// and by ring verification.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyImage(PublicKey);

impl KeyImage {
    /// Decodes a key image
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        PublicKey::from_bytes(bytes).map(KeyImage)
    }

    /// Wraps a point
    pub fn from_point(point: EdwardsPoint) -> Self {
        KeyImage(PublicKey::from_point(point))
    }

    /// The decompressed point
    pub fn point(&self) -> &EdwardsPoint {
        self.0.point()
    }

    /// The compressed encoding
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Hex encoding
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    /// `ℓ·I == 0`
    pub fn is_torsion_free(&self) -> bool {
        self.0.point().is_torsion_free()
    }
}

impl fmt::Debug for KeyImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyImage({})", self.to_hex())
    }
}

impl fmt::Display for KeyImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Private view key `a` with `A = a·G`; shared with auditors
#[derive(Clone, Debug)]
pub struct ViewKey {
    secret: SecretKey,
    public: PublicKey,
}

impl ViewKey {
    /// Builds the keypair from its secret half
    pub fn from_secret(secret: SecretKey) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Parses the secret half from hex
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        SecretKey::from_hex(hex_str).map(Self::from_secret)
    }

    /// `a`
    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    /// `A`
    pub fn public(&self) -> &PublicKey {
        &self.public
    }
}

/// Private spend key `b` with `B = b·G`; never shared
#[derive(Clone, Debug)]
pub struct SpendKey {
    secret: SecretKey,
    public: PublicKey,
}

impl SpendKey {
    /// Builds the keypair from its secret half
    pub fn from_secret(secret: SecretKey) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Parses the secret half from hex
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        SecretKey::from_hex(hex_str).map(Self::from_secret)
    }

    /// `b`
    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    /// `B`
    pub fn public(&self) -> &PublicKey {
        &self.public
    }
}

/// Generates an independent random (view, spend) keypair
///
/// # Example
/// ```
/// use ringscope_crypto::keys::generate_wallet_keys;
///
/// let (view, spend) = generate_wallet_keys(&mut rand::thread_rng());
/// assert_ne!(view.public(), spend.public());
/// ```
pub fn generate_wallet_keys<R: RngCore + CryptoRng>(rng: &mut R) -> (ViewKey, SpendKey) {
    let view = ViewKey::from_secret(SecretKey::generate(rng));
    let spend = SpendKey::from_secret(SecretKey::generate(rng));
    (view, spend)
}

/// Checks that a key pair matches an expected public half
pub fn ensure_public_matches(expected: &PublicKey, actual: &PublicKey, what: &str) -> Result<()> {
    if expected != actual {
        return Err(CryptoError::DerivationMismatch(format!(
            "{} public key {} does not match {}",
            what, actual, expected
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_secret_key_round_trip() {
        let mut rng = StdRng::seed_from_u64(1);
        let secret = SecretKey::generate(&mut rng);
        let restored = SecretKey::from_hex(&secret.expose_hex()).unwrap();
        assert_eq!(secret.as_scalar(), restored.as_scalar());
        assert_eq!(secret.public_key(), restored.public_key());
    }

    #[test]
    fn test_secret_key_rejects_non_canonical() {
        assert!(matches!(
            SecretKey::from_bytes(&[0xff; 32]),
            Err(CryptoError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_secret_debug_redacted() {
        let mut rng = StdRng::seed_from_u64(2);
        let secret = SecretKey::generate(&mut rng);
        let rendered = format!("{:?}", secret);
        assert_eq!(rendered, "SecretKey([REDACTED])");
        assert!(!rendered.contains(&secret.expose_hex()));

        let view = ViewKey::from_secret(secret);
        assert!(!format!("{:?}", view).contains(&view.secret().expose_hex()));
    }

    #[test]
    fn test_public_key_hex_and_serde() {
        let mut rng = StdRng::seed_from_u64(3);
        let public = SecretKey::generate(&mut rng).public_key();
        assert_eq!(PublicKey::from_hex(&public.to_hex()).unwrap(), public);

        let json = serde_json::to_string(&public).unwrap();
        assert_eq!(json, format!("\"{}\"", public.to_hex()));
        let restored: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, public);
    }

    #[test]
    fn test_key_image_torsion_check() {
        let mut rng = StdRng::seed_from_u64(4);
        let point = SecretKey::generate(&mut rng).public_key();
        let image = KeyImage::from_point(*point.point());
        assert!(image.is_torsion_free());
        assert_eq!(KeyImage::from_bytes(&image.to_bytes()).unwrap(), image);
    }

    #[test]
    fn test_wallet_keys_public_halves() {
        let mut rng = StdRng::seed_from_u64(5);
        let (view, spend) = generate_wallet_keys(&mut rng);
        assert_eq!(view.secret().public_key(), *view.public());
        assert_eq!(spend.secret().public_key(), *spend.public());
        assert!(ensure_public_matches(view.public(), view.public(), "view").is_ok());
        assert!(matches!(
            ensure_public_matches(view.public(), spend.public(), "view"),
            Err(CryptoError::DerivationMismatch(_))
        ));
    }
}
