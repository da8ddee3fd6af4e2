// src/ring.rs

//! CryptoNote linkable ring signatures (pre-RingCT, one key per member).
//!
//! A signature over ring `P_0..P_{n-1}` with key image `I` is a list of
//! `(c_i, r_i)` pairs, one per member, such that
//!
//! ```text
//! L_i = r_i·G + c_i·P_i
//! R_i = r_i·Hp(P_i) + c_i·I
//! Σ c_i = Hs(h || L_0 || R_0 || … || L_{n-1} || R_{n-1})
//! ```
//!
//! The transcript order (L before R, ascending ring index) is part of the
//! on-chain format. Pairs are bound to ring positions, so permuting the
//! rows breaks verification.

use crate::curve::{
    double_scalar_base_plus, is_canonical_scalar, random_scalar, scalar_mul_base,
    scalar_mul_point,
};
use crate::errors::{CryptoError, Result};
use crate::hash::{hash_to_point, hash_to_scalar};
use crate::keys::{KeyImage, PublicKey, SecretKey};
use crate::{HASH_SIZE, SIGNATURE_ELEMENT_SIZE};
use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use rand_core::{CryptoRng, RngCore};
use subtle::{ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

/// One ring position: a public key and an optional locator hint
///
/// The hint is opaque to the signature scheme; resolvers store the
/// member's absolute output index there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingMember {
    /// Output public key `P_i`
    pub public_key: PublicKey,
    /// Caller-defined locator, e.g. the absolute output offset
    pub hint: Option<u64>,
}

/// Ordered ring context with stable indices
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Ring {
    members: Vec<RingMember>,
}

impl Ring {
    /// Creates a ring from its members, in order
    pub fn new(members: Vec<RingMember>) -> Self {
        Self { members }
    }

    /// Creates a ring of bare public keys
    pub fn from_keys<I: IntoIterator<Item = PublicKey>>(keys: I) -> Self {
        Self {
            members: keys
                .into_iter()
                .map(|public_key| RingMember { public_key, hint: None })
                .collect(),
        }
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if the ring has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in ring order
    pub fn members(&self) -> &[RingMember] {
        &self.members
    }

    /// Member at `index`
    pub fn get(&self, index: usize) -> Option<&RingMember> {
        self.members.get(index)
    }

    /// Lowest index holding `public_key`
    pub fn position(&self, public_key: &PublicKey) -> Option<usize> {
        self.members.iter().position(|m| m.public_key == *public_key)
    }
}

/// A raw `(c, r)` pair as stored on chain: 64 bytes, not yet validated
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SignatureElement {
    c: [u8; 32],
    r: [u8; 32],
}

impl SignatureElement {
    /// Wraps 64 raw bytes, `c` first
    pub fn from_bytes(bytes: &[u8; SIGNATURE_ELEMENT_SIZE]) -> Self {
        let mut c = [0u8; 32];
        let mut r = [0u8; 32];
        c.copy_from_slice(&bytes[..32]);
        r.copy_from_slice(&bytes[32..]);
        Self { c, r }
    }

    /// Builds an element from two scalars
    pub fn from_scalars(c: &Scalar, r: &Scalar) -> Self {
        Self { c: c.to_bytes(), r: r.to_bytes() }
    }

    /// 64-byte wire form
    pub fn to_bytes(&self) -> [u8; SIGNATURE_ELEMENT_SIZE] {
        let mut out = [0u8; SIGNATURE_ELEMENT_SIZE];
        out[..32].copy_from_slice(&self.c);
        out[32..].copy_from_slice(&self.r);
        out
    }

    /// Raw `c`
    pub fn c_bytes(&self) -> &[u8; 32] {
        &self.c
    }

    /// Raw `r`
    pub fn r_bytes(&self) -> &[u8; 32] {
        &self.r
    }

    /// True if both halves are canonical scalars
    pub fn is_canonical(&self) -> bool {
        is_canonical_scalar(&self.c) && is_canonical_scalar(&self.r)
    }

    fn scalars(&self) -> Option<(Scalar, Scalar)> {
        let c = Option::from(Scalar::from_canonical_bytes(self.c))?;
        let r = Option::from(Scalar::from_canonical_bytes(self.r))?;
        Some((c, r))
    }
}

impl std::fmt::Debug for SignatureElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureElement")
            .field("c", &hex::encode(self.c))
            .field("r", &hex::encode(self.r))
            .finish()
    }
}

/// Ring signature: one element per ring member, in ring order
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct RingSignature {
    elements: Vec<SignatureElement>,
}

impl RingSignature {
    /// Wraps elements in ring order
    pub fn new(elements: Vec<SignatureElement>) -> Self {
        Self { elements }
    }

    /// Parses `ring_size` consecutive 64-byte elements
    pub fn from_bytes(bytes: &[u8], ring_size: usize) -> Result<Self> {
        let expected_len = ring_size.checked_mul(SIGNATURE_ELEMENT_SIZE).ok_or(
            CryptoError::RingSizeMismatch { ring: ring_size, signatures: bytes.len() / SIGNATURE_ELEMENT_SIZE },
        )?;
        if bytes.len() != expected_len {
            return Err(CryptoError::RingSizeMismatch {
                ring: ring_size,
                signatures: bytes.len() / SIGNATURE_ELEMENT_SIZE,
            });
        }

        let elements = bytes
            .chunks_exact(SIGNATURE_ELEMENT_SIZE)
            .map(|chunk| {
                let mut element = [0u8; SIGNATURE_ELEMENT_SIZE];
                element.copy_from_slice(chunk);
                SignatureElement::from_bytes(&element)
            })
            .collect();
        Ok(Self { elements })
    }

    /// Wire form: elements concatenated
    pub fn to_bytes(&self) -> Vec<u8> {
        self.elements.iter().flat_map(|e| e.to_bytes()).collect()
    }

    /// Elements in ring order
    pub fn elements(&self) -> &[SignatureElement] {
        &self.elements
    }

    /// Mutable access, for callers that deliberately tamper with rows
    pub fn elements_mut(&mut self) -> &mut Vec<SignatureElement> {
        &mut self.elements
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True if there are no elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Structural checks that explain why verification would reject
    ///
    /// Reports a size mismatch or the first non-canonical scalar. Passing
    /// this check says nothing about validity.
    pub fn check_shape(&self, ring: &Ring) -> Result<()> {
        if ring.len() != self.elements.len() {
            return Err(CryptoError::RingSizeMismatch {
                ring: ring.len(),
                signatures: self.elements.len(),
            });
        }

        for (i, element) in self.elements.iter().enumerate() {
            if !element.is_canonical() {
                return Err(CryptoError::InvalidEncoding(format!(
                    "non-canonical scalar in signature element {}",
                    i
                )));
            }
        }

        Ok(())
    }
}

fn transcript_capacity(ring_size: usize) -> usize {
    HASH_SIZE + 2 * 32 * ring_size
}

/// Generates a ring signature for the member at `signer_index`
///
/// `secret` must be the discrete log of `ring[signer_index]` and
/// `key_image` must equal `secret·Hp(ring[signer_index])`; otherwise the
/// output simply fails verification.
///
/// Every position performs the same curve operations: the real slot uses
/// `(c, r) = (0, α)` selected in constant time, which gives `L = α·G` and
/// `R = α·Hp(P)`. The closing pair is written back with a conditional
/// assignment over all slots.
///
/// # Example
/// ```
/// use ringscope_crypto::keys::SecretKey;
/// use ringscope_crypto::ring::{generate_ring_signature, verify_ring_signature, Ring};
/// use ringscope_crypto::stealth::generate_key_image;
///
/// let mut rng = rand::thread_rng();
/// let secret = SecretKey::generate(&mut rng);
/// let decoy = SecretKey::generate(&mut rng).public_key();
/// let ring = Ring::from_keys([decoy, secret.public_key()]);
/// let image = generate_key_image(&secret, &secret.public_key());
///
/// let msg = [7u8; 32];
/// let sig = generate_ring_signature(&msg, &image, &ring, &secret, 1, &mut rng).unwrap();
/// assert!(verify_ring_signature(&msg, &image, &ring, &sig));
/// ```
pub fn generate_ring_signature<R: RngCore + CryptoRng>(
    prefix_hash: &[u8; HASH_SIZE],
    key_image: &KeyImage,
    ring: &Ring,
    secret: &SecretKey,
    signer_index: usize,
    rng: &mut R,
) -> Result<RingSignature> {
    if ring.is_empty() {
        return Err(CryptoError::EmptyRing);
    }
    if signer_index >= ring.len() {
        return Err(CryptoError::InvalidSignerIndex { index: signer_index, ring_size: ring.len() });
    }

    let n = ring.len();
    let mut alpha = random_scalar(rng);
    let mut cs: Vec<Scalar> = Vec::with_capacity(n);
    let mut rs: Vec<Scalar> = Vec::with_capacity(n);
    let mut buf = Vec::with_capacity(transcript_capacity(n));
    buf.extend_from_slice(prefix_hash);

    let mut decoy_sum = Scalar::ZERO;
    for (i, member) in ring.members().iter().enumerate() {
        let is_real = (i as u64).ct_eq(&(signer_index as u64));
        let c_rand = random_scalar(rng);
        let r_rand = random_scalar(rng);

        let c = Scalar::conditional_select(&c_rand, &Scalar::ZERO, is_real);
        let r = Scalar::conditional_select(&r_rand, &alpha, is_real);

        let hp = hash_to_point(member.public_key.as_bytes());
        let l = scalar_mul_base(&r) + scalar_mul_point(&c, member.public_key.point());
        let big_r = scalar_mul_point(&r, &hp) + scalar_mul_point(&c, key_image.point());
        buf.extend_from_slice(l.compress().as_bytes());
        buf.extend_from_slice(big_r.compress().as_bytes());

        decoy_sum += c;
        cs.push(c);
        rs.push(r);
    }

    let challenge = hash_to_scalar(&buf);
    let c_real = challenge - decoy_sum;
    let mut r_real = alpha - c_real * secret.as_scalar();

    for i in 0..n {
        let is_real = (i as u64).ct_eq(&(signer_index as u64));
        cs[i].conditional_assign(&c_real, is_real);
        rs[i].conditional_assign(&r_real, is_real);
    }

    let elements = cs
        .iter()
        .zip(rs.iter())
        .map(|(c, r)| SignatureElement::from_scalars(c, r))
        .collect();

    alpha.zeroize();
    r_real.zeroize();
    rs.zeroize();

    Ok(RingSignature { elements })
}

/// Verifies a ring signature
///
/// Rejects, before any curve arithmetic, when the sizes differ, the ring
/// is empty, any `c_i`/`r_i` is non-canonical, or `I` lies outside the
/// prime-order subgroup. Duplicate ring members are not deduplicated.
pub fn verify_ring_signature(
    prefix_hash: &[u8; HASH_SIZE],
    key_image: &KeyImage,
    ring: &Ring,
    signature: &RingSignature,
) -> bool {
    let n = ring.len();
    if n == 0 || n != signature.len() {
        return false;
    }

    let mut pairs = Vec::with_capacity(n);
    for element in signature.elements() {
        match element.scalars() {
            Some(pair) => pairs.push(pair),
            None => return false,
        }
    }

    if !key_image.is_torsion_free() {
        return false;
    }

    let mut buf = Vec::with_capacity(transcript_capacity(n));
    buf.extend_from_slice(prefix_hash);

    let mut sum = Scalar::ZERO;
    for (member, (c, r)) in ring.members().iter().zip(pairs.iter()) {
        let hp = hash_to_point(member.public_key.as_bytes());
        let l = double_scalar_base_plus(member.public_key.point(), r, c);
        let big_r: EdwardsPoint = r * hp + c * key_image.point();
        buf.extend_from_slice(l.compress().as_bytes());
        buf.extend_from_slice(big_r.compress().as_bytes());
        sum += c;
    }

    hash_to_scalar(&buf) == sum
}
