// src/curve.rs

//! Thin typed view over the ed25519 group.
//!
//! Scalars live modulo ℓ and travel as 32 little-endian bytes in canonical
//! form; points travel as 32-byte compressed Edwards-y encodings. Every
//! decoding entry point here enforces canonicality and reports
//! `InvalidEncoding` otherwise.

use crate::errors::{CryptoError, Result};
use curve25519_dalek::{
    constants::ED25519_BASEPOINT_TABLE,
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
};
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

/// Parses a canonical scalar (`s < ℓ`)
pub fn scalar_from_canonical(bytes: &[u8; 32]) -> Result<Scalar> {
    Option::from(Scalar::from_canonical_bytes(*bytes)).ok_or_else(|| {
        CryptoError::InvalidEncoding(format!("non-canonical scalar {}", hex::encode(bytes)))
    })
}

/// Returns true if `bytes` encodes a scalar below ℓ
pub fn is_canonical_scalar(bytes: &[u8; 32]) -> bool {
    bool::from(Scalar::from_canonical_bytes(*bytes).is_some())
}

/// Decompresses a point, rejecting invalid and non-canonical encodings
pub fn point_from_bytes(bytes: &[u8; 32]) -> Result<EdwardsPoint> {
    let point = CompressedEdwardsY(*bytes).decompress().ok_or_else(|| {
        CryptoError::InvalidEncoding(format!("not a curve point: {}", hex::encode(bytes)))
    })?;

    if point.compress().as_bytes() != bytes {
        return Err(CryptoError::InvalidEncoding(format!(
            "non-canonical point encoding: {}",
            hex::encode(bytes)
        )));
    }

    Ok(point)
}

/// `sc_reduce32`: interprets 32 bytes as an integer and reduces it mod ℓ
pub fn scalar_reduce(bytes: &[u8; 32]) -> Scalar {
    Scalar::from_bytes_mod_order(*bytes)
}

/// `a + b mod ℓ`
pub fn scalar_add(a: &Scalar, b: &Scalar) -> Scalar {
    a + b
}

/// `a - b mod ℓ`
pub fn scalar_sub(a: &Scalar, b: &Scalar) -> Scalar {
    a - b
}

/// `a · b mod ℓ`
pub fn scalar_mul(a: &Scalar, b: &Scalar) -> Scalar {
    a * b
}

/// `P + Q`
pub fn point_add(p: &EdwardsPoint, q: &EdwardsPoint) -> EdwardsPoint {
    p + q
}

/// `P - Q`
pub fn point_sub(p: &EdwardsPoint, q: &EdwardsPoint) -> EdwardsPoint {
    p - q
}

/// `s·G`, constant time
pub fn scalar_mul_base(s: &Scalar) -> EdwardsPoint {
    s * ED25519_BASEPOINT_TABLE
}

/// `s·P`, constant time
pub fn scalar_mul_point(s: &Scalar, p: &EdwardsPoint) -> EdwardsPoint {
    s * p
}

/// `s·G + t·P`, variable time; only for public inputs
pub fn double_scalar_base_plus(p: &EdwardsPoint, s: &Scalar, t: &Scalar) -> EdwardsPoint {
    EdwardsPoint::vartime_double_scalar_mul_basepoint(t, p, s)
}

/// Draws a scalar uniformly from `[1, ℓ)`
///
/// 64 random bytes are reduced mod ℓ, so the bias is negligible; zero is
/// rejected and redrawn.
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    let mut wide = [0u8; 64];
    loop {
        rng.fill_bytes(&mut wide);
        let scalar = Scalar::from_bytes_mod_order_wide(&wide);
        if scalar != Scalar::ZERO {
            wide.zeroize();
            return scalar;
        }
    }
}
