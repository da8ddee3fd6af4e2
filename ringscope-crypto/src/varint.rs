// src/varint.rs

//! CryptoNote variable-length integers.
//!
//! Little-endian base-128: seven payload bits per byte, high bit set on
//! every byte except the last. Only the shortest encoding is accepted.

use crate::errors::{CryptoError, Result};

/// Maximum encoded length of a `u64`
pub const MAX_VARINT_LEN: usize = 10;

/// Appends the varint encoding of `value` to `out`
pub fn write_varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Returns the varint encoding of `value`
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_VARINT_LEN);
    write_varint(value, &mut out);
    out
}

/// Reads one varint from the front of `input`, advancing it
///
/// Rejects truncated input, values that overflow 64 bits and overlong
/// encodings (a trailing zero byte after a continuation).
pub fn read_varint(input: &mut &[u8]) -> Result<u64> {
    let mut value: u64 = 0;
    let mut shift = 0u32;

    for (i, &byte) in input.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            break;
        }

        let payload = u64::from(byte & 0x7f);
        if shift == 63 && payload > 1 {
            return Err(CryptoError::InvalidEncoding("varint overflows u64".to_string()));
        }
        if byte == 0 && i > 0 {
            return Err(CryptoError::InvalidEncoding("non-canonical varint".to_string()));
        }

        value |= payload << shift;
        if byte & 0x80 == 0 {
            *input = &input[i + 1..];
            return Ok(value);
        }
        shift += 7;
    }

    Err(CryptoError::InvalidEncoding("truncated varint".to_string()))
}
