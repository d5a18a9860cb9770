//! Group arithmetic over `Z / 2^range_bits` and the integer buffer codec
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::num::Wrapping;
use std::ops::{Add, AddAssign, Neg, Sub};
use subtle::{Choice, ConditionallySelectable};

use crate::{Error, Result};

/// A group represented by the integers modulo 2^64. Since every supported `range_bits` is at most
/// 64, reducing modulo 2^64 and then masking down to `range_bits` gives the same result as working
/// in `Z / 2^range_bits` throughout, so reductions are only performed at the boundary.
#[derive(Copy, Clone, Debug, Default)]
pub struct Z64(Wrapping<u64>);

impl Z64 {
    pub const fn new(value: u64) -> Self {
        Self(Wrapping(value))
    }

    /// Interpret the first eight bytes of a PRG block as a group element
    pub fn from_block(block: &[u8; 16]) -> Self {
        let mut repr = [0u8; 8];
        repr.copy_from_slice(&block[..8]);
        Self::new(u64::from_le_bytes(repr))
    }

    /// The canonical representative of `self` in `Z / 2^bits`
    #[inline]
    pub fn reduce(self, bits: u8) -> u64 {
        self.0 .0 & mask(bits)
    }

    /// Negate `self` iff `choice` is set
    #[inline]
    pub fn conditional_negate(&mut self, choice: Choice) {
        let negated = -*self;
        self.conditional_assign(&negated, choice);
    }
}

/// `2^bits - 1`, for `bits` in `1..=64`
#[inline]
pub fn mask(bits: u8) -> u64 {
    debug_assert!(bits >= 1 && bits <= 64);
    u64::MAX >> (64 - u32::from(bits))
}

/// Add `lhs` and `rhs` in `Z / 2^bits`
#[inline]
pub fn add_mod(bits: u8, lhs: u64, rhs: u64) -> u64 {
    (Z64::new(lhs) + Z64::new(rhs)).reduce(bits)
}

/// Negate `value` in `Z / 2^bits`
#[inline]
pub fn neg_mod(bits: u8, value: u64) -> u64 {
    (-Z64::new(value)).reduce(bits)
}

impl Zero for Z64 {
    fn zero() -> Self {
        Self(Wrapping(0))
    }

    fn is_zero(&self) -> bool {
        self.0 .0 == 0
    }
}

impl Add for Z64 {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self.0 += rhs.0;
        self
    }
}

impl AddAssign for Z64 {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Z64 {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self::Output {
        self.0 -= rhs.0;
        self
    }
}

impl Neg for Z64 {
    type Output = Self;

    fn neg(mut self) -> Self::Output {
        self.0 = Wrapping(0) - self.0;
        self
    }
}

impl PartialEq for Z64 {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Z64 {}

impl ConditionallySelectable for Z64 {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self::new(u64::conditional_select(&a.0 .0, &b.0 .0, choice))
    }
}

/// Byte order of a caller-supplied integer buffer
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    Native,
    Little,
    Big,
}

impl Endianness {
    fn is_little(self) -> bool {
        match self {
            Endianness::Native => cfg!(target_endian = "little"),
            Endianness::Little => true,
            Endianness::Big => false,
        }
    }
}

/// Number of bytes needed to hold `bits` bits
#[inline]
pub const fn bits_to_bytes(bits: u8) -> usize {
    (bits as usize + 7) / 8
}

/// Decode an unsigned integer of any non-empty width. Fails if the value does not fit in `bits`
/// bits.
pub fn decode_uint(bytes: &[u8], endianness: Endianness, bits: u8) -> Result<u64> {
    if bytes.is_empty() {
        return Err(Error::InvalidParameter("integer buffer is empty"));
    }

    // Normalize to little endian so index `i` is the byte of weight 2^(8i)
    let mut value = 0u64;
    let mut overflow = false;
    let byte_at = |i: usize| match endianness.is_little() {
        true => bytes[i],
        false => bytes[bytes.len() - 1 - i],
    };
    for i in 0..bytes.len() {
        let byte = byte_at(i);
        if i < 8 {
            value |= u64::from(byte) << (8 * i);
        } else {
            overflow |= byte != 0;
        }
    }

    if overflow || value & !mask(bits) != 0 {
        return Err(Error::InvalidParameter("integer does not fit in its bit width"));
    }
    Ok(value)
}

/// Encode `value` into all of `out`, zero-extending when `out` is wider than eight bytes
pub fn encode_uint(value: u64, endianness: Endianness, out: &mut [u8]) {
    let len = out.len();
    let little = endianness.is_little();
    for i in 0..len {
        let byte = match i < 8 {
            true => (value >> (8 * i)) as u8,
            false => 0,
        };
        match little {
            true => out[i] = byte,
            false => out[len - 1 - i] = byte,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn group_arithmetic() {
        let mut rng = ark_std::test_rng();

        for _ in 0..1000 {
            let a: u64 = rng.gen();
            let b: u64 = rng.gen();
            let bits = rng.gen_range(1..=64u8);
            let modulus_mask = mask(bits);

            // Add
            assert_eq!(add_mod(bits, a, b), a.wrapping_add(b) & modulus_mask);

            // Sub
            assert_eq!(
                (Z64::new(a) - Z64::new(b)).reduce(bits),
                a.wrapping_sub(b) & modulus_mask
            );

            // Neg
            assert_eq!(add_mod(bits, a, neg_mod(bits, a)), 0);
            assert_eq!(
                (Z64::new(a) + -Z64::new(b)).reduce(bits),
                (Z64::new(a) - Z64::new(b)).reduce(bits)
            );
        }
    }

    #[test]
    fn masks() {
        assert_eq!(mask(1), 1);
        assert_eq!(mask(8), 0xFF);
        assert_eq!(mask(63), u64::MAX >> 1);
        assert_eq!(mask(64), u64::MAX);
    }

    #[test]
    fn conditional_negate() {
        let mut x = Z64::new(5);
        x.conditional_negate(Choice::from(0));
        assert_eq!(x, Z64::new(5));
        x.conditional_negate(Choice::from(1));
        assert_eq!(x.reduce(8), 251);
    }

    #[test]
    fn integer_codec() {
        let be = [0x00, 0x00, 0x30, 0x39];
        let le = [0x39, 0x30, 0x00, 0x00];
        assert_eq!(decode_uint(&be, Endianness::Big, 32).unwrap(), 12345);
        assert_eq!(decode_uint(&le, Endianness::Little, 32).unwrap(), 12345);
        assert_eq!(
            decode_uint(&12345u32.to_ne_bytes(), Endianness::Native, 32).unwrap(),
            12345
        );

        let mut out = [0xAAu8; 4];
        encode_uint(12345, Endianness::Big, &mut out);
        assert_eq!(out, be);
        encode_uint(12345, Endianness::Little, &mut out);
        assert_eq!(out, le);

        // Wider than a u64: the extra high-order bytes must be zero
        let mut wide = [0u8; 10];
        encode_uint(u64::MAX, Endianness::Big, &mut wide);
        assert_eq!(&wide[..2], &[0, 0]);
        assert_eq!(decode_uint(&wide, Endianness::Big, 64).unwrap(), u64::MAX);
        wide[0] = 1;
        assert!(decode_uint(&wide, Endianness::Big, 64).is_err());
    }

    #[test]
    fn integer_codec_rejects_bad_input() {
        assert!(decode_uint(&[], Endianness::Little, 8).is_err());
        assert!(decode_uint(&[0x10], Endianness::Little, 4).is_err());
        assert_eq!(decode_uint(&[0x0F], Endianness::Little, 4).unwrap(), 15);
        assert_eq!(bits_to_bytes(1), 1);
        assert_eq!(bits_to_bytes(8), 1);
        assert_eq!(bits_to_bytes(9), 2);
        assert_eq!(bits_to_bytes(64), 8);
    }
}
