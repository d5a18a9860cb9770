//! Key-pair parameters and the size calculator
use serde::{Deserialize, Serialize};

use crate::{group::bits_to_bytes, Error, Result, SEED_SIZE};

/// Largest supported `domain_bits`, the width of the `u64` used for inputs
pub const MAX_DOMAIN_BITS: u8 = 64;

/// Largest supported `range_bits`, the width of the `u64` used for outputs
pub const MAX_RANGE_BITS: u8 = 64;

/// `party`, `domain_bits` and `range_bits`, one byte each
pub(crate) const HEADER_SIZE: usize = 3;

/// Two seed corrections plus one byte holding both control-bit corrections
pub(crate) const CORRECTION_WORD_SIZE: usize = 2 * SEED_SIZE + 1;

/// Bit widths of a key pair's domain and range. Always valid once constructed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawParams")]
pub struct Params {
    domain_bits: u8,
    range_bits: u8,
}

/// Unvalidated form `Params` is deserialized through
#[derive(Deserialize)]
struct RawParams {
    domain_bits: u8,
    range_bits: u8,
}

impl TryFrom<RawParams> for Params {
    type Error = Error;

    fn try_from(raw: RawParams) -> Result<Self> {
        Params::new(raw.domain_bits, raw.range_bits)
    }
}

impl Params {
    pub fn new(domain_bits: u8, range_bits: u8) -> Result<Self> {
        if domain_bits == 0 || domain_bits > MAX_DOMAIN_BITS {
            return Err(Error::InvalidParameter("domain_bits must be in 1..=64"));
        }
        if range_bits == 0 || range_bits > MAX_RANGE_BITS {
            return Err(Error::InvalidParameter("range_bits must be in 1..=64"));
        }
        Ok(Self {
            domain_bits,
            range_bits,
        })
    }

    pub fn domain_bits(&self) -> u8 {
        self.domain_bits
    }

    pub fn range_bits(&self) -> u8 {
        self.range_bits
    }

    /// Number of bytes of an encoded output share
    pub fn range_bytes(&self) -> usize {
        bits_to_bytes(self.range_bits)
    }

    /// Whether `x` lies in `[0, 2^domain_bits)`
    pub fn in_domain(&self, x: u64) -> bool {
        self.domain_bits == 64 || x >> self.domain_bits == 0
    }

    /// Whether `y` lies in `[0, 2^range_bits)`
    pub fn in_range(&self, y: u64) -> bool {
        self.range_bits == 64 || y >> self.range_bits == 0
    }

    pub fn key_blob_size(&self) -> usize {
        HEADER_SIZE
            + SEED_SIZE
            + self.domain_bits as usize * CORRECTION_WORD_SIZE
            + self.range_bytes()
    }

    /// The two root seeds. Everything else in a key pair is derived from them.
    pub fn rand_buf_size(&self) -> usize {
        2 * SEED_SIZE
    }

    pub fn sizes(&self) -> Sizes {
        // Both fit easily: the largest blob is 3 + 16 + 64 * 33 + 8 bytes
        Sizes {
            key_blob_size: self.key_blob_size() as u32,
            rand_buf_size: self.rand_buf_size() as u32,
        }
    }
}

/// Buffer sizes a caller must provide to generate a key pair
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sizes {
    /// Exact length of each of the two key blobs
    pub key_blob_size: u32,
    /// Minimum length of the randomness buffer
    pub rand_buf_size: u32,
}

/// Buffer sizes for a key pair with the given widths
pub fn sizes(domain_bits: u8, range_bits: u8) -> Result<Sizes> {
    Ok(Params::new(domain_bits, range_bits)?.sizes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Status;

    #[test]
    fn size_formula() {
        let s = sizes(32, 32).unwrap();
        assert_eq!(s.key_blob_size, 3 + 16 + 32 * 33 + 4);
        assert_eq!(s.rand_buf_size, 32);

        let s = sizes(1, 1).unwrap();
        assert_eq!(s.key_blob_size, 3 + 16 + 33 + 1);
        assert_eq!(s.rand_buf_size, 32);

        let s = sizes(64, 64).unwrap();
        assert_eq!(s.key_blob_size, 3 + 16 + 64 * 33 + 8);
        assert_eq!(s.rand_buf_size, 32);

        let s = sizes(20, 9).unwrap();
        assert_eq!(s.key_blob_size, 3 + 16 + 20 * 33 + 2);
    }

    #[test]
    fn invalid_widths() {
        for (d, r) in [(0, 8), (8, 0), (65, 8), (8, 65), (0, 0), (255, 255)] {
            let err = sizes(d, r).unwrap_err();
            assert_eq!(err.status(), Status::InvalidParameter);
        }
    }

    #[test]
    fn domain_and_range_checks() {
        let p = Params::new(4, 64).unwrap();
        assert!(p.in_domain(15));
        assert!(!p.in_domain(16));
        assert!(p.in_range(u64::MAX));
        assert_eq!(p.range_bytes(), 8);

        let p = Params::new(64, 1).unwrap();
        assert!(p.in_domain(u64::MAX));
        assert!(p.in_range(1));
        assert!(!p.in_range(2));
    }

    #[test]
    fn serde_revalidates() {
        let params = Params::new(20, 16).unwrap();
        let bytes = bincode::serialize(&params).unwrap();
        let recovered: Params = bincode::deserialize(&bytes).unwrap();
        assert_eq!(params, recovered);

        // A raw (domain_bits, range_bits) encoding with an out-of-range width is rejected
        let bad = bincode::serialize(&(0u8, 16u8)).unwrap();
        assert!(bincode::deserialize::<Params>(&bad).is_err());
        let bad = bincode::serialize(&(20u8, 65u8)).unwrap();
        assert!(bincode::deserialize::<Params>(&bad).is_err());
    }
}
