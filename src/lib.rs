//! Two-party function secret sharing for point functions.
//!
//! A dealer holding a secret point `alpha` and value `beta` generates two keys. Evaluated at any
//! `x`, each key alone gives a pseudorandom share, and the two shares sum modulo
//! `2^range_bits` to `beta` when `x == alpha` and to zero everywhere else.
//!
//! [`api`] is the byte-buffer surface, [`point::bgi18`] the typed scheme underneath it.
use rand::{CryptoRng, RngCore};
use std::fmt::Debug;

pub mod api;
pub mod error;
pub mod group;
pub mod handle;
pub mod params;
pub mod point;
pub mod prg;

pub mod data_structures;
pub use data_structures::*;

pub use error::{Error, Result, Status};
pub use group::Endianness;
pub use handle::KeyHandle;
pub use params::{sizes, Params, Sizes, MAX_DOMAIN_BITS, MAX_RANGE_BITS};
pub use point::bgi18::{Bgi18, Key, MAX_EVAL_ALL_BITS};

/// Describes the interface for a function secret sharing scheme. Such a scheme
/// allows a sender to generate keys which provide succinct representations of functions
/// which output secret shares of the underlying function.
///
/// Currently this only supports 2-party FSS schemes.
pub trait FSS {
    /// A succinct representation of a function which outputs shares of the underlying function
    type Key: Debug;

    /// A description of the underlying function
    type Description;

    /// The domain of the underlying function
    type Domain;

    /// The range of the underlying function
    type Range;

    /// A secret share of the evaluation of the underlying function at a point
    type Share;

    /// Number of uniformly random bytes `gen` consumes for `f`
    fn rand_buf_size(f: &Self::Description) -> usize;

    /// Takes the description of a function and a buffer of uniformly random bytes as input, and
    /// outputs two `Key`s.
    fn gen(f: &Self::Description, rand_buf: &[u8]) -> Result<(Self::Key, Self::Key)>;

    /// Same as `gen`, drawing exactly `rand_buf_size` bytes from `rng`
    fn gen_with_rng<RNG: CryptoRng + RngCore>(
        f: &Self::Description,
        rng: &mut RNG,
    ) -> Result<(Self::Key, Self::Key)> {
        let mut rand_buf = vec![0u8; Self::rand_buf_size(f)];
        rng.try_fill_bytes(&mut rand_buf)
            .map_err(|_| Error::Internal("randomness source failed"))?;
        let keys = Self::gen(f, &rand_buf);
        zeroize::Zeroize::zeroize(&mut rand_buf);
        keys
    }

    /// Takes a `Key` and point as input, and outputs a secret share of the underlying function at
    /// that point.
    fn eval(key: &Self::Key, point: &Self::Domain) -> Result<Self::Share>;

    /// Takes the secret shares as input, and outputs the corresponding function value.
    fn decode(shares: (&Self::Share, &Self::Share)) -> Result<Self::Range>;
}
