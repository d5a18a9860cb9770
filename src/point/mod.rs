//! A module implementing distributed point function schemes
use crate::{group::add_mod, params::Params, Error, Result, FSS};


/// DPF scheme based on [[BGI18]], with outputs in `Z / 2^range_bits`.
///
/// [BGI18]: https://eprint.iacr.org/2018/707.pdf
pub mod bgi18;

/// The description of a point function: the bit widths of its domain and range, the special
/// point `alpha` and the value `beta` at that point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PointFunction {
    pub params: Params,
    pub alpha: u64,
    pub beta: u64,
}

impl PointFunction {
    pub fn new(params: Params, alpha: u64, beta: u64) -> Result<Self> {
        if !params.in_domain(alpha) {
            return Err(Error::InvalidParameter("alpha is outside the domain"));
        }
        if !params.in_range(beta) {
            return Err(Error::InvalidParameter("beta is outside the range"));
        }
        Ok(Self {
            params,
            alpha,
            beta,
        })
    }

    /// The plaintext function itself
    pub fn eval(&self, x: u64) -> u64 {
        match x == self.alpha {
            true => self.beta,
            false => 0,
        }
    }
}

/// One party's additive share of a point function evaluation
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Share {
    pub value: u64,
    pub range_bits: u8,
}

/// A distributed point function (DPF) is a type of FSS scheme for point functions.
pub trait DPF:
    FSS<Description = PointFunction, Domain = u64, Range = u64, Share = Share>
{
    /// Evaluate `key` at every input whose top `prefix_bits` bits equal `prefix`, in increasing
    /// order of the input
    fn eval_all(key: &Self::Key, prefix: u64, prefix_bits: u8) -> Result<Vec<u64>>;
}

/// Recombine the two parties' shares
pub(crate) fn decode_shares(shares: (&Share, &Share)) -> Result<u64> {
    let (a, b) = shares;
    if a.range_bits != b.range_bits {
        return Err(Error::InvalidParameter("shares come from different ranges"));
    }
    Ok(add_mod(a.range_bits, a.value, b.value))
}
