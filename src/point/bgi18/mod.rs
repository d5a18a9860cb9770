use num_traits::Zero;
use subtle::{Choice, ConditionallySelectable};
use tracing::debug;
use zeroize::Zeroize;

use super::{decode_shares, PointFunction, Share, DPF};
use crate::{
    data_structures::choice_of,
    group::Z64,
    prg::{Node, PRG},
    Error, Pair, Result, Seed, FSS, SEED_SIZE,
};

mod data_structures;
pub use data_structures::*;

/// Largest number of free input bits `eval_all` will expand, 128 MiB of `u64` shares
pub const MAX_EVAL_ALL_BITS: u8 = 24;

/// DPF scheme based on [[BGI18]]: a GGM tree with one correction word per level and a single
/// final correction in `Z / 2^range_bits`.
///
/// [BGI18]: https://eprint.iacr.org/2018/707.pdf
pub struct Bgi18;

impl Bgi18 {
    /// The `i`-th most significant bit of the `bits`-bit integer `x`
    #[inline]
    fn bit_at(x: u64, bits: u8, i: usize) -> Choice {
        Choice::from(((x >> (bits as usize - 1 - i)) & 1) as u8)
    }

    /// The `i`-th seed-sized chunk of the randomness buffer
    fn rand_seed(rand_buf: &[u8], i: usize) -> Result<Seed> {
        rand_buf
            .get(SEED_SIZE * i..)
            .and_then(Seed::from_slice)
            .ok_or(Error::Internal("randomness buffer shorter than checked"))
    }

    /// Take the child of `node` selected by `bit`, applying `cw` iff the control bit `t` is set
    #[inline]
    fn descend(node: &Node, t: Choice, cw: &CorrectionWord, bit: Choice) -> (Seed, Choice) {
        let mut seed = node.seeds.select(bit);
        seed.conditional_xor(&cw.seeds.select(bit), t);
        let control_bit = node.control_bits.select_bit(bit) ^ (t & cw.control_bits.select_bit(bit));
        (seed, control_bit)
    }

    /// Turn a terminal seed and control bit into this party's output share
    #[inline]
    fn leaf(key: &Key, seed: &Seed, t: Choice) -> u64 {
        let correction = Z64::conditional_select(&Z64::zero(), &Z64::new(key.final_correction()), t);
        let mut share = PRG.convert(seed) + correction;
        share.conditional_negate(choice_of(key.party() == 1));
        share.reduce(key.range_bits())
    }

    /// Walk the first `bits` levels of the tree along the top bits of `prefix`
    fn walk(key: &Key, prefix: u64, bits: u8) -> (Seed, Choice) {
        let mut seed = *key.root();
        let mut t = choice_of(key.party() == 1);
        for (i, cw) in key.correction_words()[..bits as usize].iter().enumerate() {
            (seed, t) = Self::descend(&PRG.expand(&seed), t, cw, Self::bit_at(prefix, bits, i));
        }
        (seed, t)
    }

    /// A zeroed buffer for `2^free_bits` shares. Fails instead of aborting when it cannot be
    /// allocated.
    pub(crate) fn leaf_buffer(free_bits: u8) -> Result<Vec<u64>> {
        let len = 1usize
            .checked_shl(u32::from(free_bits))
            .ok_or(Error::Internal("too many inputs for this platform"))?;
        let mut out = Vec::new();
        out.try_reserve_exact(len)
            .map_err(|_| Error::Internal("not enough memory to evaluate every input"))?;
        out.resize(len, 0);
        Ok(out)
    }

    /// Fill `out` with the shares of every leaf below the node at `level`, left to right
    fn recursive_eval(key: &Key, seed: Seed, t: Choice, level: usize, out: &mut [u64]) {
        if level == key.domain_bits() as usize {
            out[0] = Self::leaf(key, &seed, t);
            return;
        }

        // Evaluate both paths of the tree
        let node = PRG.expand(&seed);
        let cw = &key.correction_words()[level];
        let (left, right) = out.split_at_mut(out.len() / 2);

        let (left_seed, left_t) = Self::descend(&node, t, cw, Choice::from(0));
        Self::recursive_eval(key, left_seed, left_t, level + 1, left);

        let (right_seed, right_t) = Self::descend(&node, t, cw, Choice::from(1));
        Self::recursive_eval(key, right_seed, right_t, level + 1, right);
    }
}

impl FSS for Bgi18 {
    type Key = Key;
    type Description = PointFunction;
    type Domain = u64;
    type Range = u64;
    type Share = Share;

    fn rand_buf_size(f: &Self::Description) -> usize {
        f.params.rand_buf_size()
    }

    fn gen(f: &Self::Description, rand_buf: &[u8]) -> Result<(Self::Key, Self::Key)> {
        let f = PointFunction::new(f.params, f.alpha, f.beta)?;
        let params = f.params;
        let needed = params.rand_buf_size();
        if rand_buf.len() < needed {
            return Err(Error::InsufficientRandomness {
                needed,
                actual: rand_buf.len(),
            });
        }
        let domain_bits = params.domain_bits();

        let roots = Pair::new(Self::rand_seed(rand_buf, 0)?, Self::rand_seed(rand_buf, 1)?);
        let mut seeds = roots;
        let mut control_bits = Pair::new(Choice::from(0), Choice::from(1));

        let mut correction_words = Vec::with_capacity(domain_bits as usize);
        for i in 0..domain_bits as usize {
            let a = Self::bit_at(f.alpha, domain_bits, i);
            let nodes = Pair::new(PRG.expand(&seeds[0]), PRG.expand(&seeds[1]));

            // Off the path the parties must end up with the same seed, so the correction is the
            // XOR of their seeds there. The same value is stored for both children: on the path
            // only one party applies it, and the seeds stay apart.
            let lose_seeds = nodes.iter().map(|n| Pair::new(n.seeds[1], n.seeds[0]).select(a));
            let lose = lose_seeds.fold(Seed::ZERO, |acc, s| acc ^ s);

            // Off the path the control bits become equal, on it they differ
            let t_left = choice_of(nodes[0].control_bits[0])
                ^ choice_of(nodes[1].control_bits[0])
                ^ a
                ^ Choice::from(1);
            let t_right =
                choice_of(nodes[0].control_bits[1]) ^ choice_of(nodes[1].control_bits[1]) ^ a;

            let cw = CorrectionWord {
                seeds: Pair::new(lose, lose),
                control_bits: Pair::new(bool::from(t_left), bool::from(t_right)),
            };

            for p in 0..2 {
                (seeds[p], control_bits[p]) = Self::descend(&nodes[p], control_bits[p], &cw, a);
            }
            correction_words.push(cw);
        }

        // Mask the terminal outputs so the shares sum to `beta` on the path
        let mut final_correction =
            Z64::new(f.beta) - PRG.convert(&seeds[0]) + PRG.convert(&seeds[1]);
        final_correction.conditional_negate(control_bits[1]);
        let final_correction = final_correction.reduce(params.range_bits());
        seeds.zeroize();

        debug!(
            domain_bits,
            range_bits = params.range_bits(),
            "generated point function key pair"
        );

        let key_0 = Key::new(0, params, roots[0], correction_words.clone(), final_correction);
        let key_1 = Key::new(1, params, roots[1], correction_words, final_correction);
        Ok((key_0, key_1))
    }

    fn eval(key: &Self::Key, point: &Self::Domain) -> Result<Self::Share> {
        if !key.params().in_domain(*point) {
            return Err(Error::InvalidParameter("x is outside the domain"));
        }
        let (seed, t) = Self::walk(key, *point, key.domain_bits());
        Ok(Share {
            value: Self::leaf(key, &seed, t),
            range_bits: key.range_bits(),
        })
    }

    fn decode(shares: (&Self::Share, &Self::Share)) -> Result<Self::Range> {
        decode_shares(shares)
    }
}

impl DPF for Bgi18 {
    fn eval_all(key: &Self::Key, prefix: u64, prefix_bits: u8) -> Result<Vec<u64>> {
        let domain_bits = key.domain_bits();
        if prefix_bits > domain_bits {
            return Err(Error::InvalidParameter("prefix is longer than the domain"));
        }
        let free_bits = domain_bits - prefix_bits;
        if free_bits > MAX_EVAL_ALL_BITS {
            return Err(Error::InvalidParameter("too many inputs to evaluate at once"));
        }
        if prefix_bits < 64 && prefix >> prefix_bits != 0 {
            return Err(Error::InvalidParameter("prefix does not fit in prefix_bits"));
        }

        let (seed, t) = Self::walk(key, prefix, prefix_bits);
        let mut out = Self::leaf_buffer(free_bits)?;
        Self::recursive_eval(key, seed, t, prefix_bits as usize, &mut out);
        Ok(out)
    }
}
