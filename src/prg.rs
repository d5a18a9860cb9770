use aes::{
    cipher::{BlockEncrypt, KeyInit},
    Aes128, Block,
};
use once_cell::sync::Lazy;

use crate::{group::Z64, Pair, Seed, SEED_SIZE};

/// AES block size in bytes
const AES_BLOCK_SIZE: usize = 16;

/// Public fixed key of the cipher. Security rests on modelling fixed-key AES as a random
/// permutation, so this value is not secret.
const FIXED_KEY: [u8; AES_BLOCK_SIZE] = [
    0x9b, 0x4f, 0x1e, 0x63, 0xd2, 0x07, 0xa8, 0x35, 0x6c, 0xf1, 0x20, 0x8e, 0x57, 0xb4, 0x3a, 0xc9,
];

/// Tweaks XORed into the last byte of a seed to derive independent blocks
const TWEAK_LEFT: u8 = 0;
const TWEAK_RIGHT: u8 = 1;
const TWEAK_CONVERT: u8 = 2;

/// Shared instance. The cipher state is read-only after key expansion so it can be used from any
/// number of threads.
pub(crate) static PRG: Lazy<Prg> = Lazy::new(Prg::new);

/// Length-doubling PRG built from fixed-key AES with the correlation-robust hash
/// `H(x) = AES_k(x) ^ x`
pub struct Prg {
    aes: Aes128,
}

/// The two children of a node in the GGM tree
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Node {
    pub seeds: Pair<Seed>,
    pub control_bits: Pair<bool>,
}

impl Default for Prg {
    fn default() -> Self {
        Self::new()
    }
}

impl Prg {
    pub fn new() -> Prg {
        Self {
            aes: Aes128::new(&FIXED_KEY.into()),
        }
    }

    #[inline]
    fn tweak(seed: &Seed, tweak: u8) -> Block {
        let mut block = Block::from(seed.0);
        block[AES_BLOCK_SIZE - 1] ^= tweak;
        block
    }

    /// Apply the hash to every block in place
    #[inline]
    fn hash_blocks<const N: usize>(&self, blocks: &mut [Block; N]) {
        let inputs = *blocks;
        self.aes.encrypt_blocks(blocks);
        blocks
            .iter_mut()
            .zip(inputs.iter())
            .for_each(|(out, input)| {
                out.iter_mut().zip(input.iter()).for_each(|(o, i)| *o ^= i);
            });
    }

    /// Expand `seed` into both child seeds and control bits. The control bit of each child is the
    /// lowest bit of its block, which is then cleared from the child seed. Both children are
    /// always computed.
    pub fn expand(&self, seed: &Seed) -> Node {
        let mut blocks = [
            Self::tweak(seed, TWEAK_LEFT),
            Self::tweak(seed, TWEAK_RIGHT),
        ];
        self.hash_blocks(&mut blocks);

        let mut node = Node::default();
        for (i, block) in blocks.iter().enumerate() {
            let mut child = [0u8; SEED_SIZE];
            child.copy_from_slice(block.as_slice());
            node.control_bits[i] = (child[0] & 1) == 1;
            child[0] &= 0xFE;
            node.seeds[i] = Seed(child);
        }
        node
    }

    /// Map a terminal seed to a group element
    pub fn convert(&self, seed: &Seed) -> Z64 {
        let mut blocks = [Self::tweak(seed, TWEAK_CONVERT)];
        self.hash_blocks(&mut blocks);

        let mut out = [0u8; AES_BLOCK_SIZE];
        out.copy_from_slice(blocks[0].as_slice());
        Z64::from_block(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    fn rand_seed() -> Seed {
        let mut seed = Seed::default();
        ark_std::test_rng().fill_bytes(&mut seed.0);
        seed
    }

    #[test]
    fn prg_consistency() {
        // Check that two different instances of the PRG give the same result on the same seed
        let seed = rand_seed();
        let prg1 = Prg::new();
        let prg2 = Prg::default();

        assert_eq!(prg1.expand(&seed), prg2.expand(&seed));
        assert_eq!(prg1.expand(&seed), PRG.expand(&seed));
        assert_eq!(prg1.convert(&seed), prg2.convert(&seed));
    }

    #[test]
    fn children_are_distinct() {
        let seed = rand_seed();
        let node = PRG.expand(&seed);
        assert_ne!(node.seeds[0], node.seeds[1]);
        assert_ne!(node.seeds[0], seed);

        // The control bit is stripped from the child seed
        for child in node.seeds.iter() {
            assert_eq!(child.0[0] & 1, 0);
        }

        // A flipped seed byte changes everything downstream
        let mut other = seed;
        other.0[7] ^= 0x80;
        assert_ne!(PRG.expand(&other).seeds, node.seeds);
        assert_ne!(PRG.convert(&other), PRG.convert(&seed));
    }

    #[test]
    fn control_bits_are_balanced() {
        let mut rng = ark_std::test_rng();
        let mut ones = 0usize;
        let trials = 2000;
        for _ in 0..trials {
            let mut seed = Seed::default();
            rng.fill_bytes(&mut seed.0);
            let node = PRG.expand(&seed);
            ones += node.control_bits[0] as usize + node.control_bits[1] as usize;
        }
        // Very loose bound, only catches a constant bit
        assert!(ones > trials / 2 && ones < 3 * trials / 2);
    }
}
