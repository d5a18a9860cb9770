//! A module containing data structures relevant to FSS schemes
use ark_serialize::{
    CanonicalDeserialize as Deserialize, CanonicalSerialize as Serialize, SerializationError,
};
use ark_std::io::{Read, Write};
use std::ops::{BitXor, BitXorAssign, Index, IndexMut};
use subtle::{Choice, ConditionallySelectable};
use zeroize::Zeroize;

/// Size of a PRG seed in bytes
pub const SEED_SIZE: usize = 16;

/// A PRG seed
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Seed(pub(crate) [u8; SEED_SIZE]);

impl Seed {
    pub const ZERO: Self = Self([0u8; SEED_SIZE]);

    /// Takes the first `SEED_SIZE` bytes of `bytes`, or `None` if there are not enough of them
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let mut seed = [0u8; SEED_SIZE];
        seed.copy_from_slice(bytes.get(..SEED_SIZE)?);
        Some(Self(seed))
    }

    pub fn as_bytes(&self) -> &[u8; SEED_SIZE] {
        &self.0
    }

    /// XOR `rhs` into `self` iff `choice` is set
    #[inline]
    pub fn conditional_xor(&mut self, rhs: &Self, choice: Choice) {
        let xored = *self ^ *rhs;
        self.conditional_assign(&xored, choice);
    }
}

impl BitXor for Seed {
    type Output = Self;

    fn bitxor(mut self, rhs: Self) -> Self::Output {
        self ^= rhs;
        self
    }
}

impl BitXorAssign for Seed {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0
            .iter_mut()
            .zip(rhs.0.iter())
            .for_each(|(s, r)| *s ^= r);
    }
}

impl ConditionallySelectable for Seed {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        let mut out = Self::ZERO;
        for i in 0..SEED_SIZE {
            out.0[i] = u8::conditional_select(&a.0[i], &b.0[i], choice);
        }
        out
    }
}

impl Zeroize for Seed {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl Serialize for Seed {
    fn serialize<W: Write>(&self, mut writer: W) -> Result<(), SerializationError> {
        writer.write_all(&self.0)?;
        Ok(())
    }

    fn serialized_size(&self) -> usize {
        SEED_SIZE
    }
}

impl Deserialize for Seed {
    fn deserialize<R: Read>(mut reader: R) -> Result<Self, SerializationError> {
        let mut seed = [0u8; SEED_SIZE];
        reader.read_exact(&mut seed)?;
        Ok(Self(seed))
    }
}

/// A container for two identical-type objects which can be indexed using `bool`
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Pair<T>([T; 2]);

impl<T> Pair<T> {
    #[inline]
    pub fn new(first: T, second: T) -> Self {
        Self([first, second])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T: ConditionallySelectable> Pair<T> {
    /// Returns `self[0]` if `choice` is unset and `self[1]` otherwise, without branching on
    /// `choice`
    #[inline]
    pub fn select(&self, choice: Choice) -> T {
        T::conditional_select(&self.0[0], &self.0[1], choice)
    }
}

impl Pair<bool> {
    /// Same as `Pair::select`, for control bits stored as `bool`s
    #[inline]
    pub fn select_bit(&self, choice: Choice) -> Choice {
        Choice::conditional_select(&choice_of(self.0[0]), &choice_of(self.0[1]), choice)
    }
}

/// Lift a public or stored bit into a `Choice`
#[inline]
pub fn choice_of(bit: bool) -> Choice {
    Choice::from(bit as u8)
}

impl<T: Sized + Clone> Index<usize> for Pair<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        assert!(index == 0 || index == 1);
        &self.0[index]
    }
}

impl<T: Sized + Clone> IndexMut<usize> for Pair<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        assert!(index == 0 || index == 1);
        &mut self.0[index]
    }
}

impl<T: Sized + Clone> Index<bool> for Pair<T> {
    type Output = T;

    fn index(&self, index: bool) -> &Self::Output {
        &self.0[index as usize]
    }
}

impl<T: Sized + Clone> IndexMut<bool> for Pair<T> {
    fn index_mut(&mut self, index: bool) -> &mut Self::Output {
        &mut self.0[index as usize]
    }
}

impl<T: Zeroize> Zeroize for Pair<T> {
    fn zeroize(&mut self) {
        self.0.iter_mut().for_each(Zeroize::zeroize);
    }
}

impl Serialize for Pair<Seed> {
    fn serialize<W: Write>(&self, mut writer: W) -> Result<(), SerializationError> {
        self.0[0].serialize(&mut writer)?;
        self.0[1].serialize(&mut writer)
    }

    fn serialized_size(&self) -> usize {
        2 * SEED_SIZE
    }
}

impl Deserialize for Pair<Seed> {
    #[inline]
    fn deserialize<R: Read>(mut reader: R) -> Result<Self, SerializationError> {
        let first = Seed::deserialize(&mut reader)?;
        let second = Seed::deserialize(&mut reader)?;
        Ok(Pair([first, second]))
    }
}

/// For `Pair<bool>` we can save space by encoding both bits into a single `u8`.
impl Serialize for Pair<bool> {
    fn serialize<W: Write>(&self, mut writer: W) -> Result<(), SerializationError> {
        let byte: u8 = (self[0] as u8) << 1 | self[1] as u8;
        byte.serialize(&mut writer)
    }

    fn serialized_size(&self) -> usize {
        1
    }
}

/// For `Pair<bool>` we can save space by encoding both bits into a single `u8`. Any bits above
/// the lowest two are ignored.
impl Deserialize for Pair<bool> {
    #[inline]
    fn deserialize<R: Read>(mut reader: R) -> Result<Self, SerializationError> {
        let byte = <u8>::deserialize(&mut reader)?;
        Ok(Pair([(byte & 2) == 2, (byte & 1) == 1]))
    }
}

#[cfg(test)]
mod tests {
    use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
    use ark_std::test_rng;
    use rand::{Rng, RngCore};
    use subtle::Choice;

    use super::{Pair, Seed, SEED_SIZE};

    fn rand_seed<R: RngCore>(rng: &mut R) -> Seed {
        let mut seed = Seed::default();
        rng.fill_bytes(&mut seed.0);
        seed
    }

    #[test]
    fn test_pair_serialization() {
        let mut rng = test_rng();

        // Create seed and bit Pairs
        let seeds = Pair::new(rand_seed(&mut rng), rand_seed(&mut rng));

        let mut control_bits = Pair::<bool>::default();
        control_bits[0] = rng.gen_bool(0.5);
        control_bits[1] = rng.gen_bool(0.5);

        // Serialize the pairs and assert the correct lengths
        let mut serialized_seeds = vec![0; seeds.serialized_size()];
        let mut serialized_bits = vec![0; control_bits.serialized_size()];
        seeds.serialize(&mut serialized_seeds[..]).unwrap();
        control_bits.serialize(&mut serialized_bits[..]).unwrap();
        assert!(serialized_bits.len() == 1);
        assert!(serialized_seeds.len() == SEED_SIZE * 2);

        // Deserialize the Pairs and ensure they're unchanged
        let recovered_seeds = <Pair<Seed>>::deserialize(serialized_seeds.as_slice()).unwrap();
        let recovered_bits = <Pair<bool>>::deserialize(serialized_bits.as_slice()).unwrap();
        assert!(seeds == recovered_seeds);
        assert!(control_bits == recovered_bits);
    }

    #[test]
    fn test_bit_pair_layout() {
        // The left bit lives in bit 1 and the right bit in bit 0, higher bits are ignored
        let bits = <Pair<bool>>::deserialize(&[0b1111_1110u8][..]).unwrap();
        assert_eq!(bits, Pair::new(true, false));

        let mut out = [0u8; 1];
        Pair::new(false, true).serialize(&mut out[..]).unwrap();
        assert_eq!(out, [0b01]);
    }

    #[test]
    fn test_truncated_seed() {
        let short = [0u8; SEED_SIZE - 1];
        assert!(Seed::deserialize(&short[..]).is_err());
        assert!(Seed::from_slice(&short).is_none());
    }

    #[test]
    fn test_selects() {
        let mut rng = test_rng();
        let a = rand_seed(&mut rng);
        let b = rand_seed(&mut rng);
        let pair = Pair::new(a, b);
        assert_eq!(pair.select(Choice::from(0)), a);
        assert_eq!(pair.select(Choice::from(1)), b);

        let bits = Pair::new(true, false);
        assert!(bool::from(bits.select_bit(Choice::from(0))));
        assert!(!bool::from(bits.select_bit(Choice::from(1))));

        let mut c = a;
        c.conditional_xor(&b, Choice::from(0));
        assert_eq!(c, a);
        c.conditional_xor(&b, Choice::from(1));
        assert_eq!(c, a ^ b);
        assert_eq!(c ^ b, a);
    }
}
