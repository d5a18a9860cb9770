use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, SerializationError};
use ark_std::io::{Read, Write};
use zeroize::Zeroize;

use crate::{
    group::{bits_to_bytes, mask},
    params::{Params, HEADER_SIZE},
    Error, Pair, Seed,
};

/// One key of a DPF key pair. Both keys of a pair share the same correction words and final
/// correction and differ only in their party id and root seed.
#[derive(Clone)]
pub struct Key {
    party: u8,
    params: Params,
    root: Seed,
    correction_words: Vec<CorrectionWord>,
    final_correction: u64,
}

/// The public per-level value which, gated by a party's control bit, collapses both parties'
/// nodes off the path to the special point and keeps them apart on it
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, CanonicalSerialize, CanonicalDeserialize,
)]
pub struct CorrectionWord {
    pub seeds: Pair<Seed>,
    pub control_bits: Pair<bool>,
}

impl Zeroize for CorrectionWord {
    fn zeroize(&mut self) {
        self.seeds.zeroize();
        self.control_bits = Pair::default();
    }
}

impl Key {
    pub(crate) fn new(
        party: u8,
        params: Params,
        root: Seed,
        correction_words: Vec<CorrectionWord>,
        final_correction: u64,
    ) -> Self {
        debug_assert!(party <= 1);
        debug_assert_eq!(correction_words.len(), params.domain_bits() as usize);
        Self {
            party,
            params,
            root,
            correction_words,
            final_correction,
        }
    }

    /// Which of the two parties this key belongs to (0 or 1)
    pub fn party(&self) -> u8 {
        self.party
    }

    pub fn params(&self) -> Params {
        self.params
    }

    pub fn domain_bits(&self) -> u8 {
        self.params.domain_bits()
    }

    pub fn range_bits(&self) -> u8 {
        self.params.range_bits()
    }

    pub(crate) fn root(&self) -> &Seed {
        &self.root
    }

    pub(crate) fn correction_words(&self) -> &[CorrectionWord] {
        &self.correction_words
    }

    pub(crate) fn final_correction(&self) -> u64 {
        self.final_correction
    }

    /// Parse a key blob. Only the structure is checked: a correctly-sized blob with corrupted
    /// contents parses fine and evaluates to garbage. This is the entry point that maps every
    /// rejection to `MalformedKey`; `CanonicalDeserialize` applies the same checks.
    pub fn from_bytes(blob: &[u8]) -> crate::Result<Self> {
        if blob.len() < HEADER_SIZE {
            return Err(Error::MalformedKey(format!(
                "blob of {} bytes is shorter than the header",
                blob.len()
            )));
        }
        let params = Params::new(blob[1], blob[2])
            .map_err(|_| Error::MalformedKey("header widths out of range".into()))?;
        if blob[0] > 1 {
            return Err(Error::MalformedKey(format!("party byte {} is not 0 or 1", blob[0])));
        }
        if blob.len() != params.key_blob_size() {
            return Err(Error::MalformedKey(format!(
                "blob is {} bytes, expected {}",
                blob.len(),
                params.key_blob_size()
            )));
        }

        Self::deserialize(blob).map_err(|e| Error::MalformedKey(e.to_string()))
    }

    /// The blob encoding of this key, exactly `key_blob_size` bytes long
    pub fn to_bytes(&self) -> crate::Result<Vec<u8>> {
        let mut blob = Vec::with_capacity(self.serialized_size());
        self.serialize(&mut blob)
            .map_err(|_| Error::Internal("key serialization failed"))?;
        Ok(blob)
    }

    /// Write the blob encoding into `out`, which must be exactly `key_blob_size` bytes
    pub(crate) fn write_bytes(&self, out: &mut [u8]) -> crate::Result<()> {
        if out.len() != self.serialized_size() {
            return Err(Error::Internal("key output buffer has the wrong size"));
        }
        self.serialize(out)
            .map_err(|_| Error::Internal("key serialization failed"))
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key")
            .field("party", &self.party)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Zeroize for Key {
    fn zeroize(&mut self) {
        self.root.zeroize();
        self.correction_words.iter_mut().for_each(Zeroize::zeroize);
        self.final_correction.zeroize();
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Keys use a fixed little-endian layout: the header bytes, the root seed, every correction word
/// in level order, then the final correction in `ceil(range_bits / 8)` bytes. A key is always a
/// whole blob, so deserializing rejects a reader with bytes left over.
impl CanonicalSerialize for Key {
    fn serialize<W: Write>(&self, mut writer: W) -> Result<(), SerializationError> {
        writer.write_all(&[self.party, self.domain_bits(), self.range_bits()])?;
        self.root.serialize(&mut writer)?;
        for cw in self.correction_words.iter() {
            cw.serialize(&mut writer)?;
        }
        let fc = self.final_correction.to_le_bytes();
        writer.write_all(&fc[..bits_to_bytes(self.range_bits())])?;
        Ok(())
    }

    fn serialized_size(&self) -> usize {
        self.params.key_blob_size()
    }
}

impl CanonicalDeserialize for Key {
    fn deserialize<R: Read>(mut reader: R) -> Result<Self, SerializationError> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;
        let [party, domain_bits, range_bits] = header;
        if party > 1 {
            return Err(SerializationError::InvalidData);
        }
        let params =
            Params::new(domain_bits, range_bits).map_err(|_| SerializationError::InvalidData)?;

        let root = Seed::deserialize(&mut reader)?;
        let correction_words = (0..domain_bits)
            .map(|_| CorrectionWord::deserialize(&mut reader))
            .collect::<Result<Vec<_>, _>>()?;

        let mut fc = [0u8; 8];
        reader.read_exact(&mut fc[..bits_to_bytes(range_bits)])?;
        let final_correction = u64::from_le_bytes(fc) & mask(range_bits);
        if reader.read(&mut [0u8; 1])? != 0 {
            return Err(SerializationError::InvalidData);
        }

        Ok(Key::new(
            party,
            params,
            root,
            correction_words,
            final_correction,
        ))
    }
}
