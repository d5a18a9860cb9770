//! Owned key handles with an explicit destroy step
use tracing::debug;

use crate::{api, Endianness, Error, Key, Result};

/// A parsed key that can be destroyed before it goes out of scope. A handle that was never
/// parsed, or has been destroyed, rejects every use with `InvalidParameter`.
#[derive(Debug, Default)]
pub struct KeyHandle {
    key: Option<Key>,
}

impl KeyHandle {
    /// Parse `blob` into a live handle
    pub fn parse(blob: &[u8]) -> Result<Self> {
        Ok(Self {
            key: Some(api::parse_key(blob)?),
        })
    }

    pub fn is_live(&self) -> bool {
        self.key.is_some()
    }

    pub fn key(&self) -> Result<&Key> {
        self.key
            .as_ref()
            .ok_or(Error::InvalidParameter("key handle is not live"))
    }

    /// Same as `api::eval` on the held key
    pub fn eval(&self, x: &[u8], endianness: Endianness) -> Result<Vec<u8>> {
        api::eval(self.key()?, x, endianness)
    }

    /// Same as `api::eval_into` on the held key
    pub fn eval_into(&self, x: &[u8], endianness: Endianness, y_out: &mut [u8]) -> Result<()> {
        api::eval_into(self.key()?, x, endianness, y_out)
    }

    /// Zeroize and release the key. Fails if the handle is not live.
    pub fn destroy(&mut self) -> Result<()> {
        // Dropping the key zeroizes it
        let key = self
            .key
            .take()
            .ok_or(Error::InvalidParameter("key handle is not live"))?;
        debug!(party = key.party(), "destroyed key handle");
        Ok(())
    }
}

impl From<Key> for KeyHandle {
    fn from(key: Key) -> Self {
        Self { key: Some(key) }
    }
}
