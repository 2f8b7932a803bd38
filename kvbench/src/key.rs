use crate::errors::{BenchError, BenchResult, ErrorKind};
use std::fmt::{Debug, Display, Formatter};

/// Length in bytes of every generated key.
pub const KEY_LENGTH: usize = 32;

/// Fixed-length opaque key used in the reference table of a batch.
///
/// Keys own their bytes. Building a key from a slice copies it and handing the
/// bytes to a storage engine copies them again, so no buffer is ever shared
/// across the storage boundary.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key([u8; KEY_LENGTH]);

impl Key {
    #[inline]
    pub fn new(bytes: [u8; KEY_LENGTH]) -> Key {
        Key(bytes)
    }

    /// Copies `bytes` into a new key.
    ///
    /// Fails with [`ErrorKind::InvalidOperation`] unless the slice is exactly
    /// [`KEY_LENGTH`] bytes long.
    pub fn from_slice(bytes: &[u8]) -> BenchResult<Key> {
        let array: [u8; KEY_LENGTH] = bytes.try_into().map_err(|_| {
            BenchError::new(
                &format!(
                    "Key must be {} bytes long, got {} bytes",
                    KEY_LENGTH,
                    bytes.len()
                ),
                ErrorKind::InvalidOperation,
            )
        })?;
        Ok(Key(array))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns an owned copy of the key bytes.
    #[inline]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key({})", self)
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
