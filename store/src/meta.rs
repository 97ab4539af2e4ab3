//! Facts about the data directory itself rather than any claim or queue item.

use rollcall_types::PublicKey;

use crate::StoreError;

/// The values kept in the meta store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetaKey {
    /// Schema version, little-endian `u32`. Absent in a fresh directory.
    SchemaVersion,
    /// Next queue creation sequence, little-endian `u64`.
    QueueSequence,
    /// Public key of the device identity that signed the queued envelopes.
    SignerKey,
}

impl MetaKey {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::SchemaVersion => b"schema_version",
            Self::QueueSequence => b"queue_sequence",
            Self::SignerKey => b"signer_key",
        }
    }
}

pub trait MetaStore: Send + Sync {
    fn put_meta(&self, key: MetaKey, value: &[u8]) -> Result<(), StoreError>;

    /// `None` if the key was never written.
    fn get_meta(&self, key: MetaKey) -> Result<Option<Vec<u8>>, StoreError>;

    /// 0 for a directory no schema was ever written to.
    fn schema_version(&self) -> Result<u32, StoreError> {
        let Some(bytes) = self.get_meta(MetaKey::SchemaVersion)? else {
            return Ok(0);
        };
        let arr: [u8; 4] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| StoreError::Corruption("schema_version is not 4 bytes".into()))?;
        Ok(u32::from_le_bytes(arr))
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.put_meta(MetaKey::SchemaVersion, &version.to_le_bytes())
    }

    /// Record `key` as the device signing identity.
    ///
    /// Returns the previously recorded key when it differs. Envelopes already
    /// queued keep the signer they were created with.
    fn replace_signer_key(&self, key: &PublicKey) -> Result<Option<PublicKey>, StoreError> {
        let previous = match self.get_meta(MetaKey::SignerKey)? {
            Some(bytes) => Some(PublicKey(bytes.as_slice().try_into().map_err(|_| {
                StoreError::Corruption("signer_key is not 32 bytes".into())
            })?)),
            None => None,
        };
        if previous.as_ref() == Some(key) {
            return Ok(None);
        }
        self.put_meta(MetaKey::SignerKey, key.as_bytes())?;
        Ok(previous)
    }
}
