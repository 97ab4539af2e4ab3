//! LMDB implementation of NonceStore.
//!
//! Key: 32-byte nonce digest. Value: bincode-encoded [`NonceRecord`].

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use rollcall_store::{NonceRecord, NonceStore, StoreError};
use rollcall_types::NonceDigest;

use crate::LmdbError;

pub struct LmdbNonceStore {
    pub(crate) env: Arc<Env>,
    pub(crate) nonces_db: Database<Bytes, Bytes>,
}

impl NonceStore for LmdbNonceStore {
    fn insert_nonce_if_absent(
        &self,
        digest: &NonceDigest,
        record: &NonceRecord,
    ) -> Result<bool, StoreError> {
        // LMDB allows a single writer, so the read and the put below cannot
        // interleave with another insert.
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .nonces_db
            .get(&wtxn, digest.as_bytes())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Ok(false);
        }
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        self.nonces_db
            .put(&mut wtxn, digest.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }

    fn contains_nonce(&self, digest: &NonceDigest) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .nonces_db
            .get(&rtxn, digest.as_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn delete_nonce(&self, digest: &NonceDigest) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.nonces_db
            .delete(&mut wtxn, digest.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn iter_nonces(&self) -> Result<Vec<(NonceDigest, NonceRecord)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for entry in self.nonces_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (key, val) = entry.map_err(LmdbError::from)?;
            let key: [u8; 32] = key
                .try_into()
                .map_err(|_| StoreError::Corruption("nonce key is not 32 bytes".into()))?;
            let record: NonceRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            out.push((NonceDigest::new(key), record));
        }
        Ok(out)
    }

    fn nonce_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.nonces_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use rollcall_types::Timestamp;

    fn record(sequence: u64) -> NonceRecord {
        NonceRecord {
            sequence,
            accepted_at: Timestamp::new(1_000 + sequence),
        }
    }

    #[test]
    fn insert_if_absent_refuses_second_insert() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        let store = env.nonce_store();
        let digest = NonceDigest::new([4; 32]);

        assert!(store.insert_nonce_if_absent(&digest, &record(0)).unwrap());
        assert!(!store.insert_nonce_if_absent(&digest, &record(1)).unwrap());
        assert!(store.contains_nonce(&digest).unwrap());
        assert_eq!(store.nonce_count().unwrap(), 1);

        let all = store.iter_nonces().unwrap();
        assert_eq!(all, vec![(digest, record(0))]);
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        let store = env.nonce_store();
        let digest = NonceDigest::new([5; 32]);

        store.insert_nonce_if_absent(&digest, &record(0)).unwrap();
        store.delete_nonce(&digest).unwrap();
        store.delete_nonce(&digest).unwrap();
        assert!(!store.contains_nonce(&digest).unwrap());
    }

    #[test]
    fn nonces_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let digest = NonceDigest::new([6; 32]);
        {
            let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
            env.nonce_store()
                .insert_nonce_if_absent(&digest, &record(3))
                .unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        assert!(env.nonce_store().contains_nonce(&digest).unwrap());
    }
}
