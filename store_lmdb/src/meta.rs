//! LMDB implementation of MetaStore.
//!
//! Shares the `meta` database with the queue's sequence counter.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use rollcall_store::{MetaKey, MetaStore, StoreError};

use crate::LmdbError;

pub struct LmdbMetaStore {
    pub(crate) env: Arc<Env>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl MetaStore for LmdbMetaStore {
    fn put_meta(&self, key: MetaKey, value: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_meta(&self, key: MetaKey) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(val.map(<[u8]>::to_vec))
    }
}

#[cfg(test)]
mod tests {
    use crate::LmdbEnvironment;
    use rollcall_store::{MetaKey, MetaStore, StoreError};
    use rollcall_types::PublicKey;

    fn open() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        (dir, env)
    }

    #[test]
    fn first_signer_key_is_recorded_silently() {
        let (_dir, env) = open();
        let meta = env.meta_store();
        assert_eq!(meta.get_meta(MetaKey::SignerKey).unwrap(), None);

        assert_eq!(meta.replace_signer_key(&PublicKey([1; 32])).unwrap(), None);
        assert_eq!(meta.replace_signer_key(&PublicKey([1; 32])).unwrap(), None);
        assert_eq!(meta.get_meta(MetaKey::SignerKey).unwrap(), Some(vec![1; 32]));
    }

    #[test]
    fn changed_signer_key_reports_the_old_one() {
        let (_dir, env) = open();
        let meta = env.meta_store();
        meta.replace_signer_key(&PublicKey([1; 32])).unwrap();

        assert_eq!(
            meta.replace_signer_key(&PublicKey([2; 32])).unwrap(),
            Some(PublicKey([1; 32]))
        );
        assert_eq!(meta.get_meta(MetaKey::SignerKey).unwrap(), Some(vec![2; 32]));
    }

    #[test]
    fn truncated_schema_version_is_corruption() {
        let (_dir, env) = open();
        let meta = env.meta_store();
        meta.put_meta(MetaKey::SchemaVersion, &[1, 0]).unwrap();
        assert!(matches!(meta.schema_version(), Err(StoreError::Corruption(_))));
    }
}
