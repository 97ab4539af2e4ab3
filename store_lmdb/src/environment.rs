//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::info;

use crate::meta::LmdbMetaStore;
use crate::migration::Migrator;
use crate::nonce::LmdbNonceStore;
use crate::queue::LmdbQueueStore;
use crate::LmdbError;

const NONCES_DB: &str = "nonces";
const QUEUE_DB: &str = "queue";
const META_DB: &str = "meta";

/// Default LMDB map size: 256 MiB. The nonce ledger is bounded and the queue
/// is small, so this is generous for a device.
pub const DEFAULT_MAP_SIZE: usize = 256 * 1024 * 1024;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    nonces_db: Database<Bytes, Bytes>,
    queue_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory, create any
    /// missing databases and bring the schema up to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per directory by this process
        // and never concurrently from another process with different flags.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(3)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let nonces_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some(NONCES_DB))?;
        let queue_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some(QUEUE_DB))?;
        let meta_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        let environment = Self {
            env: Arc::new(env),
            nonces_db,
            queue_db,
            meta_db,
        };
        Migrator::run(&environment.meta_store())?;

        info!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(environment)
    }

    pub fn nonce_store(&self) -> LmdbNonceStore {
        LmdbNonceStore {
            env: Arc::clone(&self.env),
            nonces_db: self.nonces_db,
        }
    }

    pub fn queue_store(&self) -> LmdbQueueStore {
        LmdbQueueStore {
            env: Arc::clone(&self.env),
            queue_db: self.queue_db,
            meta_db: self.meta_db,
        }
    }

    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: Arc::clone(&self.env),
            meta_db: self.meta_db,
        }
    }

    /// Flush the memory map to disk.
    pub fn sync(&self) -> Result<(), LmdbError> {
        self.env.force_sync()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_store::{MetaKey, MetaStore};

    #[test]
    fn open_creates_directory_and_sets_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db");
        let env = LmdbEnvironment::open(&path, 16 * 1024 * 1024).unwrap();
        assert!(path.exists());
        assert_eq!(
            env.meta_store().schema_version().unwrap(),
            crate::migration::CURRENT_SCHEMA_VERSION
        );
        env.sync().unwrap();
    }

    #[test]
    fn reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        {
            let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
            env.meta_store().put_meta(MetaKey::SignerKey, &[5; 32]).unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        assert_eq!(
            env.meta_store().get_meta(MetaKey::SignerKey).unwrap(),
            Some(vec![5; 32])
        );
    }
}
