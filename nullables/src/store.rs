//! Nullable stores: thread-safe in-memory storage for testing.
//!
//! Both stores can be switched into a failing mode to exercise the
//! "persistence unavailable" paths.

use rollcall_store::{NonceRecord, NonceStore, QueueItem, QueueStore, StoreError};
use rollcall_types::{ItemId, NonceDigest};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

fn unavailable() -> StoreError {
    StoreError::Backend("null store set to fail".into())
}

/// An in-memory nonce store.
#[derive(Default)]
pub struct NullNonceStore {
    nonces: Mutex<HashMap<NonceDigest, NonceRecord>>,
    fail_writes: AtomicBool,
}

impl NullNonceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (reads keep working).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

impl NonceStore for NullNonceStore {
    fn insert_nonce_if_absent(
        &self,
        digest: &NonceDigest,
        record: &NonceRecord,
    ) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut nonces = self.nonces.lock().unwrap();
        if nonces.contains_key(digest) {
            return Ok(false);
        }
        nonces.insert(*digest, *record);
        Ok(true)
    }

    fn contains_nonce(&self, digest: &NonceDigest) -> Result<bool, StoreError> {
        Ok(self.nonces.lock().unwrap().contains_key(digest))
    }

    fn delete_nonce(&self, digest: &NonceDigest) -> Result<(), StoreError> {
        self.check_writable()?;
        self.nonces.lock().unwrap().remove(digest);
        Ok(())
    }

    fn iter_nonces(&self) -> Result<Vec<(NonceDigest, NonceRecord)>, StoreError> {
        Ok(self
            .nonces
            .lock()
            .unwrap()
            .iter()
            .map(|(d, r)| (*d, *r))
            .collect())
    }

    fn nonce_count(&self) -> Result<u64, StoreError> {
        Ok(self.nonces.lock().unwrap().len() as u64)
    }
}

/// An in-memory queue store.
#[derive(Default)]
pub struct NullQueueStore {
    items: Mutex<HashMap<ItemId, QueueItem>>,
    sequence: AtomicU64,
    fail_writes: AtomicBool,
}

impl NullQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (reads keep working).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

impl QueueStore for NullQueueStore {
    fn insert_item_if_absent(&self, item: &QueueItem) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut items = self.items.lock().unwrap();
        if items.contains_key(&item.id) {
            return Ok(false);
        }
        items.insert(item.id, item.clone());
        Ok(true)
    }

    fn put_item(&self, item: &QueueItem) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut items = self.items.lock().unwrap();
        match items.get_mut(&item.id) {
            Some(slot) => {
                *slot = item.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(item.id.to_string())),
        }
    }

    fn get_item(&self, id: &ItemId) -> Result<QueueItem, StoreError> {
        self.items
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn delete_item(&self, id: &ItemId) -> Result<(), StoreError> {
        self.check_writable()?;
        self.items
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn delete_item_if(
        &self,
        id: &ItemId,
        should_delete: &dyn Fn(&QueueItem) -> bool,
    ) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut items = self.items.lock().unwrap();
        match items.get(id) {
            Some(item) if should_delete(item) => {
                items.remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn iter_items(&self) -> Result<Vec<QueueItem>, StoreError> {
        Ok(self.items.lock().unwrap().values().cloned().collect())
    }

    fn item_count(&self) -> Result<u64, StoreError> {
        Ok(self.items.lock().unwrap().len() as u64)
    }

    fn next_sequence(&self) -> Result<u64, StoreError> {
        self.check_writable()?;
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst))
    }
}
