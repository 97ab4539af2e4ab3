//! LMDB implementation of QueueStore.
//!
//! Key: 32-byte item id. Value: bincode-encoded [`QueueItem`]. The creation
//! sequence counter lives in the meta database under [`MetaKey::QueueSequence`].

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use rollcall_store::{MetaKey, QueueItem, QueueStore, StoreError};
use rollcall_types::ItemId;

use crate::LmdbError;

pub struct LmdbQueueStore {
    pub(crate) env: Arc<Env>,
    pub(crate) queue_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl QueueStore for LmdbQueueStore {
    fn insert_item_if_absent(&self, item: &QueueItem) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .queue_db
            .get(&wtxn, item.id.as_bytes())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Ok(false);
        }
        let bytes = bincode::serialize(item).map_err(LmdbError::from)?;
        self.queue_db
            .put(&mut wtxn, item.id.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }

    fn put_item(&self, item: &QueueItem) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .queue_db
            .get(&wtxn, item.id.as_bytes())
            .map_err(LmdbError::from)?
            .is_none()
        {
            return Err(LmdbError::NotFound(format!("queue item {}", item.id)).into());
        }
        let bytes = bincode::serialize(item).map_err(LmdbError::from)?;
        self.queue_db
            .put(&mut wtxn, item.id.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_item(&self, id: &ItemId) -> Result<QueueItem, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .queue_db
            .get(&rtxn, id.as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("queue item {id}")))?;
        let item: QueueItem = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(item)
    }

    fn delete_item(&self, id: &ItemId) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existed = self
            .queue_db
            .delete(&mut wtxn, id.as_bytes())
            .map_err(LmdbError::from)?;
        if !existed {
            return Err(LmdbError::NotFound(format!("queue item {id}")).into());
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete_item_if(
        &self,
        id: &ItemId,
        should_delete: &dyn Fn(&QueueItem) -> bool,
    ) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let Some(val) = self
            .queue_db
            .get(&wtxn, id.as_bytes())
            .map_err(LmdbError::from)?
        else {
            return Ok(false);
        };
        let item: QueueItem = bincode::deserialize(val).map_err(LmdbError::from)?;
        if !should_delete(&item) {
            return Ok(false);
        }
        self.queue_db
            .delete(&mut wtxn, id.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }

    fn iter_items(&self) -> Result<Vec<QueueItem>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut items = Vec::new();
        for entry in self.queue_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            let item: QueueItem = bincode::deserialize(val).map_err(LmdbError::from)?;
            items.push(item);
        }
        Ok(items)
    }

    fn item_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.queue_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }

    fn next_sequence(&self) -> Result<u64, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let current = match self
            .meta_db
            .get(&wtxn, MetaKey::QueueSequence.as_bytes())
            .map_err(LmdbError::from)?
        {
            None => 0,
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                    StoreError::Corruption("queue_sequence has unexpected byte length".into())
                })?;
                u64::from_le_bytes(arr)
            }
        };
        let next = current + 1;
        self.meta_db
            .put(&mut wtxn, MetaKey::QueueSequence.as_bytes(), &next.to_le_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(current)
    }
}
