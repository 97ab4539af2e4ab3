//! Durable submission queue.
//!
//! The queue is a thin rule-enforcing layer over a [`QueueStore`]. It keeps no
//! copy of its own: every read goes to the store and every mutation is
//! committed there before the call returns, so a restart resumes exactly
//! where the last acknowledged write left off.

use std::sync::Arc;

use tracing::{debug, info, warn};

use rollcall_store::{
    ClaimRef, ItemStatus, QueueItem, QueueStore, Receipt, StoreError, SubmissionError,
};
use rollcall_types::{FailedRetention, ItemId, Timestamp};

use crate::envelope::TransactionEnvelope;
use crate::QueueError;

/// Partial update of a queue item. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemUpdate {
    pub status: Option<ItemStatus>,
    pub retry_count: Option<u32>,
    pub next_attempt_at: Option<Timestamp>,
    pub receipt: Option<Option<Receipt>>,
    pub last_error: Option<Option<SubmissionError>>,
}

/// Transitions allowed through [`SubmissionQueue::update`].
///
/// Leaving `NeedsResign` requires a fresh envelope ([`SubmissionQueue::resign`])
/// and leaving `Failed` requires a manual [`SubmissionQueue::retry`].
fn update_allowed(from: ItemStatus, to: ItemStatus) -> bool {
    use ItemStatus::*;
    match (from, to) {
        (Signed, _) => true,
        (Pending, Pending | NeedsResign | Failed) => true,
        (NeedsResign, NeedsResign) | (Failed, Failed) => true,
        _ => false,
    }
}

pub struct SubmissionQueue<S> {
    store: Arc<S>,
}

impl<S: QueueStore> SubmissionQueue<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Queue a signed envelope for a verified claim.
    ///
    /// The item id is derived from the claim digest, so the same claim can
    /// never be queued twice.
    pub fn enqueue(
        &self,
        claim: ClaimRef,
        envelope: &TransactionEnvelope,
        now: Timestamp,
    ) -> Result<ItemId, QueueError> {
        let id = ItemId::from(claim.digest);
        if envelope.body.claim != claim.digest {
            return Err(QueueError::EnvelopeMismatch(id));
        }
        let item = QueueItem {
            id,
            sequence: self.store.next_sequence()?,
            envelope: envelope.to_bytes()?,
            claim,
            created_at: now,
            status: ItemStatus::Signed,
            retry_count: 0,
            retry_base: 0,
            next_attempt_at: now,
            receipt: None,
            last_error: None,
            updated_at: now,
        };
        if !self.store.insert_item_if_absent(&item)? {
            return Err(QueueError::Duplicate(id));
        }
        info!(item = %id, event_id = %item.claim.event_id, "queued transaction");
        Ok(id)
    }

    pub fn get(&self, id: &ItemId) -> Result<QueueItem, QueueError> {
        self.store.get_item(id).map_err(|e| not_found(e, id))
    }

    /// Every item, in creation order.
    pub fn list(&self) -> Result<Vec<QueueItem>, QueueError> {
        let mut items = self.store.iter_items()?;
        items.sort_by_key(|i| i.sequence);
        Ok(items)
    }

    /// Items the worker should act on at `now`, in creation order.
    pub fn due(&self, now: Timestamp) -> Result<Vec<QueueItem>, QueueError> {
        let mut items = self.list()?;
        items.retain(|i| i.is_due(now));
        Ok(items)
    }

    pub fn depth(&self) -> Result<u64, QueueError> {
        Ok(self.store.item_count()?)
    }

    /// Apply a validated partial update and persist it.
    pub fn update(
        &self,
        id: &ItemId,
        update: ItemUpdate,
        now: Timestamp,
    ) -> Result<QueueItem, QueueError> {
        let mut item = self.get(id)?;

        if let Some(to) = update.status {
            if !update_allowed(item.status, to) {
                return Err(QueueError::InvalidTransition {
                    id: *id,
                    from: item.status,
                    to,
                });
            }
            item.status = to;
        }
        if let Some(requested) = update.retry_count {
            if requested < item.retry_count {
                return Err(QueueError::RetryCountDecrease {
                    id: *id,
                    current: item.retry_count,
                    requested,
                });
            }
            item.retry_count = requested;
        }
        if let Some(at) = update.next_attempt_at {
            item.next_attempt_at = at;
        }
        if let Some(receipt) = update.receipt {
            item.receipt = receipt;
        }
        if let Some(last_error) = update.last_error {
            item.last_error = last_error;
        }
        item.updated_at = now;

        self.store.put_item(&item).map_err(|e| not_found(e, id))?;
        debug!(item = %id, status = %item.status, retry_count = item.retry_count, "queue item updated");
        Ok(item)
    }

    /// Remove an item whose transaction is finalized.
    pub fn remove(&self, id: &ItemId) -> Result<(), QueueError> {
        self.store.delete_item(id).map_err(|e| not_found(e, id))?;
        debug!(item = %id, "queue item removed");
        Ok(())
    }

    /// Drop an item on explicit user request, whatever its status.
    pub fn discard(&self, id: &ItemId) -> Result<QueueItem, QueueError> {
        let item = self.get(id)?;
        self.remove(id)?;
        warn!(item = %id, status = %item.status, "queue item discarded");
        Ok(item)
    }

    /// Install a freshly signed envelope for an item that needs one.
    pub fn resign(
        &self,
        id: &ItemId,
        envelope: &TransactionEnvelope,
        now: Timestamp,
    ) -> Result<QueueItem, QueueError> {
        let mut item = self.get(id)?;
        if item.status != ItemStatus::NeedsResign {
            return Err(QueueError::InvalidTransition {
                id: *id,
                from: item.status,
                to: ItemStatus::Pending,
            });
        }
        if envelope.body.claim != item.claim.digest {
            return Err(QueueError::EnvelopeMismatch(*id));
        }
        item.envelope = envelope.to_bytes()?;
        item.status = ItemStatus::Pending;
        item.receipt = None;
        item.last_error = None;
        item.next_attempt_at = now;
        item.updated_at = now;
        self.store.put_item(&item).map_err(|e| not_found(e, id))?;
        info!(item = %id, "queue item re-signed");
        Ok(item)
    }

    /// Manually retry a failed item. Its attempt budget starts over but the
    /// total retry count is kept.
    pub fn retry(&self, id: &ItemId, now: Timestamp) -> Result<QueueItem, QueueError> {
        let mut item = self.get(id)?;
        if item.status != ItemStatus::Failed {
            return Err(QueueError::InvalidTransition {
                id: *id,
                from: item.status,
                to: ItemStatus::Pending,
            });
        }
        item.status = ItemStatus::Pending;
        item.retry_base = item.retry_count;
        item.next_attempt_at = now;
        item.updated_at = now;
        self.store.put_item(&item).map_err(|e| not_found(e, id))?;
        info!(item = %id, retry_count = item.retry_count, "failed item retried");
        Ok(item)
    }

    /// Apply the failed-item retention policy. Returns the ids removed.
    pub fn prune_failed(
        &self,
        retention: FailedRetention,
        now: Timestamp,
    ) -> Result<Vec<ItemId>, QueueError> {
        let FailedRetention::ExpireAfterSecs(secs) = retention else {
            return Ok(Vec::new());
        };
        let expired = |item: &QueueItem| {
            item.status == ItemStatus::Failed && item.updated_at.has_expired(secs, now)
        };
        let mut pruned = Vec::new();
        for item in self.list()? {
            // Re-checked against the stored copy: a manual retry may have
            // revived the item since the listing.
            if expired(&item) && self.store.delete_item_if(&item.id, &expired)? {
                pruned.push(item.id);
            }
        }
        if !pruned.is_empty() {
            info!(count = pruned.len(), "pruned expired failed items");
        }
        Ok(pruned)
    }
}

fn not_found(e: StoreError, id: &ItemId) -> QueueError {
    match e {
        StoreError::NotFound(_) => QueueError::NotFound(*id),
        other => QueueError::Store(other),
    }
}
