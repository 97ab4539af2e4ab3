//! Submission queue storage trait and the persisted queue item model.

use crate::StoreError;
use rollcall_types::{ClaimDigest, ItemId, NonceDigest, Timestamp, ZoneDigest};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Where a queued transaction is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    /// Signed and queued, never attempted.
    Signed,
    /// At least one attempt has been made; waiting for the next one or for finalization.
    Pending,
    /// The envelope's signature expired. Waits for a fresh envelope.
    NeedsResign,
    /// Gave up: retries exhausted or terminally rejected. Waits for a manual retry or discard.
    Failed,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Signed => "signed",
            Self::Pending => "pending",
            Self::NeedsResign => "needs-resign",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Privacy-preserving reference to the claim a transaction came from.
///
/// Holds zone digests only. Raw geocell codes never reach the queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRef {
    pub digest: ClaimDigest,
    pub event_id: String,
    /// Issuer public key, hex.
    pub issuer: String,
    pub nonce: NonceDigest,
    pub zones: Vec<ZoneDigest>,
}

/// Acknowledgement of a submission returned by the ledger relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Relay-assigned transaction id, used to poll for finalization.
    pub tx_id: String,
    pub submitted_at: Timestamp,
}

/// Classified outcome of a failed submission attempt.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SubmissionError {
    #[error("submission timed out")]
    SubmissionTimeout,

    #[error("relay server error: {0}")]
    SubmissionServerError(String),

    #[error("submission rejected: {0}")]
    SubmissionRejected(String),
}

impl SubmissionError {
    /// Whether another attempt might succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::SubmissionRejected(_))
    }
}

/// A signed transaction waiting to reach the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Stable id, derived from the claim digest.
    pub id: ItemId,
    /// Creation order within the queue.
    pub sequence: u64,
    /// Serialized signed transaction envelope.
    pub envelope: Vec<u8>,
    pub claim: ClaimRef,
    pub created_at: Timestamp,
    pub status: ItemStatus,
    /// Total failed attempts. Never decreases.
    pub retry_count: u32,
    /// `retry_count` at the time of the last manual retry.
    pub retry_base: u32,
    pub next_attempt_at: Timestamp,
    pub receipt: Option<Receipt>,
    pub last_error: Option<SubmissionError>,
    pub updated_at: Timestamp,
}

impl QueueItem {
    /// Failed attempts since the item was enqueued or last manually retried.
    pub fn attempts_since_retry(&self) -> u32 {
        self.retry_count.saturating_sub(self.retry_base)
    }

    /// Whether the worker should act on this item at `now`.
    pub fn is_due(&self, now: Timestamp) -> bool {
        matches!(self.status, ItemStatus::Signed | ItemStatus::Pending) && self.next_attempt_at <= now
    }
}

/// Durable backing for the submission queue.
pub trait QueueStore: Send + Sync {
    /// Insert `item` unless an item with the same id exists.
    ///
    /// Returns `false` (and writes nothing) if the id is already queued.
    fn insert_item_if_absent(&self, item: &QueueItem) -> Result<bool, StoreError>;

    /// Overwrite an existing item.
    ///
    /// Fails with [`StoreError::NotFound`] if the item is not stored.
    fn put_item(&self, item: &QueueItem) -> Result<(), StoreError>;

    fn get_item(&self, id: &ItemId) -> Result<QueueItem, StoreError>;

    /// Remove an item. Fails with [`StoreError::NotFound`] if absent.
    fn delete_item(&self, id: &ItemId) -> Result<(), StoreError>;

    /// Remove an item only if `should_delete` holds for the stored value, checked
    /// and deleted in one write. Returns whether it was removed. A missing
    /// item is not an error.
    fn delete_item_if(
        &self,
        id: &ItemId,
        should_delete: &dyn Fn(&QueueItem) -> bool,
    ) -> Result<bool, StoreError>;

    /// Every stored item, in no particular order.
    fn iter_items(&self) -> Result<Vec<QueueItem>, StoreError>;

    fn item_count(&self) -> Result<u64, StoreError>;

    /// Atomically allocate the next creation sequence number.
    fn next_sequence(&self) -> Result<u64, StoreError>;
}
