//! Accepted-nonce storage trait.

use crate::StoreError;
use rollcall_types::{NonceDigest, Timestamp};
use serde::{Deserialize, Serialize};

/// Persisted metadata for one accepted nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceRecord {
    /// Insertion order; the smallest sequence is evicted first.
    pub sequence: u64,
    pub accepted_at: Timestamp,
}

/// Durable backing for the nonce ledger.
///
/// Keys are nonce digests, never raw nonces.
pub trait NonceStore: Send + Sync {
    /// Atomically insert `record` unless `digest` is already present.
    ///
    /// Returns `true` if the record was inserted, `false` if the nonce was
    /// already stored. The write is durable before this returns.
    fn insert_nonce_if_absent(
        &self,
        digest: &NonceDigest,
        record: &NonceRecord,
    ) -> Result<bool, StoreError>;

    fn contains_nonce(&self, digest: &NonceDigest) -> Result<bool, StoreError>;

    /// Remove a nonce (eviction). Removing an absent nonce is not an error.
    fn delete_nonce(&self, digest: &NonceDigest) -> Result<(), StoreError>;

    /// Every stored nonce, in no particular order.
    fn iter_nonces(&self) -> Result<Vec<(NonceDigest, NonceRecord)>, StoreError>;

    fn nonce_count(&self) -> Result<u64, StoreError>;
}
