//! Nonce ledger: the set of nonces ever accepted, shared by every issuer.
//!
//! A bounded FIFO set held in memory and written through to a
//! [`NonceStore`], so accepted nonces survive restarts. When full, the oldest
//! accepted nonce is evicted from both. Check-and-commit is serialized by a
//! single mutex; two concurrent commits of the same nonce can never both
//! succeed.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use rollcall_store::{NonceRecord, NonceStore, StoreError};
use rollcall_types::{NonceDigest, Timestamp};
use tracing::{debug, warn};

/// Result of [`NonceLedger::commit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The nonce was recorded now.
    Committed,
    /// Another verification recorded it first.
    AlreadyPresent,
}

struct LedgerState {
    set: HashSet<NonceDigest>,
    order: VecDeque<NonceDigest>,
    next_sequence: u64,
}

pub struct NonceLedger<S> {
    store: Arc<S>,
    state: Mutex<Option<LedgerState>>,
    capacity: usize,
}

impl<S: NonceStore> NonceLedger<S> {
    /// Load the ledger from its store.
    ///
    /// A capacity of zero is treated as one. If the store holds more nonces
    /// than the capacity, the oldest are evicted right away.
    pub fn open(store: Arc<S>, capacity: usize) -> Result<Self, StoreError> {
        let capacity = capacity.max(1);
        let mut stored = store.iter_nonces()?;
        stored.sort_by_key(|(_, record)| record.sequence);

        let next_sequence = stored.last().map_or(0, |(_, r)| r.sequence + 1);
        let mut state = LedgerState {
            set: HashSet::with_capacity(stored.len().min(capacity)),
            order: VecDeque::with_capacity(stored.len().min(capacity)),
            next_sequence,
        };
        for (digest, _) in stored {
            state.set.insert(digest);
            state.order.push_back(digest);
        }

        let ledger = Self {
            store,
            state: Mutex::new(None),
            capacity,
        };
        ledger.evict_overflow(&mut state);
        debug!(nonces = state.order.len(), capacity, "nonce ledger loaded");
        *ledger.state.lock() = Some(state);
        Ok(ledger)
    }

    /// Whether the nonce was accepted before. Read-only.
    pub fn contains(&self, digest: &NonceDigest) -> Result<bool, StoreError> {
        let guard = self.state.lock();
        let state = guard.as_ref().ok_or(StoreError::Closed)?;
        Ok(state.set.contains(digest))
    }

    /// Record a nonce as accepted.
    ///
    /// Re-checks membership under the lock, then writes through to the store
    /// before the nonce becomes visible in memory. On a store error nothing is
    /// recorded.
    pub fn commit(&self, digest: &NonceDigest, now: Timestamp) -> Result<CommitOutcome, StoreError> {
        let mut guard = self.state.lock();
        let state = guard.as_mut().ok_or(StoreError::Closed)?;

        if state.set.contains(digest) {
            return Ok(CommitOutcome::AlreadyPresent);
        }

        let record = NonceRecord {
            sequence: state.next_sequence,
            accepted_at: now,
        };
        let inserted = self.store.insert_nonce_if_absent(digest, &record)?;
        state.next_sequence += 1;
        state.set.insert(*digest);
        state.order.push_back(*digest);
        self.evict_overflow(state);

        if inserted {
            Ok(CommitOutcome::Committed)
        } else {
            // Present in the store but not in memory: written by someone else.
            Ok(CommitOutcome::AlreadyPresent)
        }
    }

    /// Stop serving. Later calls fail with [`StoreError::Closed`].
    pub fn close(&self) {
        *self.state.lock() = None;
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().is_some()
    }

    pub fn len(&self) -> usize {
        self.state.lock().as_ref().map_or(0, |s| s.order.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict_overflow(&self, state: &mut LedgerState) {
        while state.order.len() > self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.set.remove(&oldest);
            if let Err(e) = self.store.delete_nonce(&oldest) {
                // Trimmed again on the next open.
                warn!(error = %e, "failed to evict nonce from store");
            }
        }
    }
}
