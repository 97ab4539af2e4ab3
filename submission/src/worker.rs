//! Background submission worker.
//!
//! Per item:
//!
//! ```text
//! Signed ──► Pending ──► finalized ──► removed
//!              │  ▲
//!              │  └── retryable error (backoff)
//!              ├──► Failed        (attempt cap reached, or rejected)
//!              └──► NeedsResign   (signature expired)
//! ```
//!
//! An item with a receipt is polled for finalization, never resubmitted,
//! unless the ledger reports it dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use rollcall_store::{ItemStatus, QueueItem, QueueStore, Receipt, SubmissionError};
use rollcall_types::{Clock, SubmissionParams, Timestamp};

use crate::backoff::{backoff_delay, next_attempt_at};
use crate::envelope::TransactionEnvelope;
use crate::queue::{ItemUpdate, SubmissionQueue};
use crate::relay::{Finalization, LedgerRelay, RelayError};
use crate::QueueError;

/// What one drain pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Due items picked up.
    pub attempted: usize,
    pub finalized: usize,
    /// Submitted, or polled, and still waiting on the ledger.
    pub awaiting: usize,
    /// Failed retryably and rescheduled.
    pub retried: usize,
    pub failed: usize,
    pub needs_resign: usize,
    /// Failed items dropped by the retention policy.
    pub pruned: usize,
    /// Items skipped because the queue store failed.
    pub errors: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Finalized,
    Awaiting,
    Retried,
    Failed,
    NeedsResign,
}

impl DrainReport {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Finalized => self.finalized += 1,
            Outcome::Awaiting => self.awaiting += 1,
            Outcome::Retried => self.retried += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::NeedsResign => self.needs_resign += 1,
        }
    }
}

pub struct SubmissionWorker<S, R> {
    queue: Arc<SubmissionQueue<S>>,
    relay: Arc<R>,
    clock: Arc<dyn Clock>,
    params: SubmissionParams,
    /// Serializes drains so two attempts on one item never overlap.
    drain_lock: Mutex<()>,
}

impl<S: QueueStore, R: LedgerRelay> SubmissionWorker<S, R> {
    pub fn new(
        queue: Arc<SubmissionQueue<S>>,
        relay: Arc<R>,
        clock: Arc<dyn Clock>,
        params: SubmissionParams,
    ) -> Self {
        Self {
            queue,
            relay,
            clock,
            params,
            drain_lock: Mutex::new(()),
        }
    }

    pub fn queue(&self) -> &Arc<SubmissionQueue<S>> {
        &self.queue
    }

    /// Act on every item due now.
    pub async fn drain_due(&self) -> Result<DrainReport, QueueError> {
        let _guard = self.drain_lock.lock().await;
        let now = self.clock.now();
        let mut report = DrainReport {
            pruned: self
                .queue
                .prune_failed(self.params.failed_retention, now)?
                .len(),
            ..Default::default()
        };

        for item in self.queue.due(now)? {
            report.attempted += 1;
            let id = item.id;
            match self.process(item, now).await {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    warn!(item = %id, error = %e, "queue write failed; item left as last persisted");
                    report.errors += 1;
                }
            }
        }

        if report.attempted > 0 {
            debug!(?report, "drain complete");
        }
        Ok(report)
    }

    async fn process(&self, item: QueueItem, now: Timestamp) -> Result<Outcome, QueueError> {
        if let Some(receipt) = &item.receipt {
            return match self.poll(&receipt.tx_id).await {
                Ok(status) => self.settle(&item, status, now),
                Err(e) => self.record_failure(&item, e, now),
            };
        }

        let envelope = match TransactionEnvelope::from_bytes(&item.envelope) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(item = %item.id, error = %e, "stored envelope is unreadable");
                self.mark_failed(&item, item.retry_count, SubmissionError::SubmissionRejected(e.to_string()), now)?;
                return Ok(Outcome::Failed);
            }
        };

        if envelope.is_expired(now) {
            return self.park_for_resign(
                &item,
                SubmissionError::SubmissionRejected("envelope signature expired".into()),
                now,
            );
        }

        // Record the attempt before any network traffic.
        let item = self.queue.update(
            &item.id,
            ItemUpdate {
                status: Some(ItemStatus::Pending),
                ..Default::default()
            },
            now,
        )?;

        let tx_id = match self.submit(&envelope).await {
            Ok(tx_id) => tx_id,
            Err(e) => return self.record_failure(&item, e, now),
        };

        info!(item = %item.id, %tx_id, "transaction submitted");
        let item = self.queue.update(
            &item.id,
            ItemUpdate {
                receipt: Some(Some(Receipt {
                    tx_id: tx_id.clone(),
                    submitted_at: now,
                })),
                last_error: Some(None),
                ..Default::default()
            },
            now,
        )?;

        match self.poll(&tx_id).await {
            Ok(status) => self.settle(&item, status, now),
            Err(e) => {
                // Submission went through; only the status is unknown.
                debug!(item = %item.id, error = %e, "finalization poll failed after submit");
                self.schedule_poll(&item, now)?;
                Ok(Outcome::Awaiting)
            }
        }
    }

    fn settle(
        &self,
        item: &QueueItem,
        status: Finalization,
        now: Timestamp,
    ) -> Result<Outcome, QueueError> {
        match status {
            Finalization::Finalized => {
                self.queue.remove(&item.id)?;
                info!(item = %item.id, retry_count = item.retry_count, "transaction finalized");
                Ok(Outcome::Finalized)
            }
            Finalization::Pending => {
                self.schedule_poll(item, now)?;
                Ok(Outcome::Awaiting)
            }
            Finalization::Unknown if !self.unknown_for_too_long(item, now) => {
                debug!(item = %item.id, "relay has no record of the transaction yet");
                self.schedule_poll(item, now)?;
                Ok(Outcome::Awaiting)
            }
            Finalization::Dropped | Finalization::Unknown => {
                warn!(item = %item.id, "ledger dropped the transaction; resubmitting");
                self.queue.update(
                    &item.id,
                    ItemUpdate {
                        status: Some(ItemStatus::Pending),
                        receipt: Some(None),
                        next_attempt_at: Some(now),
                        ..Default::default()
                    },
                    now,
                )?;
                Ok(Outcome::Awaiting)
            }
        }
    }

    fn unknown_for_too_long(&self, item: &QueueItem, now: Timestamp) -> bool {
        item.receipt.as_ref().map_or(true, |r| {
            r.submitted_at.has_expired(self.params.unknown_tx_grace_secs, now)
        })
    }

    fn schedule_poll(&self, item: &QueueItem, now: Timestamp) -> Result<(), QueueError> {
        let at = next_attempt_at(now, Duration::from_millis(self.params.poll_interval_ms));
        self.queue.update(
            &item.id,
            ItemUpdate {
                status: Some(ItemStatus::Pending),
                next_attempt_at: Some(at),
                ..Default::default()
            },
            now,
        )?;
        Ok(())
    }

    fn record_failure(
        &self,
        item: &QueueItem,
        error: RelayError,
        now: Timestamp,
    ) -> Result<Outcome, QueueError> {
        let classified = error.classify();

        if error.is_signature_expiry() {
            return self.park_for_resign(item, classified, now);
        }
        if !classified.is_retryable() {
            warn!(item = %item.id, error = %classified, "transaction rejected");
            self.mark_failed(item, item.retry_count, classified, now)?;
            return Ok(Outcome::Failed);
        }

        let retry_count = item.retry_count.saturating_add(1);
        let attempts = retry_count.saturating_sub(item.retry_base);
        if attempts >= self.params.max_attempts {
            warn!(item = %item.id, retry_count, error = %classified, "retry limit reached");
            self.mark_failed(item, retry_count, classified, now)?;
            return Ok(Outcome::Failed);
        }

        let delay = backoff_delay(attempts, self.params.backoff_base_ms, self.params.backoff_max_ms);
        warn!(
            item = %item.id,
            retry_count,
            delay_ms = delay.as_millis() as u64,
            error = %classified,
            "submission failed; backing off"
        );
        self.queue.update(
            &item.id,
            ItemUpdate {
                status: Some(ItemStatus::Pending),
                retry_count: Some(retry_count),
                next_attempt_at: Some(next_attempt_at(now, delay)),
                last_error: Some(Some(classified)),
                ..Default::default()
            },
            now,
        )?;
        Ok(Outcome::Retried)
    }

    fn mark_failed(
        &self,
        item: &QueueItem,
        retry_count: u32,
        error: SubmissionError,
        now: Timestamp,
    ) -> Result<(), QueueError> {
        self.queue.update(
            &item.id,
            ItemUpdate {
                status: Some(ItemStatus::Failed),
                retry_count: Some(retry_count),
                last_error: Some(Some(error)),
                ..Default::default()
            },
            now,
        )?;
        Ok(())
    }

    fn park_for_resign(
        &self,
        item: &QueueItem,
        error: SubmissionError,
        now: Timestamp,
    ) -> Result<Outcome, QueueError> {
        warn!(item = %item.id, "envelope signature expired; waiting for re-signature");
        self.queue.update(
            &item.id,
            ItemUpdate {
                status: Some(ItemStatus::NeedsResign),
                receipt: Some(None),
                last_error: Some(Some(error)),
                ..Default::default()
            },
            now,
        )?;
        Ok(Outcome::NeedsResign)
    }

    async fn submit(&self, envelope: &TransactionEnvelope) -> Result<String, RelayError> {
        tokio::time::timeout(self.submit_timeout(), self.relay.submit(envelope))
            .await
            .unwrap_or(Err(RelayError::Timeout))
    }

    async fn poll(&self, tx_id: &str) -> Result<Finalization, RelayError> {
        tokio::time::timeout(self.submit_timeout(), self.relay.finalization(tx_id))
            .await
            .unwrap_or(Err(RelayError::Timeout))
    }

    fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.params.submit_timeout_ms)
    }
}
