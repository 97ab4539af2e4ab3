//! Nullable ledger relay: scripted answers, recorded submissions.

use rollcall_submission::{Finalization, LedgerRelay, RelayError, TransactionEnvelope};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// A relay that answers from scripts.
///
/// When a script runs dry, `submit` succeeds with a fresh `tx-N` id and
/// `finalization` reports [`Finalization::Finalized`].
#[derive(Default)]
pub struct NullRelay {
    submit_script: Mutex<VecDeque<Result<String, RelayError>>>,
    finalization_script: Mutex<VecDeque<Result<Finalization, RelayError>>>,
    submitted: Mutex<Vec<TransactionEnvelope>>,
    polled: Mutex<Vec<String>>,
    hang: AtomicBool,
    next_tx: AtomicU64,
}

impl NullRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer for the next `submit` call.
    pub fn push_submit(&self, result: Result<String, RelayError>) {
        self.submit_script.lock().unwrap().push_back(result);
    }

    /// Queue the answer for the next `finalization` call.
    pub fn push_finalization(&self, result: Result<Finalization, RelayError>) {
        self.finalization_script.lock().unwrap().push_back(result);
    }

    /// Stop answering altogether (calls never complete).
    pub fn hang(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    /// Every envelope `submit` was called with, in order.
    pub fn submitted(&self) -> Vec<TransactionEnvelope> {
        self.submitted.lock().unwrap().clone()
    }

    /// Every transaction id polled for finalization, in order.
    pub fn polled(&self) -> Vec<String> {
        self.polled.lock().unwrap().clone()
    }

    async fn maybe_hang(&self) {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }
}

impl LedgerRelay for NullRelay {
    async fn submit(&self, envelope: &TransactionEnvelope) -> Result<String, RelayError> {
        self.maybe_hang().await;
        self.submitted.lock().unwrap().push(envelope.clone());
        let scripted = self.submit_script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            let n = self.next_tx.fetch_add(1, Ordering::SeqCst);
            Ok(format!("tx-{n}"))
        })
    }

    async fn finalization(&self, tx_id: &str) -> Result<Finalization, RelayError> {
        self.maybe_hang().await;
        self.polled.lock().unwrap().push(tx_id.to_string());
        let scripted = self.finalization_script.lock().unwrap().pop_front();
        scripted.unwrap_or(Ok(Finalization::Finalized))
    }
}
