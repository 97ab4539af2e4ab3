//! Ledger relay collaborator.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rollcall_store::SubmissionError;

use crate::envelope::TransactionEnvelope;

/// Ledger-side state of a submitted transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finalization {
    Finalized,
    Pending,
    /// The ledger no longer knows the transaction; it must be resubmitted.
    Dropped,
    /// The relay has no record of the transaction id. Shortly after
    /// submission this usually means it is not indexed yet.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("relay request timed out")]
    Timeout,

    #[error("relay unreachable: {0}")]
    Unavailable(String),

    #[error("relay server error: {0}")]
    ServerError(String),

    #[error("transaction rejected: {reason}")]
    Rejected {
        reason: String,
        /// The ledger refused the envelope because its signature expired.
        signature_expired: bool,
    },
}

impl RelayError {
    /// Map onto the error recorded on the queue item.
    pub fn classify(&self) -> SubmissionError {
        match self {
            Self::Timeout => SubmissionError::SubmissionTimeout,
            Self::Unavailable(msg) | Self::ServerError(msg) => {
                SubmissionError::SubmissionServerError(msg.clone())
            }
            Self::Rejected { reason, .. } => SubmissionError::SubmissionRejected(reason.clone()),
        }
    }

    pub fn is_signature_expiry(&self) -> bool {
        matches!(
            self,
            Self::Rejected {
                signature_expired: true,
                ..
            }
        )
    }
}

/// Transport to the external ledger.
pub trait LedgerRelay: Send + Sync {
    /// Submit a signed envelope. Returns the relay's transaction id.
    fn submit(
        &self,
        envelope: &TransactionEnvelope,
    ) -> impl Future<Output = Result<String, RelayError>> + Send;

    /// Ask where a previously submitted transaction stands.
    fn finalization(
        &self,
        tx_id: &str,
    ) -> impl Future<Output = Result<Finalization, RelayError>> + Send;
}
