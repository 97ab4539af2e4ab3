//! Resilient submission of verified claims to the ledger.
//!
//! A verified claim becomes an [`UnsignedEnvelope`], is signed by the
//! identity collaborator ([`TransactionSigner`]) and lands in the durable
//! [`SubmissionQueue`]. The [`SubmissionWorker`] drains due items through a
//! [`LedgerRelay`], retrying with exponential backoff, polling for
//! finalization, and parking items that need a fresh signature.

pub mod backoff;
pub mod envelope;
pub mod error;
pub mod http_relay;
pub mod intake;
pub mod queue;
pub mod relay;
pub mod signer;
pub mod worker;

pub use backoff::{backoff_delay, next_attempt_at};
pub use envelope::{TransactionEnvelope, UnsignedEnvelope, ENVELOPE_DOMAIN};
pub use error::{EnvelopeError, IntakeError, QueueError};
pub use http_relay::HttpRelay;
pub use intake::{claim_ref, enqueue_verified};
pub use queue::{ItemUpdate, SubmissionQueue};
pub use relay::{Finalization, LedgerRelay, RelayError};
pub use signer::{sign_envelope, LocalKeySigner, SignError, TransactionSigner};
pub use worker::{DrainReport, SubmissionWorker};

pub use rollcall_store::{ClaimRef, ItemStatus, QueueItem, Receipt, SubmissionError};
