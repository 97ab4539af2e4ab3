use rollcall_store::{ItemStatus, StoreError};
use rollcall_types::ItemId;
use thiserror::Error;

use crate::signer::SignError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("envelope encoding failed: {0}")]
    Encoding(String),

    #[error("envelope decoding failed: {0}")]
    Decoding(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("claim {0} is already queued")]
    Duplicate(ItemId),

    #[error("queue item {0} not found")]
    NotFound(ItemId),

    #[error("queue item {id}: cannot move from {from} to {to}")]
    InvalidTransition {
        id: ItemId,
        from: ItemStatus,
        to: ItemStatus,
    },

    #[error("queue item {id}: retry count cannot decrease from {current} to {requested}")]
    RetryCountDecrease {
        id: ItemId,
        current: u32,
        requested: u32,
    },

    #[error("queue item {0}: envelope belongs to a different claim")]
    EnvelopeMismatch(ItemId),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error("queue storage failed: {0}")]
    Store(StoreError),
}

impl From<StoreError> for QueueError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// Failure to turn a verified claim into a queued transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}
