//! Abstract storage traits for the Rollcall pipeline.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod error;
pub mod meta;
pub mod nonce;
pub mod queue;

pub use error::StoreError;
pub use meta::{MetaKey, MetaStore};
pub use nonce::{NonceRecord, NonceStore};
pub use queue::{ClaimRef, ItemStatus, QueueItem, QueueStore, Receipt, SubmissionError};
